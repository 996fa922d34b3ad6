use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tickflow_core::event::entity::{Direction, Event, EventKind, FillEvent};
use tickflow_core::event::error::{EventError, HandlerError};
use tickflow_core::event::port::EventHandler;
use tokio::sync::RwLock;
use tracing::debug;

/// # Summary
/// 单个标的由成交回报累计出的净持仓。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerPosition {
    /// 净持仓数量 (正数表示多头，负数表示空头)
    pub quantity: Decimal,
    /// 持仓均价，平仓至零后归零
    pub average_price: Decimal,
}

#[derive(Debug, Default)]
struct LedgerState {
    positions: HashMap<String, LedgerPosition>,
    cash: Decimal,
    commission: Decimal,
}

impl LedgerState {
    /// # Logic
    /// 同向加仓按成本加权更新均价；反向成交只扣减数量，
    /// 穿过零点时剩余部分以成交价作为新方向的均价。
    /// 所有新值先算出再一并写入，任何一步溢出都不改动账本。
    fn apply(&mut self, fill: &FillEvent) -> Result<(), EventError> {
        let delta = match fill.direction() {
            Direction::Buy => fill.quantity(),
            Direction::Sell => -fill.quantity(),
        };
        let current = self
            .positions
            .get(fill.symbol())
            .copied()
            .unwrap_or_default();

        let quantity = current
            .quantity
            .checked_add(delta)
            .ok_or(EventError::Overflow("position"))?;

        let opening = current.quantity.is_zero()
            || current.quantity.is_sign_positive() == delta.is_sign_positive();

        let average_price = if opening {
            current
                .quantity
                .abs()
                .checked_mul(current.average_price)
                .and_then(|old_cost| old_cost.checked_add(fill.notional().ok()?))
                .and_then(|cost| cost.checked_div(quantity.abs()))
                .ok_or(EventError::Overflow("average_price"))?
        } else if quantity.is_zero() {
            Decimal::ZERO
        } else if quantity.is_sign_positive() != current.quantity.is_sign_positive() {
            fill.price()
        } else {
            current.average_price
        };

        let cash = self
            .cash
            .checked_add(fill.cash_delta()?)
            .ok_or(EventError::Overflow("cash"))?;
        let commission = self
            .commission
            .checked_add(fill.commission())
            .ok_or(EventError::Overflow("commission"))?;

        self.positions.insert(
            fill.symbol().to_string(),
            LedgerPosition {
                quantity,
                average_price,
            },
        );
        self.cash = cash;
        self.commission = commission;
        Ok(())
    }
}

/// # Summary
/// 成交账本：消费 Fill 事件，按标的累计净持仓，并累计现金流与手续费。
///
/// # Invariants
/// - 只接收 `Fill` 事件。
/// - 现金初始为 0，`cash()` 即所有成交 `cash_delta` 之和。
/// - 记账溢出的成交被拒绝，账本保持原状。
#[derive(Default)]
pub struct FillLedger {
    state: RwLock<LedgerState>,
}

impl FillLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定标的的净持仓，没有成交记录时返回 `None`
    pub async fn position(&self, symbol: &str) -> Option<LedgerPosition> {
        self.state.read().await.positions.get(symbol).copied()
    }

    /// 全部标的净持仓，按代码排序
    pub async fn positions(&self) -> Vec<(String, LedgerPosition)> {
        let guard = self.state.read().await;
        let mut positions: Vec<_> = guard
            .positions
            .iter()
            .map(|(symbol, position)| (symbol.clone(), *position))
            .collect();
        positions.sort_by(|a, b| a.0.cmp(&b.0));
        positions
    }

    /// 累计现金流
    pub async fn cash(&self) -> Decimal {
        self.state.read().await.cash
    }

    /// 累计手续费
    pub async fn commission(&self) -> Decimal {
        self.state.read().await.commission
    }
}

#[async_trait]
impl EventHandler for FillLedger {
    fn matches(&self, event: &Event) -> bool {
        event.kind() == EventKind::Fill
    }

    async fn handle(&self, event: Event) -> Result<(), HandlerError> {
        let kind = event.kind();
        let Event::Fill(fill) = event else {
            return Err(HandlerError::Handler(format!(
                "FillLedger cannot consume {kind} events"
            )));
        };
        debug!("Ledger booking {}", fill);
        self.state
            .write()
            .await
            .apply(&fill)
            .map_err(|e| HandlerError::Handler(format!("FillLedger cannot book {fill}: {e}")))
    }
}
