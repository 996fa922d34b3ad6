use crate::common::time::TimeProvider;
use crate::event::error::EventError;
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// # Summary
/// 事件的判别标签，消费方据此分派而无需关心具体结构。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum EventKind {
    Market,
    Signal,
    Order,
    Fill,
}

impl EventKind {
    /// 全部判别标签，按流水线顺序排列
    pub const ALL: [EventKind; 4] = [
        EventKind::Market,
        EventKind::Signal,
        EventKind::Order,
        EventKind::Fill,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Market => "MARKET",
            EventKind::Signal => "SIGNAL",
            EventKind::Order => "ORDER",
            EventKind::Fill => "FILL",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "MARKET" => Ok(EventKind::Market),
            "SIGNAL" => Ok(EventKind::Signal),
            "ORDER" => Ok(EventKind::Order),
            "FILL" => Ok(EventKind::Fill),
            _ => Err(EventError::invalid("kind", format!("unknown event kind `{s}`"))),
        }
    }
}

impl TryFrom<String> for EventKind {
    type Error = EventError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// # Summary
/// 策略信号的方向。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum SignalType {
    // 做多
    Long,
    // 做空
    Short,
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalType::Long => write!(f, "LONG"),
            SignalType::Short => write!(f, "SHORT"),
        }
    }
}

impl FromStr for SignalType {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "long" => Ok(SignalType::Long),
            "short" => Ok(SignalType::Short),
            _ => Err(EventError::invalid(
                "signal_type",
                format!("unknown signal type `{s}`"),
            )),
        }
    }
}

impl TryFrom<String> for SignalType {
    type Error = EventError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// # Summary
/// 委托类型。线上标记沿用 `MKT` / `LMT`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum OrderType {
    // 市价单
    #[serde(rename = "MKT")]
    Market,
    // 限价单，必须携带限价
    #[serde(rename = "LMT")]
    Limit,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Market => write!(f, "MKT"),
            OrderType::Limit => write!(f, "LMT"),
        }
    }
}

impl FromStr for OrderType {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mkt" | "market" => Ok(OrderType::Market),
            "lmt" | "limit" => Ok(OrderType::Limit),
            _ => Err(EventError::invalid(
                "order_type",
                format!("unknown order type `{s}`"),
            )),
        }
    }
}

impl TryFrom<String> for OrderType {
    type Error = EventError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// # Summary
/// 交易方向。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum Direction {
    /// 买入 (做多)
    Buy,
    /// 卖出 (做空)
    Sell,
}

impl Direction {
    /// 反方向
    pub fn opposite(&self) -> Self {
        match self {
            Direction::Buy => Direction::Sell,
            Direction::Sell => Direction::Buy,
        }
    }

    /// 持仓符号：买入为 +1，卖出为 -1
    pub fn sign(&self) -> Decimal {
        match self {
            Direction::Buy => Decimal::ONE,
            Direction::Sell => Decimal::NEGATIVE_ONE,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for Direction {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "buy" => Ok(Direction::Buy),
            "sell" => Ok(Direction::Sell),
            _ => Err(EventError::invalid(
                "direction",
                format!("unknown direction `{s}`"),
            )),
        }
    }
}

impl TryFrom<String> for Direction {
    type Error = EventError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

fn require_symbol(symbol: String) -> Result<String, EventError> {
    if symbol.trim().is_empty() {
        return Err(EventError::invalid("symbol", "must not be empty"));
    }
    Ok(symbol)
}

fn require_positive(field: &'static str, value: Decimal) -> Result<Decimal, EventError> {
    if value <= Decimal::ZERO {
        return Err(EventError::invalid(
            field,
            format!("must be greater than zero, got {value}"),
        ));
    }
    Ok(value)
}

fn require_non_negative(field: &'static str, value: Decimal) -> Result<Decimal, EventError> {
    if value < Decimal::ZERO {
        return Err(EventError::invalid(
            field,
            format!("must not be negative, got {value}"),
        ));
    }
    Ok(value)
}

fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// # Summary
/// 策略对某个标的给出的做多/做空建议，由组合模块接收并决定是否下单。
///
/// # Invariants
/// - `symbol` 非空。
/// - 构造后不可变，所有字段只读。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SignalRecord")]
pub struct SignalEvent {
    symbol: String,
    timestamp: DateTime<Utc>,
    signal_type: SignalType,
}

#[derive(Deserialize)]
struct SignalRecord {
    symbol: String,
    timestamp: DateTime<Utc>,
    signal_type: SignalType,
}

impl TryFrom<SignalRecord> for SignalEvent {
    type Error = EventError;

    fn try_from(record: SignalRecord) -> Result<Self, Self::Error> {
        SignalEvent::new(record.symbol, record.timestamp, record.signal_type)
    }
}

impl SignalEvent {
    /// # Logic
    /// 校验标的代码后构造信号，时间戳与方向原样保存。
    ///
    /// # Returns
    /// * 代码为空时返回 `EventError::InvalidArgument`。
    pub fn new(
        symbol: impl Into<String>,
        timestamp: DateTime<Utc>,
        signal_type: SignalType,
    ) -> Result<Self, EventError> {
        Ok(Self {
            symbol: require_symbol(symbol.into())?,
            timestamp,
            signal_type,
        })
    }

    /// # Logic
    /// 以模拟时钟的当前时间作为信号时间戳。
    /// 回测中时钟由驱动器拨到当前 K 线，因此信号不会早于触发它的行情。
    pub fn at(
        symbol: impl Into<String>,
        signal_type: SignalType,
        clock: &dyn TimeProvider,
    ) -> Result<Self, EventError> {
        Self::new(symbol, clock.now(), signal_type)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn signal_type(&self) -> SignalType {
        self.signal_type
    }
}

impl fmt::Display for SignalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Signal: Symbol={}, Timestamp={}, Type={}",
            self.symbol,
            format_instant(&self.timestamp),
            self.signal_type
        )
    }
}

/// # Summary
/// 发往执行模块的委托指令。
///
/// # Invariants
/// - `symbol` 非空，`quantity` 严格大于 0。
/// - `limit_price` 当且仅当 `order_type == Limit` 时存在，且大于 0。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OrderRecord")]
pub struct OrderEvent {
    symbol: String,
    order_type: OrderType,
    quantity: Decimal,
    direction: Direction,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit_price: Option<Decimal>,
}

#[derive(Deserialize)]
struct OrderRecord {
    symbol: String,
    order_type: OrderType,
    quantity: Decimal,
    direction: Direction,
    #[serde(default)]
    limit_price: Option<Decimal>,
}

impl TryFrom<OrderRecord> for OrderEvent {
    type Error = EventError;

    fn try_from(record: OrderRecord) -> Result<Self, Self::Error> {
        match (record.order_type, record.limit_price) {
            (OrderType::Limit, Some(price)) => {
                OrderEvent::limit(record.symbol, record.quantity, record.direction, price)
            }
            (OrderType::Market, Some(_)) => Err(EventError::invalid(
                "limit_price",
                "market orders do not carry a limit price",
            )),
            (order_type, None) => OrderEvent::new(
                record.symbol,
                order_type,
                record.quantity,
                record.direction,
            ),
        }
    }
}

impl OrderEvent {
    /// # Logic
    /// 构造只包含四个基础字段的委托。
    /// 基础形态没有价格字段，因此传入 `OrderType::Limit` 会被拒绝，
    /// 限价单请使用 [`OrderEvent::limit`]，这里不会替调用方编造价格。
    ///
    /// # Returns
    /// * 代码为空、数量不为正或缺少限价时返回 `EventError::InvalidArgument`。
    pub fn new(
        symbol: impl Into<String>,
        order_type: OrderType,
        quantity: Decimal,
        direction: Direction,
    ) -> Result<Self, EventError> {
        let symbol = require_symbol(symbol.into())?;
        let quantity = require_positive("quantity", quantity)?;
        if order_type == OrderType::Limit {
            return Err(EventError::invalid(
                "limit_price",
                "limit orders require a limit price, build them with OrderEvent::limit",
            ));
        }
        Ok(Self {
            symbol,
            order_type,
            quantity,
            direction,
            limit_price: None,
        })
    }

    /// 市价单
    pub fn market(
        symbol: impl Into<String>,
        quantity: Decimal,
        direction: Direction,
    ) -> Result<Self, EventError> {
        Self::new(symbol, OrderType::Market, quantity, direction)
    }

    /// 限价单，`limit_price` 必须大于 0
    pub fn limit(
        symbol: impl Into<String>,
        quantity: Decimal,
        direction: Direction,
        limit_price: Decimal,
    ) -> Result<Self, EventError> {
        Ok(Self {
            symbol: require_symbol(symbol.into())?,
            order_type: OrderType::Limit,
            quantity: require_positive("quantity", quantity)?,
            direction,
            limit_price: Some(require_positive("limit_price", limit_price)?),
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn limit_price(&self) -> Option<Decimal> {
        self.limit_price
    }

    /// # Summary
    /// 单行可读描述，仅做格式化，是否输出由调用方决定。
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for OrderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Order: Symbol={}, Type={}, Quantity={}, Direction={}",
            self.symbol, self.order_type, self.quantity, self.direction
        )?;
        if let Some(price) = self.limit_price {
            write!(f, ", LimitPrice={price}")?;
        }
        Ok(())
    }
}

/// # Summary
/// 委托的成交回报，组合模块据此更新持仓与现金。
/// 数量为绝对值，方向单独记录。
///
/// # Invariants
/// - `price > 0`，`quantity > 0`，`commission >= 0`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FillRecord")]
pub struct FillEvent {
    symbol: String,
    direction: Direction,
    price: Decimal,
    quantity: Decimal,
    commission: Decimal,
    timestamp: DateTime<Utc>,
}

#[derive(Deserialize)]
struct FillRecord {
    symbol: String,
    direction: Direction,
    price: Decimal,
    quantity: Decimal,
    commission: Decimal,
    timestamp: DateTime<Utc>,
}

impl TryFrom<FillRecord> for FillEvent {
    type Error = EventError;

    fn try_from(record: FillRecord) -> Result<Self, Self::Error> {
        FillEvent::new(
            record.symbol,
            record.direction,
            record.price,
            record.quantity,
            record.commission,
            record.timestamp,
        )
    }
}

impl FillEvent {
    /// # Returns
    /// * 代码为空、价格或数量不为正、手续费为负时返回 `EventError::InvalidArgument`。
    pub fn new(
        symbol: impl Into<String>,
        direction: Direction,
        price: Decimal,
        quantity: Decimal,
        commission: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, EventError> {
        Ok(Self {
            symbol: require_symbol(symbol.into())?,
            direction,
            price: require_positive("price", price)?,
            quantity: require_positive("quantity", quantity)?,
            commission: require_non_negative("commission", commission)?,
            timestamp,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn commission(&self) -> Decimal {
        self.commission
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// # Summary
    /// 成交金额 (价格 × 数量)。
    ///
    /// # Returns
    /// * 超出 `Decimal` 范围时返回 `EventError::Overflow`。
    pub fn notional(&self) -> Result<Decimal, EventError> {
        self.price
            .checked_mul(self.quantity)
            .ok_or(EventError::Overflow("notional"))
    }

    /// # Logic
    /// 该笔成交对现金的带符号影响：
    /// 买入支出成交金额与手续费，卖出收回成交金额并扣除手续费。
    ///
    /// # Returns
    /// * 超出 `Decimal` 范围时返回 `EventError::Overflow`。
    pub fn cash_delta(&self) -> Result<Decimal, EventError> {
        let flow = match self.direction {
            Direction::Buy => -self.notional()?,
            Direction::Sell => self.notional()?,
        };
        flow.checked_sub(self.commission)
            .ok_or(EventError::Overflow("cash_delta"))
    }
}

impl fmt::Display for FillEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Fill: Symbol={}, Direction={}, Quantity={}, Price={}, Commission={}, Timestamp={}",
            self.symbol,
            self.direction,
            self.quantity,
            self.price,
            self.commission,
            format_instant(&self.timestamp)
        )
    }
}

/// # Summary
/// 回测流水线中流转的事件，封闭的四种变体。
///
/// # Invariants
/// - 不可变值对象，不持有任何资源，可安全跨线程传递。
/// - 不引用触发它的上游事件，因果关系只体现在处理顺序上。
/// - 线上格式为内部标签对象 (`{"type":"ORDER", ...}`)，反序列化同样经过构造校验。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Event {
    /// 新的 K 线/Tick 已就绪，消费方从数据源拉取最新行情
    Market,
    Signal(SignalEvent),
    Order(OrderEvent),
    Fill(FillEvent),
}

impl Event {
    /// 行情事件，无参数且总是成功
    pub fn market() -> Self {
        Event::Market
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Event::Market => EventKind::Market,
            Event::Signal(_) => EventKind::Signal,
            Event::Order(_) => EventKind::Order,
            Event::Fill(_) => EventKind::Fill,
        }
    }

    /// 事件关联的标的，行情事件没有
    pub fn symbol(&self) -> Option<&str> {
        match self {
            Event::Market => None,
            Event::Signal(signal) => Some(signal.symbol()),
            Event::Order(order) => Some(order.symbol()),
            Event::Fill(fill) => Some(fill.symbol()),
        }
    }

    /// 事件自带的时间戳，行情与委托没有
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Event::Signal(signal) => Some(signal.timestamp()),
            Event::Fill(fill) => Some(fill.timestamp()),
            Event::Market | Event::Order(_) => None,
        }
    }

    /// # Logic
    /// 带时间戳的事件不得早于 `instant` (通常是触发它的 K 线时间)，
    /// 相等视为合法，没有时间戳的事件总是通过。
    pub fn ensure_not_before(&self, instant: DateTime<Utc>) -> Result<(), EventError> {
        match self.timestamp() {
            Some(ts) if ts < instant => Err(EventError::invalid(
                "timestamp",
                format!(
                    "{} precedes {}",
                    format_instant(&ts),
                    format_instant(&instant)
                ),
            )),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Market => write!(f, "Market"),
            Event::Signal(signal) => fmt::Display::fmt(signal, f),
            Event::Order(order) => fmt::Display::fmt(order, f),
            Event::Fill(fill) => fmt::Display::fmt(fill, f),
        }
    }
}

impl From<SignalEvent> for Event {
    fn from(signal: SignalEvent) -> Self {
        Event::Signal(signal)
    }
}

impl From<OrderEvent> for Event {
    fn from(order: OrderEvent) -> Self {
        Event::Order(order)
    }
}

impl From<FillEvent> for Event {
    fn from(fill: FillEvent) -> Self {
        Event::Fill(fill)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::time::FakeClockProvider;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_market_event_kind() {
        let event = Event::market();
        assert_eq!(event.kind(), EventKind::Market);
        assert_eq!(event.symbol(), None);
        assert_eq!(event.timestamp(), None);
        assert_eq!(event.to_string(), "Market");
    }

    #[test]
    fn test_signal_keeps_fields_exactly() {
        let signal = SignalEvent::new(" BTCUSD", t0(), SignalType::Short).unwrap();
        // 不做任何裁剪或转换
        assert_eq!(signal.symbol(), " BTCUSD");
        assert_eq!(signal.timestamp(), t0());
        assert_eq!(signal.signal_type(), SignalType::Short);
        assert_eq!(Event::from(signal).kind(), EventKind::Signal);
    }

    #[test]
    fn test_signal_rejects_empty_symbol() {
        for symbol in ["", "   "] {
            let err = SignalEvent::new(symbol, t0(), SignalType::Long).unwrap_err();
            assert!(matches!(
                err,
                EventError::InvalidArgument { field: "symbol", .. }
            ));
        }
    }

    #[test]
    fn test_signal_stamped_by_clock() {
        let clock = FakeClockProvider::new(t0());
        let signal = SignalEvent::at("ETHUSD", SignalType::Long, &clock).unwrap();
        assert_eq!(signal.timestamp(), t0());
        assert_eq!(
            signal.to_string(),
            "Signal: Symbol=ETHUSD, Timestamp=2024-01-02T00:00:00Z, Type=LONG"
        );
    }

    #[test]
    fn test_order_describe_is_stable() {
        let order = OrderEvent::new("BTCUSD", OrderType::Market, dec!(10), Direction::Buy).unwrap();
        assert_eq!(
            order.describe(),
            "Order: Symbol=BTCUSD, Type=MKT, Quantity=10, Direction=BUY"
        );

        let limit = OrderEvent::limit("BTCUSD", dec!(0.5), Direction::Sell, dec!(42000.25)).unwrap();
        assert_eq!(
            limit.describe(),
            "Order: Symbol=BTCUSD, Type=LMT, Quantity=0.5, Direction=SELL, LimitPrice=42000.25"
        );
    }

    #[test]
    fn test_order_quantity_bounds() {
        for quantity in [dec!(0), dec!(-1), dec!(-0.0001)] {
            let err = OrderEvent::market("BTCUSD", quantity, Direction::Buy).unwrap_err();
            assert!(matches!(
                err,
                EventError::InvalidArgument { field: "quantity", .. }
            ));
        }

        // 可表示的最小正数
        let smallest = Decimal::new(1, 28);
        let order = OrderEvent::market("BTCUSD", smallest, Direction::Buy).unwrap();
        assert_eq!(order.quantity(), smallest);
    }

    #[test]
    fn test_order_rejects_empty_symbol() {
        assert!(OrderEvent::market("", dec!(1), Direction::Buy).is_err());
    }

    #[test]
    fn test_limit_order_requires_price() {
        let err = OrderEvent::new("BTCUSD", OrderType::Limit, dec!(1), Direction::Buy).unwrap_err();
        assert!(matches!(
            err,
            EventError::InvalidArgument { field: "limit_price", .. }
        ));

        assert!(OrderEvent::limit("BTCUSD", dec!(1), Direction::Buy, dec!(0)).is_err());

        let order = OrderEvent::limit("BTCUSD", dec!(1), Direction::Buy, dec!(100)).unwrap();
        assert_eq!(order.order_type(), OrderType::Limit);
        assert_eq!(order.limit_price(), Some(dec!(100)));
    }

    #[test]
    fn test_identical_inputs_give_equal_values() {
        let order_a = OrderEvent::market("BTCUSD", dec!(10), Direction::Buy).unwrap();
        let order_b = OrderEvent::market("BTCUSD", dec!(10), Direction::Buy).unwrap();
        assert_eq!(order_a, order_b);

        let signal_a = SignalEvent::new("BTCUSD", t0(), SignalType::Long).unwrap();
        let signal_b = SignalEvent::new("BTCUSD", t0(), SignalType::Long).unwrap();
        assert_eq!(signal_a, signal_b);

        let fill_a = FillEvent::new("BTCUSD", Direction::Sell, dec!(100), dec!(5), dec!(1.5), t0()).unwrap();
        let fill_b = FillEvent::new("BTCUSD", Direction::Sell, dec!(100), dec!(5), dec!(1.5), t0()).unwrap();
        assert_eq!(fill_a, fill_b);

        assert_eq!(Event::market(), Event::market());
        assert_eq!(Event::from(fill_a), Event::from(fill_b));

        // 任一字段不同即不相等
        let other = FillEvent::new("BTCUSD", Direction::Buy, dec!(100), dec!(5), dec!(1.5), t0()).unwrap();
        assert_ne!(Event::from(other), Event::from(signal_a));
    }

    #[test]
    fn test_fill_exposes_fields() {
        let fill = FillEvent::new("BTCUSD", Direction::Buy, dec!(100.0), dec!(5), dec!(1.5), t0()).unwrap();
        assert_eq!(fill.symbol(), "BTCUSD");
        assert_eq!(fill.price(), dec!(100.0));
        assert_eq!(fill.quantity(), dec!(5));
        assert_eq!(fill.commission(), dec!(1.5));
        assert_eq!(fill.timestamp(), t0());
        assert_eq!(
            fill.to_string(),
            "Fill: Symbol=BTCUSD, Direction=BUY, Quantity=5, Price=100.0, Commission=1.5, Timestamp=2024-01-02T00:00:00Z"
        );
    }

    #[test]
    fn test_fill_validation() {
        let price_err = FillEvent::new("BTCUSD", Direction::Buy, dec!(0), dec!(5), dec!(1.5), t0()).unwrap_err();
        assert!(matches!(price_err, EventError::InvalidArgument { field: "price", .. }));

        let fee_err = FillEvent::new("BTCUSD", Direction::Buy, dec!(100), dec!(5), dec!(-0.01), t0()).unwrap_err();
        assert!(matches!(fee_err, EventError::InvalidArgument { field: "commission", .. }));

        let qty_err = FillEvent::new("BTCUSD", Direction::Buy, dec!(100), dec!(0), dec!(0), t0()).unwrap_err();
        assert!(matches!(qty_err, EventError::InvalidArgument { field: "quantity", .. }));

        // 零手续费合法
        assert!(FillEvent::new("BTCUSD", Direction::Sell, dec!(100), dec!(5), dec!(0), t0()).is_ok());
    }

    #[test]
    fn test_fill_cash_delta() {
        let buy = FillEvent::new("BTCUSD", Direction::Buy, dec!(100.0), dec!(5), dec!(1.5), t0()).unwrap();
        assert_eq!(buy.notional().unwrap(), dec!(500));
        assert_eq!(buy.cash_delta().unwrap(), dec!(-501.5));

        let sell = FillEvent::new("BTCUSD", Direction::Sell, dec!(100.0), dec!(5), dec!(1.5), t0()).unwrap();
        assert_eq!(sell.cash_delta().unwrap(), dec!(498.5));
    }

    #[test]
    fn test_fill_amounts_report_overflow() {
        // 字段本身合法，但派生金额超出范围
        let fill = FillEvent::new("BTCUSD", Direction::Buy, Decimal::MAX, dec!(2), dec!(0), t0()).unwrap();
        assert_eq!(fill.notional(), Err(EventError::Overflow("notional")));
        assert_eq!(fill.cash_delta(), Err(EventError::Overflow("notional")));

        // 成交金额恰好为 MAX，卖出扣除手续费不会溢出，买入加上手续费会溢出
        let sell = FillEvent::new("BTCUSD", Direction::Sell, Decimal::MAX, dec!(1), dec!(1), t0()).unwrap();
        assert_eq!(sell.cash_delta().unwrap(), Decimal::MAX - dec!(1));
        let buy = FillEvent::new("BTCUSD", Direction::Buy, Decimal::MAX, dec!(1), dec!(1), t0()).unwrap();
        assert_eq!(buy.cash_delta(), Err(EventError::Overflow("cash_delta")));
    }

    #[test]
    fn test_enum_tokens() {
        assert_eq!("long".parse::<SignalType>().unwrap(), SignalType::Long);
        assert_eq!("LMT".parse::<OrderType>().unwrap(), OrderType::Limit);
        assert_eq!("market".parse::<OrderType>().unwrap(), OrderType::Market);
        assert_eq!("Sell".parse::<Direction>().unwrap(), Direction::Sell);
        assert_eq!("fill".parse::<EventKind>().unwrap(), EventKind::Fill);

        assert!(matches!(
            "FLAT".parse::<SignalType>(),
            Err(EventError::InvalidArgument { field: "signal_type", .. })
        ));
        assert!("STOP".parse::<OrderType>().is_err());
        assert!("HOLD".parse::<Direction>().is_err());
    }

    #[test]
    fn test_direction_helpers() {
        assert_eq!(Direction::Buy.opposite(), Direction::Sell);
        assert_eq!(Direction::Sell.sign(), dec!(-1));
    }

    #[test]
    fn test_ensure_not_before() {
        let signal: Event = SignalEvent::new("BTCUSD", t0(), SignalType::Long).unwrap().into();
        assert!(signal.ensure_not_before(t0()).is_ok());
        assert!(signal.ensure_not_before(t0() - chrono::Duration::seconds(1)).is_ok());
        assert!(signal.ensure_not_before(t0() + chrono::Duration::seconds(1)).is_err());
        assert!(Event::market().ensure_not_before(t0()).is_ok());
    }

    #[test]
    fn test_event_wire_format() {
        let order: Event = OrderEvent::market("BTCUSD", dec!(10), Direction::Buy).unwrap().into();
        let json = serde_json::to_string(&order).unwrap();
        assert_eq!(
            json,
            r#"{"type":"ORDER","symbol":"BTCUSD","order_type":"MKT","quantity":"10","direction":"BUY"}"#
        );
        let decoded: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, order);

        let market: Event = serde_json::from_str(r#"{"type":"MARKET"}"#).unwrap();
        assert_eq!(market, Event::market());
    }

    #[test]
    fn test_decode_runs_validation() {
        let zero_qty = r#"{"type":"ORDER","symbol":"BTCUSD","order_type":"MKT","quantity":0,"direction":"BUY"}"#;
        let err = serde_json::from_str::<Event>(zero_qty).unwrap_err();
        assert!(err.to_string().contains("quantity"));

        let bad_type = r#"{"type":"SIGNAL","symbol":"BTCUSD","timestamp":"2024-01-02T00:00:00Z","signal_type":"FLAT"}"#;
        assert!(serde_json::from_str::<Event>(bad_type).is_err());

        let market_with_price = r#"{"type":"ORDER","symbol":"BTCUSD","order_type":"MKT","quantity":"1","direction":"BUY","limit_price":"10"}"#;
        assert!(serde_json::from_str::<Event>(market_with_price).is_err());

        let limit = r#"{"type":"ORDER","symbol":"BTCUSD","order_type":"lmt","quantity":1,"direction":"buy","limit_price":"99.5"}"#;
        let event: Event = serde_json::from_str(limit).unwrap();
        assert_eq!(
            event.to_string(),
            "Order: Symbol=BTCUSD, Type=LMT, Quantity=1, Direction=BUY, LimitPrice=99.5"
        );
    }

    #[test]
    fn test_events_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Event>();
    }
}
