use crate::error::ReplayError;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tickflow_core::common::time::{FakeClockProvider, TimeProvider};
use tickflow_core::config::ReplayConfig;
use tickflow_core::event::entity::{Event, EventKind};
use tickflow_core::event::port::EventHandler;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

/// # Summary
/// 回放规则。
#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    /// 严格模式：非法记录直接中止回放
    pub strict: bool,
    /// 可交易标的，为空表示不限制
    pub universe: HashSet<String>,
}

impl From<&ReplayConfig> for ReplayOptions {
    fn from(config: &ReplayConfig) -> Self {
        Self {
            strict: config.strict,
            universe: config.universe.iter().cloned().collect(),
        }
    }
}

/// # Summary
/// 一次回放的统计结果。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplaySummary {
    /// 已路由的事件数，按种类统计
    pub counts: BTreeMap<EventKind, usize>,
    /// 宽松模式下被跳过的记录数
    pub rejected: usize,
    /// 没有任何处理器接收的事件数
    pub unhandled: usize,
    /// 最后一个带时间戳事件的时间
    pub last_timestamp: Option<DateTime<Utc>>,
}

impl ReplaySummary {
    pub fn count(&self, kind: EventKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// 行情事件数，即回放经过的 tick 数
    pub fn ticks(&self) -> usize {
        self.count(EventKind::Market)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// # Summary
/// ReplayDriver：回放驱动器，按记录顺序重放事件日志并驱动虚拟时钟。
///
/// # Invariants
/// - 每条记录都经过事件构造校验，非法记录不会成为 `Event`。
/// - 带时间戳的事件不得早于时钟，合法事件把时钟拨到自己的时间。
/// - 每个事件只交给第一个匹配的处理器，不会被重复消费。
pub struct ReplayDriver {
    handlers: Vec<Arc<dyn EventHandler>>,
    time_provider: Arc<FakeClockProvider>,
    options: ReplayOptions,
}

impl ReplayDriver {
    /// # Summary
    /// 创建回放驱动器。
    ///
    /// # Arguments
    /// * `handlers`: 按优先级排列的事件处理器。
    /// * `time_provider`: 被回放完全控制的虚拟时钟。
    /// * `options`: 回放规则。
    pub fn new(
        handlers: Vec<Arc<dyn EventHandler>>,
        time_provider: Arc<FakeClockProvider>,
        options: ReplayOptions,
    ) -> Self {
        Self {
            handlers,
            time_provider,
            options,
        }
    }

    /// # Summary
    /// 回放整个事件日志。
    ///
    /// # Logic
    /// 1. 逐行读取，跳过空行与 `#` 注释。
    /// 2. 解码并校验记录，检查标的范围与时间线。
    /// 3. 严格模式下首个非法记录即返回错误，否则告警并计入 `rejected`。
    /// 4. 将事件交给第一个匹配的处理器，处理器报错则中止。
    ///
    /// # Returns
    /// * `Result<ReplaySummary, ReplayError>` - 回放统计或首个致命错误。
    pub async fn run(&self, path: impl AsRef<Path>) -> Result<ReplaySummary, ReplayError> {
        let path = path.as_ref();
        info!("ReplayDriver starting for [{}]", path.display());

        let io_error = |source: std::io::Error| ReplayError::Io {
            path: path.display().to_string(),
            source,
        };
        let file = File::open(path).await.map_err(io_error)?;
        let mut lines = BufReader::new(file).lines();

        let mut summary = ReplaySummary::default();
        let mut line_no = 0;

        while let Some(line) = lines.next_line().await.map_err(io_error)? {
            line_no += 1;
            let record = line.trim();
            if record.is_empty() || record.starts_with('#') {
                continue;
            }

            let event = match self.admit(record, line_no) {
                Ok(event) => event,
                Err(e) if !self.options.strict => {
                    warn!("Replay skipped record: {}", e);
                    summary.rejected += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            if let Some(ts) = event.timestamp() {
                summary.last_timestamp = Some(ts);
            }
            *summary.counts.entry(event.kind()).or_default() += 1;
            debug!(line = line_no, "{}", event);

            match self.handlers.iter().find(|h| h.matches(&event)) {
                Some(handler) => {
                    handler
                        .handle(event)
                        .await
                        .map_err(|source| ReplayError::Handler {
                            line: line_no,
                            source,
                        })?;
                }
                None => {
                    debug!(line = line_no, "No handler for {} event", event.kind());
                    summary.unhandled += 1;
                }
            }
        }

        info!(
            "ReplayDriver finished: {} events over {} ticks, {} rejected, {} unhandled",
            summary.total(),
            summary.ticks(),
            summary.rejected,
            summary.unhandled
        );
        Ok(summary)
    }

    fn admit(&self, record: &str, line: usize) -> Result<Event, ReplayError> {
        let event: Event =
            serde_json::from_str(record).map_err(|source| ReplayError::Decode { line, source })?;

        if !self.options.universe.is_empty()
            && let Some(symbol) = event.symbol()
            && !self.options.universe.contains(symbol)
        {
            return Err(ReplayError::Rejected {
                line,
                reason: format!("symbol `{symbol}` is not in the trading universe"),
            });
        }

        event
            .ensure_not_before(self.time_provider.now())
            .map_err(|e| ReplayError::Rejected {
                line,
                reason: format!("out-of-order {} event: {}", event.kind(), e),
            })?;

        if let Some(ts) = event.timestamp() {
            self.time_provider.advance_to(ts);
        }
        Ok(event)
    }
}
