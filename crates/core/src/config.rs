use serde::{Deserialize, Serialize};

/// 全局应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log: LogConfig,
    pub replay: ReplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` 语法，例如 `info` 或 `tickflow_replay=debug`
    pub level: String,
    /// 设置后额外按天滚动写入该目录
    pub dir: Option<String>,
}

/// # Summary
/// 事件日志回放参数。
///
/// # Invariants
/// - `universe` 为空表示接受任意标的。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// JSON Lines 事件日志路径
    pub path: String,
    /// 严格模式下遇到非法记录立即中止，否则记录告警并跳过
    pub strict: bool,
    /// 可交易标的集合
    pub universe: Vec<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
        }
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            path: "events.jsonl".to_string(),
            strict: false,
            universe: Vec::new(),
        }
    }
}
