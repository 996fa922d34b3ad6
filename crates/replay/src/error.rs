use thiserror::Error;
use tickflow_core::event::error::HandlerError;

/// # Summary
/// 回放过程中的错误。
///
/// # Invariants
/// - 除 `Io` 外都带有事件日志中的行号 (从 1 开始)。
#[derive(Error, Debug)]
pub enum ReplayError {
    // 事件日志无法读取
    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    // 记录无法解码为合法事件 (含构造校验失败)
    #[error("Line {line}: cannot decode event: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    // 记录合法但被回放规则拒绝 (标的不在范围内、时间倒流)
    #[error("Line {line}: {reason}")]
    Rejected { line: usize, reason: String },
    // 处理器执行失败
    #[error("Line {line}: handler failed: {source}")]
    Handler {
        line: usize,
        #[source]
        source: HandlerError,
    },
}
