use thiserror::Error;

/// # Summary
/// 事件构造失败的唯一错误类型。
///
/// # Invariants
/// - 构造要么返回完整合法的事件，要么返回此错误，不存在半成品。
/// - 事件模型自身从不记录日志或重试，错误直接返回给调用方。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    // 字段违反了该变体的约束 (空代码、非正数量/价格、未知枚举值等)
    #[error("Invalid argument `{field}`: {reason}")]
    InvalidArgument { field: &'static str, reason: String },
    // 由合法字段派生的金额超出 Decimal 可表示范围
    #[error("Arithmetic overflow computing `{0}`")]
    Overflow(&'static str),
}

impl EventError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        EventError::InvalidArgument {
            field,
            reason: reason.into(),
        }
    }
}

/// # Summary
/// 流水线协作方 (策略、组合、执行) 处理事件时的错误。
#[derive(Error, Debug)]
pub enum HandlerError {
    // 处理器自身执行失败
    #[error("Handler execution error: {0}")]
    Handler(String),
    // 处理器派生新事件时构造失败
    #[error(transparent)]
    Event(#[from] EventError),
}
