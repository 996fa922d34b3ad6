use crate::event::entity::Event;
use crate::event::error::HandlerError;
use async_trait::async_trait;

/// # Summary
/// 事件消费接口 (Port)。
/// 策略、组合、执行等流水线协作方通过实现此接口接入事件流。
///
/// # Invariants
/// - 实现类必须保证线程安全 (`Send` + `Sync`)。
/// - 每个事件只会交给一个处理器，`handle` 取得事件所有权，事件被消费后即丢弃。
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// # Summary
    /// 该处理器是否负责消费此事件。
    ///
    /// # Logic
    /// 处理器通常基于 `Event::kind` 或 `symbol` 进行匹配。
    fn matches(&self, event: &Event) -> bool;

    /// # Summary
    /// 消费事件。
    ///
    /// # Returns
    /// * 成功返回 `Ok(())`，失败返回 `HandlerError`，由调度方决定是否中止。
    async fn handle(&self, event: Event) -> Result<(), HandlerError>;
}
