use async_trait::async_trait;
use std::collections::HashSet;
use tickflow_core::event::entity::{Event, EventKind};
use tickflow_core::event::error::HandlerError;
use tickflow_core::event::port::EventHandler;
use tracing::info;

/// # Summary
/// 把事件的单行描述写入日志的处理器。
/// 事件本身只负责格式化，输出到哪里由这里决定。
pub struct LogHandler {
    kinds: HashSet<EventKind>,
}

impl LogHandler {
    /// 仅接收指定种类的事件
    pub fn new(kinds: impl IntoIterator<Item = EventKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
        }
    }

    /// 接收全部种类
    pub fn all() -> Self {
        Self::new(EventKind::ALL)
    }
}

#[async_trait]
impl EventHandler for LogHandler {
    fn matches(&self, event: &Event) -> bool {
        self.kinds.contains(&event.kind())
    }

    async fn handle(&self, event: Event) -> Result<(), HandlerError> {
        info!(kind = %event.kind(), "{}", event);
        Ok(())
    }
}
