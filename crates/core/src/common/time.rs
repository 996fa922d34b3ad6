use chrono::{DateTime, Utc};
use std::sync::RwLock;

/// # Summary
/// 时间供给器接口，用于隔离物理系统时钟。
/// 回放与策略必须通过此接口获取当前时间，信号时间戳由此而来。
pub trait TimeProvider: Send + Sync {
    /// 获取当前挂载的时间
    fn now(&self) -> DateTime<Utc>;
}

/// # Summary
/// 实盘使用的真实时钟，直接返回操作系统当前时间。
pub struct RealTimeProvider;

impl TimeProvider for RealTimeProvider {
    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// # Summary
/// 回测专用虚拟时钟，由回放驱动器按事件时间拨动。
///
/// # Invariants
/// - 并发安全：内部利用 `RwLock` 提供多线程读写。
/// - 锁中毒时沿用内部值，时钟本身不会因此失效。
pub struct FakeClockProvider {
    current_time: RwLock<DateTime<Utc>>,
}

impl FakeClockProvider {
    /// 使用指定的初始时间创建虚拟时钟
    pub fn new(initial_time: DateTime<Utc>) -> Self {
        Self {
            current_time: RwLock::new(initial_time),
        }
    }

    /// 强制修改时钟的当前时间
    pub fn set_time(&self, new_time: DateTime<Utc>) {
        let mut time = self
            .current_time
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *time = new_time;
    }

    /// # Logic
    /// 仅当 `new_time` 不早于当前时间时拨动时钟。
    ///
    /// # Returns
    /// * `true` 表示已拨动 (含相等)，`false` 表示 `new_time` 落后于时钟，未做修改。
    pub fn advance_to(&self, new_time: DateTime<Utc>) -> bool {
        let mut time = self
            .current_time
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if new_time < *time {
            return false;
        }
        *time = new_time;
        true
    }
}

impl TimeProvider for FakeClockProvider {
    fn now(&self) -> DateTime<Utc> {
        *self
            .current_time
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
