//! tickflow 离散事件回测的事件模型。
//!
//! 数据源 → 策略 → 组合 → 执行 → 组合 之间流转的消息字母表：
//! `Market`、`Signal`、`Order`、`Fill` 四种封闭变体，
//! 以及消费这些事件的端口、时钟抽象与配置模型。

pub mod common;
pub mod config;
pub mod event;
