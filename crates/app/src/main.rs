use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use config::builder::{ConfigBuilder, DefaultState};
use tickflow_core::common::time::FakeClockProvider;
use tickflow_core::config::{AppConfig, LogConfig};
use tickflow_core::event::entity::EventKind;
use tickflow_core::event::port::EventHandler;
use tickflow_replay::driver::{ReplayDriver, ReplayOptions};
use tickflow_replay::handler::LogHandler;
use tickflow_replay::ledger::FillLedger;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// 以内置默认值作为最底层的配置来源
fn with_defaults() -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    Ok(config::Config::builder().add_source(config::Config::try_from(&AppConfig::default())?))
}

/// # Summary
/// 按层级加载配置：内置默认值 → 可选的 `tickflow.toml` → `TICKFLOW__*` 环境变量。
fn load_config() -> Result<AppConfig, config::ConfigError> {
    with_defaults()?
        .add_source(config::File::with_name("tickflow").required(false))
        .add_source(
            config::Environment::with_prefix("TICKFLOW")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("replay.universe")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}

/// # Summary
/// 初始化全局日志。配置了目录时额外按天滚动写文件。
///
/// # Returns
/// * 文件写入的 `WorkerGuard`，必须存活到进程退出以保证日志刷盘。
fn init_logging(config: &LogConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(&config.level)
        .with_context(|| format!("invalid log level `{}`", config.level))?;
    let stdout = fmt::layer();

    match &config.dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "tickflow.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stdout)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .try_init()?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stdout)
                .try_init()?;
            Ok(None)
        }
    }
}

/// # Summary
/// 应用启动入口。
///
/// # Logic
/// 1. 加载配置，命令行第一个参数可覆盖事件日志路径。
/// 2. 初始化全局日志。
/// 3. 组装成交账本与日志处理器，账本优先消费 Fill。
/// 4. 回放事件日志并输出统计与账本汇总。
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut config = load_config().context("failed to load configuration")?;
    if let Some(path) = std::env::args().nth(1) {
        config.replay.path = path;
    }

    let _guard = init_logging(&config.log)?;
    info!("tickflow replay starting...");

    let ledger = Arc::new(FillLedger::new());
    let handlers: Vec<Arc<dyn EventHandler>> = vec![ledger.clone(), Arc::new(LogHandler::all())];
    let clock = Arc::new(FakeClockProvider::new(DateTime::<Utc>::MIN_UTC));

    let driver = ReplayDriver::new(handlers, clock, ReplayOptions::from(&config.replay));
    let summary = driver
        .run(&config.replay.path)
        .await
        .with_context(|| format!("replay of {} failed", config.replay.path))?;

    for kind in EventKind::ALL {
        info!("{}: {}", kind, summary.count(kind));
    }
    for (symbol, position) in ledger.positions().await {
        info!(
            "Position {}: quantity={}, average_price={}",
            symbol, position.quantity, position.average_price
        );
    }
    info!(
        "Ledger cash={}, commission={}, rejected={}, unhandled={}",
        ledger.cash().await,
        ledger.commission().await,
        summary.rejected,
        summary.unhandled
    );

    Ok(())
}
