mod settings;

use std::sync::Arc;
use std::time::Duration;

use kandle_api::server::{AppState, start_server};
use kandle_core::common::time::LocalCalendar;
use kandle_core::common::{Exchange, MarketKind};
use kandle_core::config::{AppConfig, LogConfig};
use kandle_feed::exchange::{ExchangeClient, build_http_client};
use kandle_feed::profile::ALL_PROFILES;
use kandle_market::service::CandleService;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// # Summary
/// 应用启动入口，纯粹的 DI 容器。
/// 负责实例化所有具体实现组件并通过 `Arc<dyn Trait>` 注入到 API 层。
///
/// # Logic
/// 1. 加载并校验配置。
/// 2. 初始化全局日志。
/// 3. 为每个上游描述表创建数据源，组装 `CandleService`。
/// 4. 启动 HTTP 服务，收到 Ctrl-C 后退出。
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 配置
    let config = settings::load()?;
    config.validate()?;

    // 2. 日志 (guard 需存活至进程退出以刷新文件日志)
    let _guard = init_tracing(&config.log);
    info!("Kandle starting...");

    // 3. 组装数据源与服务
    let service = build_service(&config)?;
    let state = AppState {
        candles: Arc::new(service),
    };

    // 4. 启动 HTTP 服务
    start_server(state, &config.bind_addr()).await?;
    info!("Shutdown complete. Exiting...");

    Ok(())
}

/// # Summary
/// 初始化 `tracing` 订阅者：标准输出始终开启，配置了 `log.dir` 时追加按天滚动的文件输出。
///
/// # Returns
/// 文件输出的后台写线程守卫，未配置文件日志时为 `None`。
fn init_tracing(log: &LogConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));

    let (file_layer, guard) = match &log.dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "kandle.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();
    guard
}

/// # Summary
/// 为每个上游描述表创建共享 HTTP 连接池的 `ExchangeClient` 并注册到服务中。
fn build_service(config: &AppConfig) -> Result<CandleService, Box<dyn std::error::Error>> {
    let calendar = LocalCalendar::new(config.market.utc_offset_hours)?;
    let client = build_http_client(Duration::from_secs(config.market.request_timeout_secs))?;

    let mut service = CandleService::new(calendar, config.market.max_pages);
    for profile in ALL_PROFILES {
        let base_url = match (profile.exchange, profile.market) {
            (Exchange::Binance, MarketKind::Spot) => &config.upstreams.binance_spot,
            (Exchange::Binance, MarketKind::Futures) => &config.upstreams.binance_futures,
            (Exchange::Bybit, _) => &config.upstreams.bybit,
            (Exchange::Okx, _) => &config.upstreams.okx,
        };
        let api_key = match profile.exchange {
            Exchange::Binance => config.market.binance_api_key.clone(),
            _ => None,
        };

        let source = ExchangeClient::new(client.clone(), profile, base_url.as_str()).with_api_key(api_key);
        info!(upstream = profile.name, base_url = %base_url, "upstream registered");
        service = service.with_source(profile.exchange, profile.market, Arc::new(source));
    }
    Ok(service)
}
