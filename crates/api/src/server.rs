//! # API 服务启动器
//!
//! 组装 axum 路由、挂载 Swagger UI、配置 CORS 并绑定 TCP 端口对外提供服务。
//! 本模块不直接启动 `main()`, 而是由 `crates/app` 组装依赖后调用。

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use utoipa_swagger_ui::SwaggerUi;

use kandle_core::market::port::CandleProvider;

use crate::routes::{candles, health};

// ============================================================
//  共享应用状态
// ============================================================

/// 全局应用状态，通过 axum 的 `State` 提取器注入到每个 Handler 中。
///
/// # Invariants
/// - `candles` 在服务启动前注入，生命周期与进程等同。
#[derive(Clone)]
pub struct AppState {
    /// K 线查询服务
    pub candles: Arc<dyn CandleProvider>,
}

// ============================================================
//  OpenAPI 文档定义
// ============================================================

/// 全局 OpenAPI 文档结构
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Kandle K 线网关 API",
        version = "0.1.0",
        description = "代理 Binance / Bybit / OKX 的历史 K 线接口，按本地日历解析日期区间，输出去重排序后的 JSON 或 CSV。",
        license(name = "MIT")
    ),
    tags(
        (name = "行情 (Market)", description = "历史 K 线查询与 CSV 导出"),
        (name = "系统 (System)", description = "健康检查")
    )
)]
pub struct ApiDoc;

// ============================================================
//  服务构建与启动
// ============================================================

/// # Summary
/// 构建完整的 axum 应用路由树 (含 Swagger UI 与 CORS)。
pub fn build_router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .routes(routes!(candles::get_candles))
        .routes(routes!(candles::get_candles_csv))
        .routes(routes!(health::health))
        .with_state(state)
        .split_for_parts();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api))
        .layer(cors)
}

/// # Summary
/// 在已绑定的监听器上提供服务，直到 `shutdown` 完成。
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// # Summary
/// 绑定地址并启动 HTTP 服务，收到 Ctrl-C 后优雅退出。
///
/// # Arguments
/// * `state` - 由外部组装的共享状态
/// * `bind_addr` - 监听的地址与端口，如 `"0.0.0.0:10000"`
///
/// # Returns
/// 端口绑定失败或服务异常退出时返回 IO 错误。
pub async fn start_server(state: AppState, bind_addr: &str) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind_addr).await?;

    tracing::info!("Kandle API Server listening on {}", bind_addr);
    tracing::info!("Swagger UI: http://{}/swagger-ui/", bind_addr);

    serve(listener, state, shutdown_signal()).await?;
    tracing::info!("Kandle API Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
