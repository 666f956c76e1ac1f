//! # `kandle-api` - HTTP API 网关
//!
//! Kandle K 线网关的 HTTP/REST 服务入口。
//! 使用 `axum` 构建路由与控制器，通过 `utoipa` 自动生成 OpenAPI 3.0 Swagger 文档。
//!
//! ## 架构职责
//! - 解析查询参数并补全缺省值
//! - 调用下层 `CandleProvider` 完成区间解析、分页采集与归一化
//! - 将领域错误映射为 400 / 404 / 500 统一错误体

pub mod error;
pub mod routes;
pub mod server;
pub mod types;
