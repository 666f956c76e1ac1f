//! # `kandle-core` - 领域核心
//!
//! 定义 K 线网关各层共享的实体、错误、端口 (trait) 与配置结构。
//! 本 crate 不包含任何网络或 HTTP 实现。

pub mod common;
pub mod config;
pub mod market;
