//! # 路由控制器层
//!
//! 每个子模块对应一组 HTTP 端点，Handler 只负责参数提取与响应组装，
//! 业务逻辑全部委托给 `CandleProvider`。

pub mod candles;
pub mod health;
