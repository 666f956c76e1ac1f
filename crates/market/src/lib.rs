//! # `kandle-market` - K 线采集领域服务
//!
//! 组合区间解析、分页采集与归一化三个阶段，对外实现 `CandleProvider`。

pub mod collector;
pub mod export;
pub mod normalizer;
pub mod service;
