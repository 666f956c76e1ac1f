//! # `kandle-feed` - 上游行情适配层
//!
//! 每个上游 (交易所 + 市场) 由一张声明式的 `UpstreamProfile` 描述：
//! 基础路径、周期写法表、字段提取表、分页上限与响应信封。
//! `ExchangeClient` 依据描述表实现 `KlineSource`，不同上游之间不复制代码。

pub mod exchange;
pub mod profile;
