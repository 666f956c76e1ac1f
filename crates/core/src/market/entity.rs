use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// # Summary
/// 单根 K 线数据实体，是对外输出的标准形态。
///
/// # Invariants
/// - 同一序列内 `open_time` 严格递增且唯一 (由归一化阶段保证)。
/// - 扩展字段仅在上游提供时出现，缺失时不参与 JSON 序列化。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Candle {
    /// 开盘时间 (UTC 毫秒)
    #[schema(example = 1759262400000_i64)]
    pub open_time: i64,
    #[schema(example = 114000.5)]
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// 基础资产成交量
    pub volume: f64,
    /// 收盘时间 (UTC 毫秒)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_time: Option<i64>,
    /// 报价资产成交额
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taker_buy_base_volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taker_buy_quote_volume: Option<f64>,
}

/// # Summary
/// 单次请求解析后的 UTC 毫秒区间，两端均为闭区间。
///
/// # Invariants
/// - `start_ms > end_ms` 表示空区间，抓取结果为空而非错误。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchRange {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl FetchRange {
    pub fn new(start_ms: i64, end_ms: i64) -> Self {
        Self { start_ms, end_ms }
    }

    /// 区间是否不包含任何时刻
    pub fn is_empty(&self) -> bool {
        self.start_ms > self.end_ms
    }
}

/// # Summary
/// 上游返回的一行原始 K 线，保留上游的定位数组形态。
///
/// # Invariants
/// - `open_time` 已按上游布局表提取，供分页游标与去重使用。
/// - `fields` 的含义由对应上游的 `RowLayout` 解释。
#[derive(Debug, Clone, PartialEq)]
pub struct RawKline {
    pub open_time: i64,
    pub fields: Vec<serde_json::Value>,
}
