//! # DTO (Data Transfer Object) 层
//!
//! 查询参数与响应体结构。K 线本身直接使用领域实体 `Candle` 输出。

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use kandle_core::common::time::RangeInput;
use kandle_core::common::{Exchange, Interval, MarketKind};
use kandle_core::market::port::CandleQuery;

use crate::error::ApiError;

// ============================================================
//  K 线查询参数
// ============================================================

/// `/api/candles` 与 `/api/candles.csv` 共用的查询参数
///
/// 时间戳参数以字符串接收，解析失败时返回统一的 400 错误体。
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CandlesParams {
    /// 资产名称 (默认 BTC)
    #[param(example = "BTC")]
    pub instrument_name: Option<String>,
    /// 显式交易对，优先于 instrument_name
    #[param(example = "BTCUSDT")]
    pub symbol: Option<String>,
    /// 本地开始日期 YYYY-MM-DD
    #[param(example = "2025-10-01")]
    pub start_date: Option<String>,
    /// 本地结束日期 YYYY-MM-DD (缺省为单日)
    pub end_date: Option<String>,
    /// UTC 毫秒开始时间，不可与日期参数混用
    pub start_ts: Option<String>,
    /// UTC 毫秒结束时间
    pub end_ts: Option<String>,
    /// K 线周期 (默认 1m)
    #[param(example = "1m")]
    pub resolution: Option<String>,
    /// spot | futures (默认 spot)
    #[param(example = "spot")]
    pub market: Option<String>,
    /// binance | bybit | okx (默认 binance)
    #[param(example = "binance")]
    pub exchange: Option<String>,
}

impl CandlesParams {
    /// # Summary
    /// 校验查询参数并构建领域查询。
    ///
    /// # Logic
    /// 1. 时间戳参数与日期参数不可混用；`start_ts` 存在时进入时间戳模式，否则要求 `start_date`。
    /// 2. 周期、市场、交易所按缺省值补全后解析，未知取值一律拒绝。
    ///
    /// # Returns
    /// 缺少起点、两种区间模式混用或取值非法时返回 `BadRequest`。
    pub fn to_query(&self) -> Result<CandleQuery, ApiError> {
        let has_ts = non_empty(&self.start_ts).is_some() || non_empty(&self.end_ts).is_some();
        let has_dates = non_empty(&self.start_date).is_some() || non_empty(&self.end_date).is_some();
        if has_ts && has_dates {
            return Err(ApiError::bad_request(
                "use either start_date/end_date or start_ts/end_ts, not both",
            ));
        }

        let range = match (non_empty(&self.start_ts), non_empty(&self.start_date)) {
            (Some(start), _) => RangeInput::Timestamps {
                start: parse_ts("start_ts", start)?,
                end: non_empty(&self.end_ts)
                    .map(|end| parse_ts("end_ts", end))
                    .transpose()?,
            },
            (None, Some(start)) => RangeInput::Dates {
                start: start.to_string(),
                end: non_empty(&self.end_date).map(str::to_string),
            },
            (None, None) => {
                return Err(ApiError::bad_request(
                    "start_date required (YYYY-MM-DD, local date) or start_ts (ms)",
                ));
            }
        };

        Ok(CandleQuery {
            exchange: non_empty(&self.exchange)
                .unwrap_or("binance")
                .parse::<Exchange>()?,
            market: non_empty(&self.market)
                .unwrap_or("spot")
                .parse::<MarketKind>()?,
            instrument_name: non_empty(&self.instrument_name).unwrap_or("BTC").to_string(),
            symbol: non_empty(&self.symbol).map(str::to_string),
            interval: non_empty(&self.resolution)
                .unwrap_or("1m")
                .parse::<Interval>()?,
            range,
        })
    }

    /// CSV 文件名中使用的区间标签
    pub fn range_labels(&self) -> (String, String) {
        let start = non_empty(&self.start_ts)
            .or(non_empty(&self.start_date))
            .unwrap_or("start");
        let end = if non_empty(&self.start_ts).is_some() {
            non_empty(&self.end_ts)
        } else {
            non_empty(&self.end_date)
        }
        .unwrap_or(start);
        (start.to_string(), end.to_string())
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_ts(name: &str, raw: &str) -> Result<i64, ApiError> {
    raw.parse().map_err(|_| {
        ApiError::BadRequest {
            message: "Invalid request".to_string(),
            details: format!("{} must be a millisecond timestamp, got '{}'", name, raw),
        }
    })
}

// ============================================================
//  通用响应
// ============================================================

/// 失败响应体
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 错误描述信息
    pub error: String,
    /// 详细原因 (上游错误载荷等)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiErrorResponse {
    /// 从错误信息构建
    pub fn from_msg(msg: impl Into<String>) -> Self {
        Self {
            error: msg.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// 健康检查响应
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "OK")]
    pub status: String,
    pub message: String,
    /// ISO 8601 服务器时间
    #[schema(example = "2025-10-01T08:00:00.000Z")]
    pub timestamp: String,
}
