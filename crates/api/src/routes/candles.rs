use axum::Json;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use kandle_core::market::entity::Candle;
use kandle_core::market::port::CandleSeries;
use kandle_market::export::candles_to_csv;

use crate::error::ApiError;
use crate::server::AppState;
use crate::types::{ApiErrorResponse, CandlesParams};

const EMPTY_RANGE_MSG: &str =
    "No candle data returned for the selected range. Try a smaller/recent range (e.g., last 24 hours)";

/// 执行查询，空结果统一转换为 404
async fn load_series(state: &AppState, params: &CandlesParams) -> Result<CandleSeries, ApiError> {
    let query = params.to_query()?;
    let series = state.candles.fetch_candles(query).await?;
    if series.candles.is_empty() {
        tracing::warn!(
            symbol = %series.symbol,
            start = series.range.start_ms,
            end = series.range.end_ms,
            "no candles in range"
        );
        return Err(ApiError::NotFound(EMPTY_RANGE_MSG.to_string()));
    }
    Ok(series)
}

/// 获取历史 K 线 (JSON)
///
/// 日期参数按服务配置的本地时区解释为整日区间，结果按开盘时间升序且无重复。
#[utoipa::path(
    get,
    path = "/api/candles",
    tag = "行情 (Market)",
    params(CandlesParams),
    responses(
        (status = 200, description = "K 线序列", body = Vec<Candle>),
        (status = 400, description = "参数错误", body = ApiErrorResponse),
        (status = 404, description = "区间内无数据", body = ApiErrorResponse),
        (status = 500, description = "上游抓取失败", body = ApiErrorResponse)
    )
)]
pub async fn get_candles(
    State(state): State<AppState>,
    Query(params): Query<CandlesParams>,
) -> Result<Json<Vec<Candle>>, ApiError> {
    let series = load_series(&state, &params).await?;
    Ok(Json(series.candles))
}

/// 下载历史 K 线 (CSV)
#[utoipa::path(
    get,
    path = "/api/candles.csv",
    tag = "行情 (Market)",
    params(CandlesParams),
    responses(
        (status = 200, description = "CSV 附件", body = String, content_type = "text/csv"),
        (status = 400, description = "参数错误", body = ApiErrorResponse),
        (status = 404, description = "区间内无数据", body = ApiErrorResponse),
        (status = 500, description = "上游抓取失败", body = ApiErrorResponse)
    )
)]
pub async fn get_candles_csv(
    State(state): State<AppState>,
    Query(params): Query<CandlesParams>,
) -> Result<Response, ApiError> {
    let series = load_series(&state, &params).await?;
    let body = candles_to_csv(&series.candles)?;

    let (start, end) = params.range_labels();
    let filename = sanitize_filename(&format!(
        "{}_{}_{}_to_{}.csv",
        series.symbol, series.interval, start, end
    ));

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response())
}

/// 文件名只保留字母数字与 `-_.`，其余字符替换为 `_`
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(
            sanitize_filename("BTCUSDT_1m_2025-10-01_to_2025-10-02.csv"),
            "BTCUSDT_1m_2025-10-01_to_2025-10-02.csv"
        );
        assert_eq!(sanitize_filename("a\"b/c\r\n.csv"), "a_b_c__.csv");
    }
}
