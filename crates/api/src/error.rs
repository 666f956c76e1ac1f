//! # API 统一错误处理
//!
//! 领域错误到 HTTP 状态码与 JSON 响应体的唯一转换点。

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use kandle_core::market::error::MarketError;

use crate::types::ApiErrorResponse;

/// API 层统一错误枚举
#[derive(Error, Debug)]
pub enum ApiError {
    /// 请求参数错误 (400)
    #[error("{message}: {details}")]
    BadRequest { message: String, details: String },

    /// 区间内没有数据 (404)
    #[error("{0}")]
    NotFound(String),

    /// 上游抓取或解析失败 (500)
    #[error("{message}: {details}")]
    Internal { message: String, details: String },
}

impl ApiError {
    pub fn bad_request(details: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: "Invalid request".to_string(),
            details: details.into(),
        }
    }
}

/// 将 `ApiError` 转换为 axum 的 HTTP 响应
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest { message, details } => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse::from_msg(message).with_details(details),
            ),
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, ApiErrorResponse::from_msg(message))
            }
            ApiError::Internal { message, details } => {
                tracing::error!(%message, %details, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::from_msg(message).with_details(details),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// 从 `MarketError` 转换
impl From<MarketError> for ApiError {
    fn from(err: MarketError) -> Self {
        match &err {
            MarketError::MalformedDate(_)
            | MarketError::UnsupportedInterval(_)
            | MarketError::InvalidRequest(_)
            | MarketError::RangeTooLarge { .. } => ApiError::bad_request(err.to_string()),
            MarketError::UpstreamFetch(_) | MarketError::Parse(_) => ApiError::Internal {
                message: "Failed to fetch data".to_string(),
                details: err.to_string(),
            },
        }
    }
}
