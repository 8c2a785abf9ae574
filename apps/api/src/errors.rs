#![allow(dead_code)]

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Note what is deliberately absent: per-file extraction failures never
/// become an `AppError` (the extractor degrades them to diagnostic strings),
/// and a model response with an unexpected shape degrades to a raw-text
/// result instead of failing the request.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    /// A multipart upload was rejected by the file filter
    /// (unsupported media type, too many files, or an oversized file).
    #[error("{0}")]
    UnsupportedUpload(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Upstream(#[from] LlmError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Wire shape for every error response: `{ "error": ..., "details"?: ... }`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::UnsupportedUpload(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::Upstream(e) => upstream_response(e),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "データベースエラーが発生しました".to_string(),
                    Some(e.to_string()),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "内部エラーが発生しました".to_string(),
                    Some(e.to_string()),
                )
            }
        };

        (status, Json(ErrorBody { error, details })).into_response()
    }
}

/// Maps the provider error taxonomy onto distinct statuses and messages:
/// auth → 401, quota/rate limit → 429, context overflow → 400, rest → 500.
fn upstream_response(e: &LlmError) -> (StatusCode, String, Option<String>) {
    match e {
        LlmError::Auth => (
            StatusCode::UNAUTHORIZED,
            "APIキーが無効です".to_string(),
            None,
        ),
        LlmError::Quota => (
            StatusCode::TOO_MANY_REQUESTS,
            "API使用量制限に達しました".to_string(),
            None,
        ),
        LlmError::RateLimited => (
            StatusCode::TOO_MANY_REQUESTS,
            "APIレート制限に達しました。しばらく待ってから再試行してください".to_string(),
            None,
        ),
        LlmError::ContextTooLarge => (
            StatusCode::BAD_REQUEST,
            "テキスト量が多すぎます。ファイル数や内容を減らしてください".to_string(),
            None,
        ),
        other => {
            tracing::error!("LLM error: {other}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AI処理中にエラーが発生しました".to_string(),
                Some(other.to_string()),
            )
        }
    }
}
