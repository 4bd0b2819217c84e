//! Error types for the anchoring server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::anchoring::AnchorError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Anchoring error: {0}")]
    Anchor(#[from] AnchorError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::Anchor(e @ AnchorError::QuoteNotFound) => {
                (StatusCode::NOT_FOUND, "quote_not_found", e.to_string())
            }
            AppError::Anchor(
                e @ (AnchorError::NoQuoteSelector | AnchorError::InvalidPageIndex { .. }),
            ) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_selection", e.to_string()),
            AppError::Anchor(e) if e.is_selection_error() => {
                (StatusCode::UNPROCESSABLE_ENTITY, "invalid_selection", e.to_string())
            }
            AppError::Anchor(e @ AnchorError::PageNotLoaded(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "not_loaded", e.to_string())
            }
            AppError::Anchor(e) => {
                tracing::error!("Anchoring error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "anchoring_error",
                    "Anchoring failed".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::NotFound("doc".into()), StatusCode::NOT_FOUND),
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Anchor(AnchorError::QuoteNotFound), StatusCode::NOT_FOUND),
            (
                AppError::Anchor(AnchorError::NoQuoteSelector),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::Anchor(AnchorError::CrossPageSelection),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::Anchor(AnchorError::EmptySelection),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::Anchor(AnchorError::InvalidPageIndex {
                    index: 4,
                    page_count: 2,
                }),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::Anchor(AnchorError::Range("bad".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }
}
