use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pvwatch_core::error::CoreError;
use pvwatch_engine::ControlError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A control-surface read or write failed.
    #[error(transparent)]
    Control(#[from] ControlError),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Control(err) => match err {
                ControlError::UnknownPv(_) => (StatusCode::NOT_FOUND, "UNKNOWN_PV", err.to_string()),
                ControlError::ReadOnly(_) => {
                    (StatusCode::METHOD_NOT_ALLOWED, "READ_ONLY", err.to_string())
                }
                ControlError::InvalidValue { .. } => {
                    (StatusCode::BAD_REQUEST, "INVALID_VALUE", err.to_string())
                }
                ControlError::Rejected(core) => classify_core_error(core),
            },
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    match err {
        CoreError::InvalidBounds { .. } => {
            (StatusCode::BAD_REQUEST, "INVALID_BOUNDS", err.to_string())
        }
        CoreError::InvalidConfig(_)
        | CoreError::DuplicateTarget(_)
        | CoreError::InvalidPvName(_) => {
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.to_string())
        }
        CoreError::Io(msg) => {
            tracing::error!(error = %msg, "I/O error");
            internal()
        }
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
