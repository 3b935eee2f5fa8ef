// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// Gateway error taxonomy with appropriate status codes and client-safe bodies.
///
/// Every handler converts all failures to one of these three entries; nothing
/// escapes unconverted. Internal detail is kept for server-side logging only
/// and never serialized into the response body.
#[derive(Debug)]
pub enum ApiError {
    // 401 Unauthorized - auth gate failed, upstream never called
    Unauthorized,

    // 400 Bad Request - validation rejected the body, upstream never called
    ValidationFailed { details: Value },

    // 500 Internal Server Error - upstream failure, malformed body, anything else
    Internal(String),
}

impl ApiError {
    pub fn unauthorized() -> Self {
        ApiError::Unauthorized
    }

    pub fn validation_failed(details: Value) -> Self {
        ApiError::ValidationFailed { details }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        ApiError::Internal(detail.into())
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Unauthorized => 401,
            ApiError::ValidationFailed { .. } => 400,
            ApiError::Internal(_) => 500,
        }
    }

    /// Convert to JSON response body. Client-facing messages only; the
    /// `Internal` detail string stays out of the payload.
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::Unauthorized => json!({ "error": "No autorizado" }),
            ApiError::ValidationFailed { details } => json!({
                "error": "Datos inválidos",
                "details": details,
            }),
            ApiError::Internal(_) => json!({ "error": "Error interno del servidor" }),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Unauthorized => write!(f, "unauthorized"),
            ApiError::ValidationFailed { .. } => write!(f, "validation failed"),
            ApiError::Internal(detail) => write!(f, "internal error: {}", detail),
        }
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
