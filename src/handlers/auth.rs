use axum::{extract::State, http::HeaderMap, response::Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::handlers::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/login - Validate the injected admin credentials and issue a
/// session token.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    if !state.credentials.matches(&req.email, &req.password) {
        return Err(ApiError::unauthorized());
    }

    let user_id = Uuid::new_v4();
    let token = state.auth.issue_token(user_id, &req.email).map_err(|e| {
        tracing::error!(error = %e, "token issuance failed");
        ApiError::internal(e.to_string())
    })?;

    Ok(Json(json!({
        "token": token,
        "user": { "id": user_id, "email": req.email },
    })))
}

/// GET /auth/session - Echo the current session, or 401.
pub async fn session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    match state.auth.get_session(&headers) {
        Some(session) => Ok(Json(json!({
            "user_id": session.user_id,
            "email": session.email,
            "expires_at": session.expires_at,
        }))),
        None => Err(ApiError::unauthorized()),
    }
}
