use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    #[serde(default)]
    pub password: String,
}

/// POST /api/auth
pub async fn handle_auth(
    State(state): State<AppState>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = payload?;

    let expected = state
        .config
        .handenheit_password
        .as_deref()
        .ok_or_else(|| AppError::NotConfigured("Authentication not configured".to_string()))?;

    if request.password != expected {
        warn!("Rejected login attempt");
        return Err(AppError::Unauthorized("Invalid password".to_string()));
    }

    Ok(Json(json!({ "success": true })))
}
