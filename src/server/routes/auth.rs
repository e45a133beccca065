use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::AUTHORIZATION, HeaderMap},
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use crate::auth::Credentials;
use crate::server::error::AppError;
use crate::server::state::SharedState;

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn missing_token() -> AppError {
    AppError::Unauthorized("Missing bearer token".to_string())
}

/// POST /api/auth/login
pub async fn login_handler(
    State(state): State<SharedState>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(credentials) = body?;

    let Some(user) = state.users.authenticate(&credentials).await? else {
        return Err(AppError::Unauthorized("Invalid username or password".to_string()));
    };

    state.sessions.purge_expired();
    let session = state.sessions.issue(user);
    info!(username = %session.user.username, "signed in");

    Ok(Json(json!({
        "token": session.token,
        "expires_at": session.expires_at,
        "user": session.user,
    })))
}

/// POST /api/auth/logout
pub async fn logout_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let token = bearer_token(&headers).ok_or_else(missing_token)?;
    let revoked = state.sessions.revoke(token);
    Ok(Json(json!({ "success": true, "revoked": revoked })))
}

/// GET /api/auth/session
pub async fn session_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let token = bearer_token(&headers).ok_or_else(missing_token)?;
    let session = state
        .sessions
        .resolve(token)
        .ok_or_else(|| AppError::Unauthorized("Session expired or unknown".to_string()))?;

    Ok(Json(json!({
        "user": session.user,
        "expires_at": session.expires_at,
    })))
}
