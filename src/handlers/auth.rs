use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::{Form, Json};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Credentials, TokenResponse};
use crate::services::auth;
use crate::state::AppState;

/// The caller behind a verified bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn verify_bearer(state: &AppState, token: &str) -> Result<AuthUser, AppError> {
    let claims = auth::verify_token(&state.config.secret_key, token).map_err(|e| {
        tracing::debug!(error = %e, "rejected bearer token");
        AppError::Unauthorized("Could not validate credentials".to_string())
    })?;

    let user = {
        let conn = state.conn()?;
        queries::get_user_by_username(&conn, &claims.sub)?
    };

    match user {
        Some(u) if u.id == claims.uid => Ok(AuthUser {
            id: u.id,
            username: u.username,
        }),
        _ => Err(AppError::Unauthorized(
            "Could not validate credentials".to_string(),
        )),
    }
}

/// Requires a valid bearer token.
pub fn require_user(state: &AppState, headers: &HeaderMap) -> Result<AuthUser, AppError> {
    let token = bearer_token(headers)
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?;
    verify_bearer(state, token)
}

/// No token means an anonymous caller; a token that is present must be valid.
pub fn optional_user(state: &AppState, headers: &HeaderMap) -> Result<Option<AuthUser>, AppError> {
    bearer_token(headers)
        .map(|token| verify_bearer(state, token))
        .transpose()
}

// POST /signup
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Credentials>,
) -> Result<Json<serde_json::Value>, AppError> {
    let username = body.username.trim();
    if username.is_empty() || body.password.is_empty() {
        return Err(AppError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    let hashed = auth::hash_password(&body.password)?;

    let conn = state.conn()?;
    if queries::get_user_by_username(&conn, username)?.is_some() {
        return Err(AppError::BadRequest("Username already registered".to_string()));
    }
    let user = queries::create_user(&conn, username, &hashed)?;
    tracing::info!(user_id = user.id, username = %user.username, "user signed up");

    Ok(Json(serde_json::json!({"msg": "User created successfully"})))
}

// POST /login (form-encoded)
pub async fn login(
    State(state): State<Arc<AppState>>,
    Form(form): Form<Credentials>,
) -> Result<Json<TokenResponse>, AppError> {
    let user = {
        let conn = state.conn()?;
        queries::get_user_by_username(&conn, form.username.trim())?
    };

    let user = match user {
        Some(u) if auth::verify_password(&form.password, &u.hashed_password) => u,
        _ => {
            tracing::info!(username = %form.username, "failed login attempt");
            return Err(AppError::Unauthorized(
                "Incorrect username or password".to_string(),
            ));
        }
    };

    let access_token = auth::issue_token(
        &state.config.secret_key,
        user.id,
        &user.username,
        state.config.access_token_expire_minutes,
    )?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}
