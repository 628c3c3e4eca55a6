use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use crate::errors::AppError;
use crate::handlers::auth::optional_user;
use crate::models::{ChatRequest, ChatResponse};
use crate::services::chat;
use crate::state::AppState;

// POST /chat
pub async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let user = optional_user(&state, &headers)?;

    let message = body.message.trim();
    if message.is_empty() {
        return Err(AppError::BadRequest("Message must not be empty".to_string()));
    }

    tracing::info!(
        user = user.as_ref().map(|u| u.username.as_str()).unwrap_or("anonymous"),
        "incoming chat message"
    );

    let response = chat::process_message(&state, user.map(|u| u.id), message).await;
    Ok(Json(ChatResponse { response }))
}
