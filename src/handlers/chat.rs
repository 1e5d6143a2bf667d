//! # Chat API Handler
//!
//! Relays a single message to the AI backend and returns its reply.

use axum::{
    extract::{State, rejection::JsonRejection},
    response::Json,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::server::AppState;

/// Chat request body
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ChatRequest {
    #[schema(example = "Suggest tables for a bookshop")]
    pub message: Option<String>,
    /// Accepted for client compatibility; not forwarded.
    pub context: Option<serde_json::Value>,
}

/// Chat response body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    pub response: String,
}

/// Send one message to the AI backend
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "AI reply", body = ChatResponse),
        (status = 400, description = "No message provided", body = ApiError),
        (status = 500, description = "AI backend failure", body = ApiError)
    ),
    tag = "chat"
)]
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;

    let message = match request.message {
        Some(message) if !message.is_empty() => message,
        _ => return Err(ApiError::bad_request("No message provided")),
    };

    let reply = state.chat.send_message(&message).await.inspect_err(|_| {
        counter!("chat_requests_total", "outcome" => "error").increment(1);
    })?;

    counter!("chat_requests_total", "outcome" => "ok").increment(1);
    Ok(Json(ChatResponse { response: reply }))
}
