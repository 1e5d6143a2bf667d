//! # Chat Proxy
//!
//! One-shot conversations with a generative-AI backend. Every call starts a
//! fresh conversation; no history is kept between requests.

use async_trait::async_trait;
use thiserror::Error;

pub mod gemini;

pub use gemini::{GeminiClient, GeminiConfig};

/// Errors from the AI backend.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    Network(#[from] reqwest::Error),
    #[error("{message}")]
    Upstream { status: u16, message: String },
    #[error("response contained no text")]
    EmptyResponse,
    #[error("response blocked: {0}")]
    Blocked(String),
    #[error("AI backend is not configured: {0}")]
    NotConfigured(String),
}

/// Send one message, get one text reply.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send_message(&self, message: &str) -> Result<String, ChatError>;
}

/// Stand-in used when no AI credentials are configured.
#[derive(Debug, Clone)]
pub struct DisabledChat {
    reason: String,
}

impl DisabledChat {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ChatBackend for DisabledChat {
    async fn send_message(&self, _message: &str) -> Result<String, ChatError> {
        Err(ChatError::NotConfigured(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_chat_reports_reason() {
        let chat = DisabledChat::new("VENDORKIT_GEMINI_API_KEY is not set");
        let err = chat.send_message("hi").await.unwrap_err();
        assert!(matches!(err, ChatError::NotConfigured(_)));
        assert!(err.to_string().contains("VENDORKIT_GEMINI_API_KEY"));
    }
}
