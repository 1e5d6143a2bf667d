//! # Error Handling
//!
//! Unified JSON error responses for the API. Every error body carries an
//! `error` message, a machine-readable `code` and the request trace ID.

use std::any::Any;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::chat::ChatError;
use crate::provisioning::ProvisioningError;
use crate::registry::RegistryError;
use crate::telemetry;

/// Unified API error response structure
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiError {
    #[serde(skip_serializing, skip_deserializing)]
    pub status: StatusCode,
    /// Human-readable error message
    #[serde(rename = "error")]
    pub message: Box<str>,
    /// Error code for programmatic handling
    pub code: Box<str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Box<serde_json::Value>>,
    /// Correlation trace ID, matches the `X-Trace-Id` response header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<Box<str>>,
}

impl ApiError {
    pub fn new<C: Into<String>, M: Into<String>>(status: StatusCode, code: C, message: M) -> Self {
        Self {
            status,
            code: code.into().into_boxed_str(),
            message: message.into().into_boxed_str(),
            details: None,
            trace_id: telemetry::current_trace_id().map(String::into_boxed_str),
        }
    }

    pub fn with_details<V: Into<serde_json::Value>>(mut self, details: V) -> Self {
        self.details = Some(Box::new(details.into()));
        self
    }

    pub fn bad_request<M: Into<String>>(message: M) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            message,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, axum::Json(self)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match rejection {
            JsonRejection::JsonDataError(err) => format!("Invalid JSON: {}", err.body_text()),
            JsonRejection::JsonSyntaxError(err) => {
                format!("JSON syntax error: {}", err.body_text())
            }
            JsonRejection::MissingJsonContentType(_) => {
                "Missing 'Content-Type: application/json' header".to_string()
            }
            _ => "Invalid request body".to_string(),
        };

        Self::bad_request(message)
    }
}

impl From<ProvisioningError> for ApiError {
    fn from(error: ProvisioningError) -> Self {
        if let ProvisioningError::Plan(plan) = &error {
            tracing::warn!(error = %plan, "Rejected schema with colliding identifiers");
            return Self::bad_request(format!("Invalid schema: {plan}"))
                .with_details(serde_json::json!({ "identifier": plan.identifier() }));
        }

        tracing::error!(error = %error, "Provisioning failed");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "PROVISIONING_FAILED",
            error.store_message(),
        )
    }
}

impl From<RegistryError> for ApiError {
    fn from(error: RegistryError) -> Self {
        tracing::error!(error = %error, "Vendor registration failed");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "REGISTRATION_FAILED",
            error.to_string(),
        )
    }
}

impl From<ChatError> for ApiError {
    fn from(error: ChatError) -> Self {
        tracing::error!(error = %error, "Chat request failed");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "AI_ERROR",
            format!("AI Error: {error}"),
        )
    }
}

/// Panic handler for `CatchPanicLayer`.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(panic = %detail, "Request handler panicked");
    ApiError::internal("Internal server error").into_response()
}
