//! # API Handlers
//!
//! HTTP endpoint handlers mounted under `/api`.

pub mod chat;
pub mod deploy;
pub mod health;

pub use chat::{ChatRequest, ChatResponse, chat};
pub use deploy::{DeployTablesRequest, DeployTablesResponse, deploy_tables};
pub use health::{HealthResponse, health};
