//! # Vendor Registry
//!
//! Records each successful provisioning call in a central registry table
//! hosted by the backend-as-a-service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub mod supabase;

pub use supabase::SupabaseRegistry;

/// Row inserted into the registry for one provisioned tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VendorRegistration {
    /// Owning user / tenant identifier
    pub user_id: String,
    pub slug: String,
    /// Schema document exactly as submitted
    pub schema: serde_json::Value,
}

/// Errors surfaced by a registry backend.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry rejected the row; carries the upstream message verbatim.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("registry returned no rows")]
    EmptyResponse,
    #[error("registry is not configured: {0}")]
    NotConfigured(String),
}

/// Insert-only access to the registry table.
#[async_trait]
pub trait VendorRegistry: Send + Sync {
    /// Inserts one registration and returns the stored row.
    async fn register(
        &self,
        registration: VendorRegistration,
    ) -> Result<serde_json::Value, RegistryError>;
}

/// Stand-in used when no registry credentials are configured; every insert
/// fails with [`RegistryError::NotConfigured`].
#[derive(Debug, Clone)]
pub struct DisabledRegistry {
    reason: String,
}

impl DisabledRegistry {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl VendorRegistry for DisabledRegistry {
    async fn register(
        &self,
        _registration: VendorRegistration,
    ) -> Result<serde_json::Value, RegistryError> {
        Err(RegistryError::NotConfigured(self.reason.clone()))
    }
}
