//! Supabase (PostgREST) implementation of [`VendorRegistry`].
//!
//! Inserts go through the REST interface with the service-role key, which
//! bypasses row-level security on the registry table.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error};
use url::Url;

use super::{RegistryError, VendorRegistration, VendorRegistry};

/// Admin client for the registry table.
#[derive(Clone)]
pub struct SupabaseRegistry {
    client: Client,
    table_url: Url,
    service_role_key: String,
}

impl std::fmt::Debug for SupabaseRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseRegistry")
            .field("table_url", &self.table_url.as_str())
            .field("service_role_key", &"[REDACTED]")
            .finish()
    }
}

impl SupabaseRegistry {
    /// Create a registry client for `table` on the project at `base_url`.
    pub fn new(
        client: Client,
        base_url: &str,
        service_role_key: String,
        table: &str,
    ) -> Result<Self, RegistryError> {
        let raw = format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table);
        let table_url = Url::parse(&raw)
            .map_err(|e| RegistryError::NotConfigured(format!("invalid Supabase URL '{raw}': {e}")))?;

        Ok(Self {
            client,
            table_url,
            service_role_key,
        })
    }

    pub fn table_url(&self) -> &Url {
        &self.table_url
    }
}

/// Pulls the human-readable message out of a PostgREST error body.
fn upstream_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl VendorRegistry for SupabaseRegistry {
    async fn register(
        &self,
        registration: VendorRegistration,
    ) -> Result<serde_json::Value, RegistryError> {
        debug!(slug = %registration.slug, url = %self.table_url, "Inserting vendor registration");

        let response = self
            .client
            .post(self.table_url.clone())
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .header("Prefer", "return=representation")
            .json(&[&registration])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = upstream_message(&body);
            error!(
                slug = %registration.slug,
                status = status.as_u16(),
                message = %message,
                "Registry insert rejected"
            );
            return Err(RegistryError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let rows: Vec<serde_json::Value> = response.json().await?;
        rows.into_iter().next().ok_or(RegistryError::EmptyResponse)
    }
}
