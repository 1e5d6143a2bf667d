//! # Table Deployment Handler
//!
//! Provisions a tenant's tables from a declarative schema and records the
//! tenant in the vendor registry.

use axum::{
    extract::{State, rejection::JsonRejection},
    response::Json,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::provisioning::{TableSchema, provision_tables};
use crate::registry::VendorRegistration;
use crate::server::AppState;

const INVALID_INPUT: &str = "Invalid data: slug, schema.tables and user_id are required";

/// Deployment request body.
///
/// Fields are optional at the wire level so missing values produce a
/// uniform 400 instead of a deserialization error.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct DeployTablesRequest {
    #[schema(example = "acme_shop")]
    pub slug: Option<String>,
    /// `{ "tables": [ { "name": ..., "fields": [...] } ] }`
    #[schema(value_type = Option<TableSchema>)]
    pub schema: Option<serde_json::Value>,
    #[schema(example = "0b8c5d0e-3f7a-4a53-9d1e-6f1f3c1d2a10")]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeployTablesResponse {
    #[schema(example = "Tables created and vendor registered")]
    pub message: String,
    /// Number of tables in the submitted schema
    pub tables_created: usize,
}

struct ValidatedDeploy {
    slug: String,
    user_id: String,
    raw_schema: serde_json::Value,
    schema: TableSchema,
}

fn validate(request: DeployTablesRequest) -> Result<ValidatedDeploy, ApiError> {
    let slug = request.slug.filter(|s| !s.is_empty());
    let user_id = request.user_id.filter(|s| !s.is_empty());
    let raw_schema = request
        .schema
        .filter(|s| s.get("tables").is_some_and(serde_json::Value::is_array));

    let (Some(slug), Some(user_id), Some(raw_schema)) = (slug, user_id, raw_schema) else {
        return Err(ApiError::bad_request(INVALID_INPUT));
    };

    let schema = TableSchema::deserialize(&raw_schema)
        .map_err(|e| ApiError::bad_request(format!("Invalid schema: {e}")))?;

    Ok(ValidatedDeploy {
        slug,
        user_id,
        raw_schema,
        schema,
    })
}

/// Create prefixed tables and register the tenant
#[utoipa::path(
    post,
    path = "/api/deployTables",
    request_body = DeployTablesRequest,
    responses(
        (status = 200, description = "Tables created and vendor registered", body = DeployTablesResponse),
        (status = 400, description = "Missing slug, schema.tables or user_id, or colliding table names", body = ApiError),
        (status = 500, description = "Database or registry failure", body = ApiError)
    ),
    tag = "provisioning"
)]
pub async fn deploy_tables(
    State(state): State<AppState>,
    payload: Result<Json<DeployTablesRequest>, JsonRejection>,
) -> Result<Json<DeployTablesResponse>, ApiError> {
    let Json(request) = payload?;
    debug!(request = ?request, "deployTables request received");

    let deploy = validate(request)?;
    let tables_created = deploy.schema.tables.len();

    info!(slug = %deploy.slug, tables = tables_created, "Provisioning tables");
    let report = provision_tables(state.schema_store.as_ref(), &deploy.slug, &deploy.schema)
        .await
        .inspect_err(|_| {
            counter!("deploy_requests_total", "outcome" => "provisioning_error").increment(1);
        })?;
    info!(
        slug = %deploy.slug,
        created = report.tables_created.len(),
        skipped = report.tables_skipped.len(),
        constraints = report.constraints_created.len(),
        "Tables provisioned"
    );

    let registration = VendorRegistration {
        user_id: deploy.user_id,
        slug: deploy.slug.clone(),
        schema: deploy.raw_schema,
    };
    let stored = state.registry.register(registration).await.inspect_err(|_| {
        counter!("deploy_requests_total", "outcome" => "registry_error").increment(1);
    })?;
    debug!(slug = %deploy.slug, row = %stored, "Vendor registered");

    counter!("deploy_requests_total", "outcome" => "ok").increment(1);
    Ok(Json(DeployTablesResponse {
        message: "Tables created and vendor registered".to_string(),
        tables_created,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    fn request(value: serde_json::Value) -> DeployTablesRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_missing_fields_rejected() {
        for body in [
            json!({}),
            json!({ "slug": "acme", "user_id": "u1" }),
            json!({ "slug": "", "user_id": "u1", "schema": { "tables": [] } }),
            json!({ "slug": "acme", "schema": { "tables": [] } }),
            json!({ "slug": "acme", "user_id": "u1", "schema": {} }),
        ] {
            let err = validate(request(body)).err().unwrap();
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
            assert_eq!(&*err.message, INVALID_INPUT);
        }
    }

    #[test]
    fn test_tables_must_be_list() {
        let err = validate(request(json!({
            "slug": "acme",
            "user_id": "u1",
            "schema": { "tables": "orders" }
        })))
        .err()
        .unwrap();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_table_without_name_is_bad_request() {
        let err = validate(request(json!({
            "slug": "acme",
            "user_id": "u1",
            "schema": { "tables": [{ "fields": [] }] }
        })))
        .err()
        .unwrap();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.starts_with("Invalid schema"));
    }

    #[test]
    fn test_valid_request_keeps_raw_schema() {
        let raw = json!({ "tables": [{ "name": "orders", "fields": [], "ui": { "color": "red" } }] });
        let deploy = validate(request(json!({
            "slug": "acme",
            "user_id": "u1",
            "schema": raw.clone()
        })))
        .ok()
        .unwrap();
        assert_eq!(deploy.schema.tables.len(), 1);
        assert_eq!(deploy.raw_schema, raw);
    }
}
