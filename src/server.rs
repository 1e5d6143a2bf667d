//! # Server Configuration
//!
//! Router assembly, shared state and the HTTP listener.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware::from_fn,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::chat::{ChatBackend, DisabledChat, GeminiClient, GeminiConfig};
use crate::config::AppConfig;
use crate::error::{ApiError, handle_panic};
use crate::handlers;
use crate::provisioning::{PostgresSchemaStore, SchemaStore, TableSchema};
use crate::registry::{DisabledRegistry, SupabaseRegistry, VendorRegistration, VendorRegistry};
use crate::telemetry::trace_id_middleware;

/// Application state containing shared resources.
///
/// Every collaborator sits behind a trait object so tests can swap in fakes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub schema_store: Arc<dyn SchemaStore>,
    pub registry: Arc<dyn VendorRegistry>,
    pub chat: Arc<dyn ChatBackend>,
}

impl AppState {
    /// Builds the production collaborators from configuration.
    pub fn from_config(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .danger_accept_invalid_certs(config.tls_accept_invalid_certs)
            .build()
            .context("failed to build HTTP client")?;

        let registry: Arc<dyn VendorRegistry> = match (
            config.supabase_url.as_deref(),
            config.supabase_service_role_key.clone(),
        ) {
            (Some(url), Some(key)) => Arc::new(SupabaseRegistry::new(
                http.clone(),
                url,
                key,
                &config.registry_table,
            )?),
            _ => {
                tracing::warn!("Supabase credentials not set; vendor registration is disabled");
                Arc::new(DisabledRegistry::new(
                    "VENDORKIT_SUPABASE_URL and VENDORKIT_SUPABASE_SERVICE_ROLE_KEY are required",
                ))
            }
        };

        let chat: Arc<dyn ChatBackend> = match config.gemini_api_key.clone() {
            Some(api_key) => Arc::new(GeminiClient::new(
                GeminiConfig {
                    api_key,
                    model: config.gemini_model.clone(),
                    api_base: config.gemini_api_base.clone(),
                },
                http,
            )),
            None => {
                tracing::warn!("Gemini API key not set; chat is disabled");
                Arc::new(DisabledChat::new("VENDORKIT_GEMINI_API_KEY is required"))
            }
        };

        Ok(Self {
            config: Arc::new(config),
            schema_store: Arc::new(PostgresSchemaStore::new(db)),
            registry,
            chat,
        })
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origin = config
        .cors_allowed_origin
        .parse::<HeaderValue>()
        .unwrap_or_else(|e| {
            tracing::error!(
                origin = %config.cors_allowed_origin,
                error = %e,
                "Invalid CORS origin; falling back to the default frontend origin"
            );
            HeaderValue::from_static("http://localhost:5173")
        });

    // Other origins get no Access-Control-Allow-Origin header.
    CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    let api = Router::new()
        .route("/chat", post(handlers::chat))
        .route("/health", get(handlers::health))
        .route("/deployTables", post(handlers::deploy_tables));

    Router::new()
        .nest("/api", api)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(from_fn(trace_id_middleware)),
        )
}

/// Starts the server with the given state
pub async fn run_server(state: AppState) -> anyhow::Result<()> {
    let addr = state
        .config
        .bind_addr()
        .with_context(|| format!("invalid server address '{}'", state.config.api_bind_addr))?;
    let profile = state.config.profile.clone();

    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::chat::chat,
        crate::handlers::health::health,
        crate::handlers::deploy::deploy_tables,
    ),
    components(
        schemas(
            crate::handlers::ChatRequest,
            crate::handlers::ChatResponse,
            crate::handlers::HealthResponse,
            crate::handlers::DeployTablesRequest,
            crate::handlers::DeployTablesResponse,
            TableSchema,
            VendorRegistration,
            ApiError,
        )
    ),
    tags(
        (name = "chat", description = "One-shot AI chat"),
        (name = "health", description = "Liveness"),
        (name = "provisioning", description = "Tenant table provisioning"),
    ),
    info(
        title = "Vendorkit API",
        description = "Per-tenant table provisioning and AI chat proxy",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
