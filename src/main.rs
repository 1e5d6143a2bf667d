//! # Vendorkit API Main Entry Point

use migration::{Migrator, MigratorTrait};
use vendorkit::{
    config::ConfigLoader,
    db::init_pool,
    server::{AppState, run_server},
    telemetry::init_tracing,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::new().load()?;
    init_tracing(&config)?;

    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "Effective configuration");
    }

    let db = init_pool(&config).await?;

    if config.auto_migrate {
        tracing::info!("Applying registry migrations");
        Migrator::up(&db, None).await?;
    }

    let state = AppState::from_config(config, db)?;
    run_server(state).await
}
