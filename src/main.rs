use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use hub_api::app::{self, AppState};
use hub_api::auth::{PgCredentialStore, TokenService};
use hub_api::bootstrap::ReadinessOrchestrator;
use hub_api::config::AppConfig;
use hub_api::database::{self, PgSchemaProvider};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Configuration problems halt boot in every environment
    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!("Starting Hub API in {:?} mode", config.environment);

    let tokens = TokenService::new(config.security.token.clone()).context("invalid token settings")?;

    let pool = database::connect_lazy(&config.database).context("failed to configure database pool")?;
    let url = config.database.url.clone().unwrap_or_default();
    let schema = PgSchemaProvider::new(pool.clone(), url);

    // Runs to completion before the listener exists
    let report = ReadinessOrchestrator::new(&schema, config.readiness_policy())
        .run()
        .await
        .into_result()
        .context("schema readiness failed; refusing to start")?;
    tracing::info!("Schema readiness: {}", report.state.as_str());

    let state = AppState {
        tokens: Arc::new(tokens),
        credentials: Arc::new(PgCredentialStore::new(pool.clone())),
        readiness: report.state,
        pool: Some(pool),
    };
    let app = app::router(state, &config.security.cors_origins);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Hub API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
