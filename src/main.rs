use anyhow::Context;

use omnia_api::config;
use omnia_api::database::PgTenantDirectory;
use omnia_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, MASTER_DATABASE_URL, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!("Starting Omnia API in {:?} mode", config.environment);

    // A missing DATABASE_URL stops the process here
    let state = AppState::from_config(config)?;

    if let Err(e) = PgTenantDirectory::new(state.master.clone()).bootstrap().await {
        tracing::warn!("Master tenant registry not bootstrapped: {}", e);
    }

    let app = router(state, &config.security);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Omnia API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
