use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use elbtal_backend::config::Config;
use elbtal_backend::http::{router, AppState};
use elbtal_backend::store::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("🏠 Starting Elbtal import API server...");

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    info!("📦 Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.max_db_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    info!("✅ Database connected");

    let state = AppState {
        store: Arc::new(PgStore::new(pool)),
    };
    let app = router(state);

    info!("🚀 Server running on http://{}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
