//! Operator tool: import a local CSV or XLSX listing export straight
//! into the database, bypassing the upload endpoints.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use elbtal_backend::config::Config;
use elbtal_backend::import::insert::run_import;
use elbtal_backend::import::row::{rows_from_csv, rows_from_xlsx_workbook};
use elbtal_backend::store::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .context("usage: import-file <listing-export.csv|.xlsx>")?;

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    info!("📦 Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.max_db_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let extension = Path::new(&path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    info!("📥 Reading {}", path);
    let outcomes = match extension.as_str() {
        "csv" => {
            let text = fs::read_to_string(&path).with_context(|| format!("Failed to read {path}"))?;
            rows_from_csv(&text)
        }
        "xlsx" => {
            let bytes = fs::read(&path).with_context(|| format!("Failed to read {path}"))?;
            rows_from_xlsx_workbook(&bytes)?
        }
        other => bail!("unsupported file type: {other:?} (expected .csv or .xlsx)"),
    };

    let store = PgStore::new(pool);
    let summary = run_import(&store, outcomes).await;

    info!("✅ {}", summary.message);
    for error in &summary.errors {
        warn!("{}", error);
    }
    if !summary.errors.is_empty() {
        bail!("{} rows failed", summary.errors.len());
    }

    Ok(())
}
