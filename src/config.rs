//! Environment-based configuration

use anyhow::{Context, Result};
use std::net::SocketAddr;

pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_db_connections: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            bind_addr: std::env::var("BIND_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:3001".to_string())
                .parse()
                .context("BIND_ADDR must be a valid socket address")?,
            max_db_connections: std::env::var("MAX_DB_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("MAX_DB_CONNECTIONS must be a valid number")?,
        })
    }
}
