/// Custody Backend Mock Server
///
/// Serves a seeded in-memory custody backend for local console development.

use anyhow::{Context, Result};
use std::env;
use std::sync::Arc;

use backend_mock::{run_server, MockBackend};

#[derive(Debug)]
struct Config {
    server_host: String,
    server_port: u16,
}

impl Config {
    fn from_env() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let server_host = env::var("MOCK_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let server_port = env::var("MOCK_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .context("Invalid MOCK_PORT")?;

        Ok(Self {
            server_host,
            server_port,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting custody backend mock...");

    let config = Config::from_env().context("Failed to load configuration")?;
    log::info!(
        "Server will listen on {}:{}",
        config.server_host,
        config.server_port
    );

    let backend = Arc::new(MockBackend::seeded());

    run_server(backend, config.server_host, config.server_port)
        .await
        .context("Server error")?;

    Ok(())
}
