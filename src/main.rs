mod chaos;
mod config;
mod connector;
mod error;
mod journal;
mod metrics;
mod metrics_store;
mod sourcing;
mod web;

use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::sourcing::engine::SourcingEngine;
use crate::web::server::WebServer;

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "supplier_scope=info".into());

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load config
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "supplier-scope.toml".to_string());

    let config = Config::load(&config_path)?;
    init_tracing(config.log.json);

    info!("📦 supplier-scope v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Config loaded from {}", config_path);

    let config = Arc::new(config);
    if config.chaos.enabled {
        info!(
            "🎲 Chaos mode enabled (failure probability: {:.2})",
            config.chaos.failure_probability
        );
    }

    // Initialize engine (connectors, metrics store, journal)
    let engine = Arc::new(SourcingEngine::new(config.clone())?);

    let web = WebServer::new(engine, config.clone());
    web.run().await
}
