//! org-catalog-bff - Organization Catalog Aggregation Service
//!
//! A backend-for-frontend that fans out to the organization registry, the
//! national company registry, the SPARQL service and the metadata quality
//! service, and serves merged catalog summaries, per-organization catalogs
//! and entity reports over read-only HTTP endpoints.

mod aggregation;
mod cli;
mod config;
mod models;
mod server;
mod service;
mod sparql;
mod upstream;

use anyhow::{Context, Result};
use cli::Args;
use config::Config;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::FmtSubscriber;
use upstream::UpstreamClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Initialize logging
    init_logging(&args);

    info!("org-catalog-bff v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    // Load configuration and apply CLI/env overrides
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    run_server(config).await
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from org-catalog-bff.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

/// Build the gateway client and serve the API until shutdown.
async fn run_server(config: Config) -> Result<()> {
    let bind_address = config.bind_address();

    info!(
        "Upstream services: registry={} company={} sparql={} quality={}",
        config.upstream.organization_catalog_url,
        config.upstream.company_registry_url,
        config.upstream.sparql_url,
        config.upstream.metadata_quality_url,
    );

    let client = UpstreamClient::new(config.upstream)?;
    let router = server::build_router(Arc::new(client));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!("Listening on http://{}", bind_address);

    axum::serve(listener, router)
        .await
        .context("Server error")?;

    Ok(())
}
