//! Folio server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use folio_core::config::AppConfig;
use folio_server::{AppState, create_router};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Folio - gated access to uploaded PDF documents
#[derive(Parser, Debug)]
#[command(name = "folio-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "FOLIO_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

/// Load configuration from the optional TOML file, then `FOLIO_` variables.
fn load_config(path: &str) -> Result<AppConfig> {
    let mut figment = Figment::new();

    if std::path::Path::new(path).exists() {
        tracing::info!(config_path = %path, "Loading configuration from file");
        figment = figment.merge(Toml::file(path));
    } else {
        tracing::info!(
            config_path = %path,
            "No config file found, using defaults and environment"
        );
    }

    figment
        .merge(Env::prefixed("FOLIO_").ignore(&["CONFIG"]).split("__"))
        .extract()
        .context("failed to load configuration")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Folio v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args.config)?;
    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;

    let state = AppState::from_config(config)?;
    tracing::info!(
        ttl_secs = state.config.tokens.ttl_secs,
        freshness_secs = state.config.derivatives.freshness_secs,
        "Stores initialized"
    );

    let sweepers = state.start_sweepers();
    tracing::info!(count = sweepers.len(), "Sweepers started");

    let app = create_router(state);

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    for sweeper in sweepers {
        let name = sweeper.name();
        sweeper.stop().await;
        tracing::debug!(store = name, "Sweeper stopped");
    }

    served.context("server error")?;
    tracing::info!("Server stopped");
    Ok(())
}
