//! # convoy — Binary Entry Point
//!
//! Parses flags and environment, opens the store, optionally seeds demo
//! drivers, and serves the API until SIGINT or SIGTERM.

use anyhow::Context;
use clap::Parser;
use convoy_api::config::Cli;
use convoy_api::state::{AppState, LogFormat};
use convoy_store::AnyStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse()
        .into_config()
        .context("invalid configuration")?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
    }
    tracing::info!(?config, "starting convoy");

    let store = AnyStore::open(config.database_url.as_deref())
        .await
        .context("failed to open the entity store")?;
    tracing::info!(backend = store.backend(), "store ready");

    let port = config.port;
    let seed = config.seed_demo_drivers;
    let state = AppState::with_store(store, config);

    if seed {
        convoy_api::seed::seed_demo_drivers(&state.dispatcher)
            .await
            .context("failed to register demo drivers")?;
    }

    let app = convoy_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("convoy listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("convoy stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received, draining connections");
}
