use anyhow::{Context, Result};
use clap::Parser;
use dhwani_core::{ArtifactStore, Config, SynthesisService};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use dhwani_server::{create_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "dhwani")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "dhwani - supervised TTS synthesis over HTTP")]
struct Args {
    /// Path to a TOML config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Listen address override, e.g. 127.0.0.1:8080
    #[arg(long, value_name = "ADDR")]
    listen: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;
    let addr = match args.listen {
        Some(addr) => addr,
        None => format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .with_context(|| {
                format!(
                    "Invalid listen address {}:{}",
                    config.server.host, config.server.port
                )
            })?,
    };

    info!(version = env!("CARGO_PKG_VERSION"), "Starting dhwani server");

    let service = SynthesisService::new(&config)?;
    if service.checker().root_present() {
        info!(root = ?config.worker.model_root, "Model root found");
    } else {
        warn!(root = ?config.worker.model_root, "Model root not found - models need to be installed");
    }

    let sweeper = spawn_sweeper(service.store().clone(), config.artifact_ttl());

    let state = AppState::new(config, service);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    info!("Server shutdown complete");
    Ok(())
}

/// Periodic artifact garbage collection. Old files are removed on a TTL
/// regardless of which job produced them; the period is well under the TTL
/// so expired files do not pile up.
fn spawn_sweeper(store: Arc<ArtifactStore>, ttl: Duration) -> tokio::task::JoinHandle<()> {
    let period = (ttl / 4).max(Duration::from_secs(60));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            match store.sweep(ttl) {
                Ok(0) => {}
                Ok(deleted) => info!(deleted, "Swept expired artifacts"),
                Err(e) => warn!(error = ?e, "Artifact sweep failed"),
            }
        }
    })
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        }
    }
}

fn setup_tracing() {
    use tracing_subscriber::fmt;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}
