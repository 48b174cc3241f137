//! crs-web - Crop Recommendation Service
//!
//! Loads the trained scalers and classifier, then serves the registration,
//! login and prediction pages. The listener is only bound once every artifact
//! has loaded.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crs_common::config::{ConfigSource, LoggingConfig, ServiceConfig};
use crs_common::Artifacts;
use crs_web::recommend::Recommender;
use crs_web::{build_router, AppState};
use tokio::signal;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// How often idle sessions are swept
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Command-line arguments for crs-web
#[derive(Parser, Debug)]
#[command(name = "crs-web")]
#[command(about = "Crop Recommendation Service")]
#[command(version)]
struct Args {
    /// Config file (overrides CRS_CONFIG and the platform default)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "CRS_PORT")]
    port: Option<u16>,

    /// Directory holding the trained artifacts (overrides the config file)
    #[arg(short, long, env = "CRS_ARTIFACTS_DIR")]
    artifacts_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config comes first: it decides the log level and destination.
    // Nothing is logged until tracing is initialized below.
    let (mut config, source) =
        ServiceConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(dir) = args.artifacts_dir {
        config.artifacts_dir = dir;
    }

    init_tracing(&config.logging)?;

    info!(
        "Starting Crop Recommendation Service (crs-web) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match &source {
        ConfigSource::File(_) => info!("Configuration: {}", source),
        ConfigSource::Defaults(_) => warn!("Configuration: {}", source),
    }

    // A missing or corrupt artifact is fatal
    let artifacts = match Artifacts::load(&config.artifacts_dir) {
        Ok(artifacts) => artifacts,
        Err(e) => {
            error!("Failed to load artifacts: {}", e);
            return Err(e).context("Cannot start without trained artifacts");
        }
    };
    let (pipeline, model) = artifacts.into_parts();
    let recommender = Recommender::new(Arc::new(pipeline), Arc::new(model));

    let state = AppState::new(recommender, config.session_idle_timeout());
    spawn_session_purge(state.clone());

    let app = build_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// RUST_LOG wins over the configured level
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
    Ok(())
}

fn spawn_session_purge(state: AppState) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            let purged = state.sessions.purge_idle();
            if purged > 0 {
                debug!("Purged {} idle sessions ({} live)", purged, state.sessions.len());
            }
        }
    });
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
