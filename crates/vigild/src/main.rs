//! vigild — the Vigil daemon.
//!
//! Single binary that assembles the Vigil subsystems:
//! - Target registry (loaded from and dumped to a JSON snapshot)
//! - Probe scheduler + worker pool
//! - REST API (plain HTTP or TLS)
//!
//! # Usage
//!
//! ```text
//! vigild --bind 127.0.0.1:8080 --check-frequency 3s --workers 10
//! vigild --run-ssl --ssl-cert cert.pem --ssl-key key.pem
//! ```

mod config;
mod lifecycle;
mod server;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use vigil_api::{ApiState, build_router};
use vigil_health::{Prober, Scheduler};
use vigil_registry::Registry;

use crate::config::{Cli, DaemonConfig};
use crate::lifecycle::{SCHEDULER_STOP_BUDGET, SERVER_DRAIN_BUDGET, stop_and_dump};

const DEFAULT_LOG_FILTER: &str =
    "info,vigild=debug,vigil_health=debug,vigil_api=debug,vigil_registry=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();
    let config = DaemonConfig::from_cli(&cli)?;
    run(config).await
}

async fn run(config: DaemonConfig) -> anyhow::Result<()> {
    info!(config = %config.describe(), "vigil daemon starting");

    // ── Initialize subsystems ──────────────────────────────────

    let registry = Registry::open(&config.data_file);
    info!(targets = registry.len(), path = %config.data_file.display(), "registry ready");

    let prober = Prober::new(config.probe_timeout)?;

    let tls = match &config.tls {
        Some(tls) => Some(server::load_tls_config(&tls.cert, &tls.key)?),
        None => None,
    };
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    let mut scheduler = Scheduler::start(
        registry.clone(),
        prober.clone(),
        config.scheduler_config(),
    );

    // ── Start API server ───────────────────────────────────────

    let router = build_router(ApiState {
        registry: registry.clone(),
        prober,
    });
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut server = tokio::spawn(server::serve(listener, router, tls, shutdown_rx));

    // ── Wait for a signal (or an early server exit) ────────────

    let early_exit = tokio::select! {
        signal = shutdown_signal() => {
            info!(signal, "shutdown signal received");
            None
        }
        joined = &mut server => {
            warn!("API server exited unexpectedly");
            Some(joined)
        }
    };

    // ── Shutdown ───────────────────────────────────────────────

    stop_and_dump(
        &mut scheduler,
        &registry,
        &config.data_file,
        SCHEDULER_STOP_BUDGET,
    )
    .await;

    let _ = shutdown_tx.send(true);
    let joined = match early_exit {
        Some(joined) => joined,
        None => match tokio::time::timeout(SERVER_DRAIN_BUDGET, server).await {
            Ok(joined) => joined,
            Err(_) => {
                error!(budget = ?SERVER_DRAIN_BUDGET, "API server drain timed out, exiting");
                return Ok(());
            }
        },
    };
    joined.context("API server task failed")??;

    info!("vigil daemon stopped");
    Ok(())
}

/// Resolve on SIGINT, SIGTERM, or SIGHUP. Returns the signal name.
async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(e) => {
                error!(error = %e, "failed to install SIGINT handler");
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = unix_signal(tokio::signal::unix::SignalKind::terminate(), "SIGTERM");
    #[cfg(unix)]
    let hangup = unix_signal(tokio::signal::unix::SignalKind::hangup(), "SIGHUP");
    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();
    #[cfg(not(unix))]
    let hangup = std::future::pending::<&'static str>();

    tokio::select! {
        name = ctrl_c => name,
        name = terminate => name,
        name = hangup => name,
    }
}

#[cfg(unix)]
async fn unix_signal(kind: tokio::signal::unix::SignalKind, name: &'static str) -> &'static str {
    match tokio::signal::unix::signal(kind) {
        Ok(mut stream) => {
            stream.recv().await;
            name
        }
        Err(e) => {
            error!(error = %e, signal = name, "failed to install signal handler");
            std::future::pending().await
        }
    }
}
