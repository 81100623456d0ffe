//! Pod lifetime watchdog.
//!
//! Periodically terminates pods that exceed their maximum lifetime, with
//! health and Prometheus metrics endpoints for operators.

use anyhow::{Context, Result};
use clap::Parser;
use prometheus::Registry;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use watchdog::config::{LoggingConfig, Settings};
use watchdog::kubernetes::KubePodApi;
use watchdog::monitoring::{MonitorScheduler, PodMonitor, WatchdogMetrics};
use watchdog::server;

/// Kubernetes pod lifetime watchdog
#[derive(Parser)]
#[command(name = "watchdog")]
#[command(about = "Terminates pods that exceed their maximum lifetime")]
#[command(version)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, default_value = "config.yaml", env = "WATCHDOG_CONFIG")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;
    init_tracing(&settings.logging);

    info!(
        namespaces = ?settings.watchdog.namespaces,
        interval_secs = settings.watchdog.schedule_interval_secs,
        max_lifetime_secs = settings.watchdog.max_pod_lifetime_secs,
        dry_run = settings.watchdog.dry_run,
        "starting watchdog"
    );

    let client = kube::Client::try_default()
        .await
        .context("failed to create Kubernetes client")?;

    let registry = Arc::new(Registry::new());
    let metrics = Arc::new(WatchdogMetrics::new(&registry));

    let monitor = PodMonitor::new(
        Arc::new(KubePodApi::new(client)),
        Arc::new(settings.watchdog.clone()),
        metrics,
    );
    let mut scheduler = MonitorScheduler::new(monitor, settings.watchdog.schedule_interval());
    scheduler.start();

    let shutdown = CancellationToken::new();
    let server_handle = tokio::spawn({
        let registry = Arc::clone(&registry);
        let shutdown = shutdown.clone();
        let addr = settings.server.addr.clone();
        async move { server::run_server(&addr, registry, shutdown).await }
    });

    shutdown_signal().await;
    info!("shutdown signal received");

    // Stop scheduling new cycles first, then let an in-flight cycle finish
    // before taking down the HTTP endpoints.
    scheduler.shutdown();
    scheduler.join().await;
    shutdown.cancel();
    server_handle
        .await
        .context("HTTP server task panicked")??;

    info!("watchdog stopped");
    Ok(())
}

fn init_tracing(config: &LoggingConfig) {
    // Unknown levels fall back to info.
    let level = match config.level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => config.level.to_lowercase(),
        _ => "info".to_string(),
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if config.mode == "development" {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install SIGINT handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => tracing::error!(error = %err, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
