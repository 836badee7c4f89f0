//! Failover orchestrator daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!   health probe ──samples──▶ ┌──────────────────────────────────────────────┐
//!                             │              FailoverOrchestrator             │
//!   owning subsystems ──ops─▶ │  registry · buffer · event log · metrics      │
//!           ▲                 │  state derivation · monitor loop              │
//!           │ replay          └───────┬──────────────────────┬────────────────┘
//!           └─────────────────────────┘                      │ events
//!                                                            ▼
//!                                              ┌───────────────────────────┐
//!                                              │ observers: audit log,     │
//!                                              │ WebSocket dashboard feed  │
//!                                              └───────────────────────────┘
//!   operator ──failover-cli──▶ admin API (axum) ──▶ queries / manual controls
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use failover_orchestrator::admin::{setup_admin_router, AdminState};
use failover_orchestrator::config::loader::load_config;
use failover_orchestrator::config::OrchestratorConfig;
use failover_orchestrator::failover::{BroadcastObserver, FailoverOrchestrator, TracingObserver};
use failover_orchestrator::observability::{logging, metrics};
use failover_orchestrator::Shutdown;

#[derive(Parser)]
#[command(name = "failover-orchestrator")]
#[command(about = "Dependency failover orchestrator", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => OrchestratorConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("failover-orchestrator v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        config_path = ?args.config,
        mode = ?config.failover.mode,
        categories = config.categories.len(),
        monitor_interval_secs = config.failover.monitor_interval_secs,
        notification_channels = ?config.failover.notification_channels,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let orchestrator = FailoverOrchestrator::new(&config);
    let broadcaster = BroadcastObserver::new(256);
    orchestrator.register_observer(Arc::new(TracingObserver));
    orchestrator.register_observer(Arc::new(broadcaster.clone()));
    orchestrator.start();

    let shutdown = Shutdown::new();

    let admin_task = if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        tracing::info!(address = %listener.local_addr()?, "Admin API listening");

        let state = AdminState::new(orchestrator.clone(), config.admin.api_key.clone(), broadcaster.sender());
        let router = setup_admin_router(state, Duration::from_secs(config.admin.request_timeout_secs));
        let server_shutdown = shutdown.clone();

        Some(tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move { server_shutdown.wait().await })
                .await
        }))
    } else {
        None
    };

    shutdown.listen_for_signals().await;

    if let Some(task) = admin_task {
        match task.await {
            Ok(Err(e)) => tracing::error!(error = %e, "Admin server error"),
            Err(e) => tracing::error!(error = %e, "Admin server task failed"),
            Ok(Ok(())) => tracing::info!("Admin server stopped"),
        }
    }

    orchestrator.stop().await;

    let status = orchestrator.status();
    tracing::info!(
        state = ?status.state,
        active = status.active_fallbacks.len(),
        buffered = status.buffered_operations,
        "Shutdown complete"
    );
    Ok(())
}
