//! inward-gate - warehouse inward register service
//!
//! Serves the entry register over HTTP with live snapshots via SSE, and
//! mirrors new entries to an external tabular endpoint when one is configured.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use inward_common::config::load_toml_config_or_default;
use inward_gate::config::{Args, GateConfig};
use inward_gate::services::{seed_on_first_snapshot, HttpMirror, MirrorSink};
use inward_gate::{build_router, db, AppState};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inward_gate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting inward-gate v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let toml = load_toml_config_or_default(args.config.as_deref());
    let config = GateConfig::resolve(args, toml).context("Invalid configuration")?;

    let db_path = config.database_path();
    info!("Namespace: {}", config.namespace);
    info!("Database path: {}", db_path.display());

    let pool = match db::init_database(&db_path).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    let mirror: Option<Arc<dyn MirrorSink>> = match &config.mirror_url {
        Some(url) => {
            let mirror = HttpMirror::new(url.clone(), config.mirror_timeout)
                .context("Failed to build mirror client")?;
            info!(
                "Mirror export enabled: {} (timeout {:?})",
                mirror.url(),
                config.mirror_timeout
            );
            Some(Arc::new(mirror) as Arc<dyn MirrorSink>)
        }
        None => {
            warn!("No mirror URL configured; mirror export disabled");
            None
        }
    };

    let state = AppState::new(
        pool.clone(),
        config.event_capacity,
        config.sync_status_capacity,
        config.qc_policy,
        mirror,
    )
    .await
    .context("Failed to initialize services")?;
    info!("QC policy: {:?}", config.qc_policy);

    let report = seed_on_first_snapshot(&pool, &state.fanout)
        .await
        .context("Failed to seed default data")?;
    if report.master_data || report.users {
        info!(
            master_data = report.master_data,
            users = report.users,
            "Default data seeded"
        );
    }

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    info!("inward-gate listening on http://{}", config.bind_addr);
    info!("Health check: http://{}/health", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
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
