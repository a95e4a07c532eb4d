//! Tiercache - a two-tier cache server with predictive warmup
//!
//! Serves the tiered cache over HTTP and runs its maintenance loops.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiercache::api::{create_router, AppState};
use tiercache::remote::{InMemoryRemote, RemoteStore};
use tiercache::tasks::{spawn_maintenance, MaintenanceHandle};
use tiercache::{Config, TieredCache};

/// Main entry point for the tiercache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Connect the remote tier (Redis, or in-process when unconfigured)
/// 4. Build the tiered cache and start its maintenance loops
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tiercache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tiercache server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_entries={}, local_ttl={}s, default_ttl={}s, remote_timeout={}ms, port={}",
        config.max_entries,
        config.local_ttl,
        config.default_ttl,
        config.remote_timeout_ms,
        config.server_port
    );

    let remote = connect_remote(&config).await;
    let cache = Arc::new(TieredCache::new(&config, remote));
    info!("Tiered cache initialized");

    let maintenance = spawn_maintenance(cache.clone(), &config);
    info!("Maintenance tasks started");

    let app = create_router(AppState::from_config(cache, &config));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(maintenance))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Picks the remote tier. A Redis that can't be reached at startup is not
/// fatal; the server runs against an in-process store instead.
#[cfg(feature = "redis")]
async fn connect_remote(config: &Config) -> Arc<dyn RemoteStore> {
    use tiercache::remote::RedisRemote;

    match config.redis_url.as_deref() {
        Some(url) => match RedisRemote::connect(url).await {
            Ok(remote) => {
                info!("Connected to Redis remote tier");
                Arc::new(remote)
            }
            Err(e) => {
                warn!(error = %e, "Redis unavailable, using in-process remote tier");
                Arc::new(InMemoryRemote::new())
            }
        },
        None => {
            info!("REDIS_URL not set, using in-process remote tier");
            Arc::new(InMemoryRemote::new())
        }
    }
}

#[cfg(not(feature = "redis"))]
async fn connect_remote(config: &Config) -> Arc<dyn RemoteStore> {
    if config.redis_url.is_some() {
        warn!("REDIS_URL set but built without the redis feature");
    }
    Arc::new(InMemoryRemote::new())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the
/// maintenance loops.
async fn shutdown_signal(maintenance: MaintenanceHandle) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    maintenance.shutdown().await;
}
