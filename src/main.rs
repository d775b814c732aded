//! Dataops resource lock service.
//!
//! Exposes named, keyed resource locks over HTTP. Lock records live in a
//! key/value store (Redis in production) with a bounded lifetime, so a crashed
//! holder never leaks a lock for longer than the configured TTL.

mod background;
mod config;
mod error;
mod health;
mod http;
mod kv;
mod lock;
mod logging;
mod resource_lock;
mod response;
mod routes;
mod version;

use axum_server::Handle;
use clap::Parser;
use shadow_rs::shadow;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};

use crate::background::spawn_memory_pruner;
use crate::config::{Args, SHUTDOWN_GRACE_SECS, StoreBackend};
use crate::http::{build_cors_layer, build_trace_layer};
use crate::kv::{KeyValueStore, MemoryStore, RedisStore};
use crate::lock::{AcquireMode, ResourceLockManager};

shadow!(build);

/// Starts the lock service and blocks until shutdown.
#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let args = Args::parse();
    logging::init_logging(&args.log_filter);

    let store: Arc<dyn KeyValueStore> = match args.store {
        StoreBackend::Redis => {
            let redis = RedisStore::connect(&args.redis_settings())
                .await
                .map_err(|err| std::io::Error::other(err.to_string()))?;
            Arc::new(redis)
        }
        StoreBackend::Memory => {
            warn!("using in-process store; locks are not shared between instances");
            let memory = MemoryStore::new();
            spawn_memory_pruner(memory.clone());
            Arc::new(memory)
        }
    };

    let lock_settings = args.lock_settings();
    if lock_settings.acquire_mode == AcquireMode::SetIfAbsent {
        info!("lock acquisition uses atomic SET NX");
    }
    let locks = Arc::new(ResourceLockManager::new(store, lock_settings));

    let mut app = routes::build_router(locks).layer(build_trace_layer());
    if let Some(cors_layer) = build_cors_layer(args.cors_origins.as_deref()) {
        app = app.layer(cors_layer);
    }

    let host = args
        .host
        .parse::<IpAddr>()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err.to_string()))?;
    let addr = SocketAddr::new(host, args.port);
    let handle = Handle::new();

    info!(
        ttl_secs = lock_settings.ttl.as_secs(),
        store = ?args.store,
        "starting HTTP server at {}",
        addr
    );

    let server = axum_server::bind(addr)
        .handle(handle.clone())
        .serve(app.into_make_service_with_connect_info::<SocketAddr>());

    tokio::select! {
        result = server => result?,
        _ = shutdown_signal(handle) => {}
    }

    Ok(())
}

async fn shutdown_signal(handle: Handle) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received termination signal shutting down");
    handle.graceful_shutdown(Some(Duration::from_secs(SHUTDOWN_GRACE_SECS)));
}
