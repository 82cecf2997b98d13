use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use configs::{AppConfig, ServerConfig};
use service::storage::StorageManager;
use service::users::{StorageUserRepository, UserService};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<StorageManager>,
    pub users: UserService,
}

impl AppState {
    /// Wire the repositories against the manager's context, one per model.
    pub fn new(storage: Arc<StorageManager>) -> Self {
        let users = UserService::new(Arc::new(StorageUserRepository::new(&storage)));
        Self { storage, users }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

pub fn build_app(state: AppState) -> Router {
    routes::build_router(state, build_cors())
}

fn bind_addr(server: &ServerConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", server.host, server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address {}:{}: {e}", server.host, server.port)))
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl+C");
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
                warn!(error = %e, "cannot listen for SIGTERM");
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
    info!("shutdown signal received");
}

/// Serve `app` on `listener` until `shutdown` resolves, then dispose storage.
///
/// Storage is disposed even when serving fails so in-memory writes get flushed.
pub async fn serve<F>(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown: F,
) -> Result<(), StartupError>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let storage = Arc::clone(&state.storage);
    let served = axum::serve(listener, build_app(state)).with_graceful_shutdown(shutdown).await;

    let disposed = storage.dispose().await;
    if disposed.is_degraded() {
        warn!(status = disposed.label(), "storage was not flushed cleanly");
    }
    served.map_err(StartupError::from)
}

/// Public entry: initialize storage, serve HTTP until a shutdown signal.
pub async fn run(cfg: AppConfig) -> Result<(), StartupError> {
    let storage = Arc::new(StorageManager::from_config(&cfg));
    let status = storage.initialize().await;
    if status.is_degraded() {
        warn!(strategy = storage.context().strategy_name(), "starting with degraded storage");
    }
    let state = AppState::new(storage);

    let addr = bind_addr(&cfg.server)?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr: addr.to_string(), source })?;
    info!(%addr, storage = cfg.storage.source.as_str(), "starting user api");

    serve(listener, state, shutdown_signal()).await
}
