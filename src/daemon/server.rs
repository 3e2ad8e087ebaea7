//! Control-plane HTTP server. Binds either a TCP address or a Unix domain
//! socket (selected by `BERTH_SOCKET`), never both.

use crate::daemon::{handlers, AppState};
use crate::env;
use crate::error::{BerthError, Result};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/status", get(handlers::status))
        .route("/api/v1/up", post(handlers::up))
        .route("/api/v1/down", post(handlers::down))
        .route("/api/v1/restart", post(handlers::restart))
        .route("/api/v1/upgrade", post(handlers::upgrade))
        .route("/api/v1/logs", get(handlers::logs))
        .route("/api/v1/version", get(handlers::version))
        .route("/api/v1/check", get(handlers::check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until the token fires; returns once the listener has drained.
pub async fn serve(state: Arc<AppState>, cancel: CancellationToken) -> Result<()> {
    let app = router(state);
    let shutdown = async move { cancel.cancelled().await };

    #[cfg(unix)]
    if let Some(socket_path) = env::socket_path() {
        // Remove a stale socket left by an unclean exit.
        if socket_path.exists() {
            std::fs::remove_file(&socket_path)?;
        }
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let listener = tokio::net::UnixListener::bind(&socket_path)
            .map_err(|e| BerthError::Other(format!("failed to bind unix socket: {e}")))?;

        // Co-located containers talk to the daemon over this socket.
        set_socket_permissions(&socket_path);

        info!("Starting API server on unix://{}", socket_path.display());
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        if let Err(e) = std::fs::remove_file(&socket_path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove socket file: {e}");
            }
        }
        return Ok(());
    }

    let addr = format!("{}:{}", env::bind_address(), env::daemon_port());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| BerthError::Other(format!("failed to bind {addr}: {e}")))?;

    info!("Starting API server on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

#[cfg(unix)]
fn set_socket_permissions(path: &std::path::Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o666)) {
        warn!("Failed to set socket permissions: {e}");
    }
}
