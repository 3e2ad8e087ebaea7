//! Control-plane route handlers.
//!
//! Mutating handlers (`up`, `down`, `restart`, `upgrade`) hold the
//! process-wide operation lock for their whole body and bound the work
//! with a per-operation timeout. Read-only routes never touch the lock,
//! so status and health polling stay responsive during a long install.

use crate::config::Config;
use crate::daemon::oplog::OpLog;
use crate::daemon::protocol::{ApiResponse, RestartRequest, UpRequest};
use crate::daemon::AppState;
use crate::error::{BerthError, Result};
use crate::installer::Installer;
use crate::report::Reporter;
use crate::updater::Updater;
use crate::runtime::LogOptions;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub const UP_TIMEOUT: Duration = Duration::from_secs(10 * 60);
pub const DOWN_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub const RESTART_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub const UPGRADE_TIMEOUT: Duration = Duration::from_secs(10 * 60);
pub const LOGS_TIMEOUT: Duration = Duration::from_secs(30);
pub const VERSION_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_LOG_LINES: usize = 100;
pub const MAX_LOG_LINES: usize = 10_000;

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn status(State(state): State<Arc<AppState>>) -> Response {
    match state.status().await {
        Ok(status) => Json(status).into_response(),
        Err(e) => respond(
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiResponse::failure_with_details("Failed to get status", e.to_string()),
        ),
    }
}

/// `POST /api/v1/up` — install if absent, otherwise start. The optional
/// JSON body overrides image tag, port, and feature toggles for a fresh
/// install; a malformed body falls back to defaults.
pub async fn up(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let _guard = state.op_lock.lock().await;
    let req: UpRequest = serde_json::from_slice(&body).unwrap_or_default();
    let oplog = OpLog::new();

    if state.paths.compose_file.exists() {
        oplog.info("Starting containers...");
        let start = state.runtime.up(&state.paths.compose_file);
        if let Err(e) = bounded(UP_TIMEOUT, start).await {
            oplog.error(&format!("Failed to start containers: {e}"));
            return failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to start containers", e, oplog);
        }
        oplog.success("Containers started");
        return respond(
            StatusCode::OK,
            ApiResponse::ok("Started successfully").with_logs(oplog.entries()),
        );
    }

    oplog.info("Not installed, running installation...");

    let mut config = Config::defaults(&state.paths);
    if let Some(tag) = req.image_tag {
        config.image_tag = tag;
    }
    if let Some(port) = req.port {
        config.port = port;
    }
    if let Some(enabled) = req.enable_inference_engine {
        config.enable_inference_engine = enabled;
    }
    if let Some(enabled) = req.enable_proxy_agent {
        config.enable_proxy_agent = enabled;
    }

    if let Err(e) = config.validate() {
        oplog.error(&format!("Invalid configuration: {e}"));
        return failure(StatusCode::BAD_REQUEST, "Invalid configuration", e, oplog);
    }

    let install = async {
        Installer::new(&config, &state.paths, state.runtime.as_ref(), &oplog)
            .install()
            .await
    };
    if let Err(e) = bounded(UP_TIMEOUT, install).await {
        oplog.error(&format!("Installation failed: {e}"));
        return failure(StatusCode::INTERNAL_SERVER_ERROR, "Installation failed", e, oplog);
    }

    refresh_shared(&state);
    respond(
        StatusCode::OK,
        ApiResponse::ok("Installed and started successfully").with_logs(oplog.entries()),
    )
}

/// `POST /api/v1/down` — stop containers, preserve data.
pub async fn down(State(state): State<Arc<AppState>>) -> Response {
    let _guard = state.op_lock.lock().await;
    let oplog = OpLog::new();
    oplog.info("Stopping containers...");

    let stop = state.runtime.down(&state.paths.compose_file, false);
    if let Err(e) = bounded(DOWN_TIMEOUT, stop).await {
        oplog.error(&format!("Failed to stop containers: {e}"));
        return failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to stop containers", e, oplog);
    }

    oplog.success("Containers stopped");
    respond(
        StatusCode::OK,
        ApiResponse::ok("Stopped successfully").with_logs(oplog.entries()),
    )
}

/// `POST /api/v1/restart` — restart one named service, or all.
pub async fn restart(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let _guard = state.op_lock.lock().await;
    let req: RestartRequest = serde_json::from_slice(&body).unwrap_or_default();
    let oplog = OpLog::new();

    match &req.service {
        Some(service) => oplog.info(&format!("Restarting service: {service}")),
        None => oplog.info("Restarting all services"),
    }

    let restart = state
        .runtime
        .restart(&state.paths.compose_file, req.service.as_deref());
    if let Err(e) = bounded(RESTART_TIMEOUT, restart).await {
        oplog.error(&format!("Failed to restart: {e}"));
        return failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to restart", e, oplog);
    }

    oplog.success("Restart completed");
    respond(
        StatusCode::OK,
        ApiResponse::ok("Service(s) restarted successfully").with_logs(oplog.entries()),
    )
}

/// `POST /api/v1/upgrade` — run the update workflow against the persisted
/// config, then refresh the daemon's in-memory copies.
pub async fn upgrade(State(state): State<Arc<AppState>>) -> Response {
    let _guard = state.op_lock.lock().await;
    let oplog = OpLog::new();
    oplog.info("Starting upgrade...");

    let mut config = match Config::load_or_default(&state.paths.config_file, &state.paths) {
        Ok(config) => config,
        Err(e) => {
            oplog.error(&format!("Failed to load config: {e}"));
            return failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load config", e, oplog);
        }
    };

    let update = async {
        Updater::new(
            &mut config,
            &state.paths,
            state.runtime.as_ref(),
            state.checker.as_ref(),
            &oplog,
        )
        .update()
        .await
    };
    if let Err(e) = bounded(UPGRADE_TIMEOUT, update).await {
        oplog.error(&format!("Upgrade failed: {e}"));
        return failure(StatusCode::INTERNAL_SERVER_ERROR, "Upgrade failed", e, oplog);
    }

    refresh_shared(&state);
    respond(
        StatusCode::OK,
        ApiResponse::ok("Upgrade completed successfully").with_logs(oplog.entries()),
    )
}

#[derive(Debug, Default, Deserialize)]
pub struct LogsParams {
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub lines: Option<usize>,
}

/// `GET /api/v1/logs` — captured log text in `data.logs`, bounded by a
/// line count.
pub async fn logs(State(state): State<Arc<AppState>>, Query(params): Query<LogsParams>) -> Response {
    let lines = params
        .lines
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_LOG_LINES)
        .min(MAX_LOG_LINES);
    let service = params.service.as_deref();

    let fetch = state.runtime.logs(
        &state.paths.compose_file,
        service,
        LogOptions { lines },
    );
    let text = match tokio::time::timeout(LOGS_TIMEOUT, fetch).await {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            return respond(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiResponse::failure_with_details("Failed to fetch logs", e.to_string()),
            )
        }
        Err(_) => {
            return respond(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiResponse::failure("Log fetch timed out"),
            )
        }
    };

    respond(
        StatusCode::OK,
        ApiResponse::ok_with_data(
            "Logs retrieved",
            json!({ "logs": text, "lines": lines }),
        ),
    )
}

/// `GET /api/v1/version` — CLI and image version-check results.
pub async fn version(State(state): State<Arc<AppState>>) -> Response {
    let config = state.config_snapshot();

    let cli = match tokio::time::timeout(VERSION_TIMEOUT, state.checker.check_cli(&config.version))
        .await
    {
        Ok(Ok(info)) => info,
        Ok(Err(e)) => {
            return respond(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiResponse::failure_with_details("Failed to check CLI version", e.to_string()),
            )
        }
        Err(_) => {
            return respond(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiResponse::failure("Version check timed out"),
            )
        }
    };

    let images = match tokio::time::timeout(
        VERSION_TIMEOUT,
        state.checker.check_images(&config.image_tag),
    )
    .await
    {
        Ok(Ok(images)) => images,
        Ok(Err(e)) => {
            return respond(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiResponse::failure_with_details("Failed to check image versions", e.to_string()),
            )
        }
        Err(_) => {
            return respond(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiResponse::failure("Version check timed out"),
            )
        }
    };

    respond(
        StatusCode::OK,
        ApiResponse::ok_with_data(
            "Version information retrieved",
            json!({ "cli": cli, "images": images }),
        ),
    )
}

/// `GET /api/v1/check` — validate the config and confirm the required
/// files exist.
pub async fn check(State(state): State<Arc<AppState>>) -> Response {
    let oplog = OpLog::new();
    oplog.info("Validating configuration...");

    let config = match Config::load_or_default(&state.paths.config_file, &state.paths) {
        Ok(config) => config,
        Err(e) => {
            oplog.error(&format!("Failed to load config: {e}"));
            return failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load config", e, oplog);
        }
    };

    if let Err(e) = config.validate() {
        oplog.error(&format!("Config validation failed: {e}"));
        return failure(StatusCode::BAD_REQUEST, "Config validation failed", e, oplog);
    }

    for file in [
        &state.paths.config_file,
        &state.paths.state_file,
        &state.paths.compose_file,
    ] {
        if !file.exists() {
            let message = format!("Required file missing: {}", file.display());
            oplog.error(&message);
            return respond(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiResponse::failure(message).with_logs(oplog.entries()),
            );
        }
    }

    oplog.success("Configuration is valid");
    respond(
        StatusCode::OK,
        ApiResponse::ok("Configuration is valid").with_logs(oplog.entries()),
    )
}

async fn bounded<F>(limit: Duration, work: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    match tokio::time::timeout(limit, work).await {
        Ok(res) => res,
        Err(_) => Err(BerthError::Other("operation timed out".to_string())),
    }
}

/// An operation just rewrote the on-disk documents; pick the changes up.
fn refresh_shared(state: &AppState) {
    if let Err(e) = state.reload_config() {
        warn!("Failed to reload config after operation: {e}");
    }
    if let Err(e) = state.reload_state() {
        warn!("Failed to reload state after operation: {e}");
    }
}

fn respond(status: StatusCode, body: ApiResponse) -> Response {
    (status, Json(body)).into_response()
}

fn failure(status: StatusCode, message: &str, e: BerthError, oplog: OpLog) -> Response {
    respond(
        status,
        ApiResponse::failure_with_details(message, e.to_string()).with_logs(oplog.entries()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::State as InstallState;
    use crate::daemon::server::router;
    use crate::daemon::tests::test_state;
    use crate::error::Result;
    use crate::runtime::{Container, ContainerRuntime};
    use crate::templates;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;
    use tower::ServiceExt;

    async fn send(
        app: axum::Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let body = match body {
            Some(v) => Body::from(v.to_string()),
            None => Body::empty(),
        };
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let dir = TempDir::new().unwrap();
        let (state, _) = test_state(&dir);
        let (status, body) = send(router(state), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn up_installs_into_fresh_environment() {
        let dir = TempDir::new().unwrap();
        let (state, runtime) = test_state(&dir);

        let (status, body) = send(
            router(state.clone()),
            "POST",
            "/api/v1/up",
            Some(json!({ "port": 42867 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(!body["logs"].as_array().unwrap().is_empty());

        // Artifacts created with the body override applied.
        assert!(state.paths.compose_file.exists());
        let on_disk = Config::load(&state.paths.config_file).unwrap();
        assert_eq!(on_disk.port, 42867);
        let install_state = InstallState::load(&state.paths.state_file).unwrap();
        assert!(install_state.installed_at.is_some());
        assert!(runtime.calls().contains(&"up".to_string()));

        // A status poll now reports the installed tag.
        let (status, body) = send(router(state), "GET", "/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["config"]["image_tag"], crate::config::DEFAULT_IMAGE_TAG);
        assert!(body["state"]["installed_at"].is_string());
    }

    #[tokio::test]
    async fn up_starts_containers_when_already_installed() {
        let dir = TempDir::new().unwrap();
        let (state, runtime) = test_state(&dir);
        templates::write_compose(&state.config_snapshot(), &state.paths.compose_file).unwrap();

        let (status, body) = send(router(state), "POST", "/api/v1/up", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Started successfully");
        assert_eq!(runtime.calls(), vec!["up"]);
    }

    #[tokio::test]
    async fn up_rejects_invalid_overrides() {
        let dir = TempDir::new().unwrap();
        let (state, runtime) = test_state(&dir);

        let (status, body) = send(
            router(state),
            "POST",
            "/api/v1/up",
            Some(json!({ "enable_proxy_agent": true })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["details"].as_str().unwrap().contains("proxy_server_url"));
        assert!(runtime.calls().is_empty());
    }

    #[tokio::test]
    async fn down_and_restart_report_envelopes() {
        let dir = TempDir::new().unwrap();
        let (state, runtime) = test_state(&dir);

        let (status, body) = send(router(state.clone()), "POST", "/api/v1/down", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (status, _) = send(
            router(state),
            "POST",
            "/api/v1/restart",
            Some(json!({ "service": "backend" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let calls = runtime.calls();
        assert!(calls.contains(&"down volumes=false".to_string()));
        assert!(calls.contains(&"restart backend".to_string()));
    }

    #[tokio::test]
    async fn mutating_routes_reject_get() {
        let dir = TempDir::new().unwrap();
        let (state, _) = test_state(&dir);
        for uri in ["/api/v1/up", "/api/v1/down", "/api/v1/restart", "/api/v1/upgrade"] {
            let (status, _) = send(router(state.clone()), "GET", uri, None).await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{uri}");
        }
    }

    #[tokio::test]
    async fn logs_returns_captured_text_with_cap() {
        let dir = TempDir::new().unwrap();
        let (state, runtime) = test_state(&dir);
        *runtime.log_text.lock().unwrap() = "line one\nline two\n".to_string();

        let (status, body) = send(
            router(state.clone()),
            "GET",
            "/api/v1/logs?service=backend&lines=50",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["logs"], "line one\nline two\n");
        assert!(runtime
            .calls()
            .contains(&"logs service=backend lines=50".to_string()));

        // Requested line counts are clamped to the hard cap.
        send(router(state), "GET", "/api/v1/logs?lines=999999", None).await;
        assert!(runtime
            .calls()
            .contains(&format!("logs service=* lines={MAX_LOG_LINES}")));
    }

    #[tokio::test]
    async fn version_route_returns_checker_data() {
        let dir = TempDir::new().unwrap();
        let (state, _) = test_state(&dir);
        let (status, body) = send(router(state), "GET", "/api/v1/version", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["cli"]["latest"], crate::config::DEFAULT_IMAGE_TAG);
        assert!(body["data"]["images"].is_array());
    }

    #[tokio::test]
    async fn check_requires_installed_files() {
        let dir = TempDir::new().unwrap();
        let (state, _) = test_state(&dir);

        // Valid config, but nothing installed yet.
        let (status, body) = send(router(state.clone()), "GET", "/api/v1/check", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("Required file missing"));

        let config = state.config_snapshot();
        config.save(&state.paths.config_file).unwrap();
        templates::write_compose(&config, &state.paths.compose_file).unwrap();
        InstallState::default().save(&state.paths.state_file).unwrap();

        let (status, body) = send(router(state), "GET", "/api/v1/check", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Configuration is valid");
    }

    /// Runtime whose mutating calls flag any overlapping execution.
    #[derive(Default)]
    struct OverlapRuntime {
        in_operation: AtomicBool,
        overlap_seen: AtomicBool,
    }

    impl OverlapRuntime {
        async fn enter(&self) {
            if self.in_operation.swap(true, Ordering::SeqCst) {
                self.overlap_seen.store(true, Ordering::SeqCst);
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.in_operation.store(false, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl ContainerRuntime for OverlapRuntime {
        async fn ping(&self) -> Result<()> {
            Ok(())
        }

        async fn up(&self, _compose_file: &Path) -> Result<()> {
            self.enter().await;
            Ok(())
        }

        async fn down(&self, _compose_file: &Path, _remove_volumes: bool) -> Result<()> {
            self.enter().await;
            Ok(())
        }

        async fn pull(&self, _compose_file: &Path, _services: &[String]) -> Result<()> {
            Ok(())
        }

        async fn ps(&self, _compose_file: &Path) -> Result<Vec<Container>> {
            Ok(Vec::new())
        }

        async fn logs(
            &self,
            _compose_file: &Path,
            _service: Option<&str>,
            _opts: LogOptions,
        ) -> Result<String> {
            Ok(String::new())
        }

        async fn restart(&self, _compose_file: &Path, _service: Option<&str>) -> Result<()> {
            self.enter().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn operation_lock_serializes_mutating_calls() {
        use crate::daemon::AppState;
        use crate::paths::Paths;
        use crate::version::fake::FakeChecker;

        let dir = TempDir::new().unwrap();
        let paths = Paths::new(
            Some(dir.path().join("config")),
            Some(dir.path().join("data")),
        );
        std::fs::create_dir_all(&paths.config_dir).unwrap();
        std::fs::create_dir_all(&paths.data_dir).unwrap();
        let config = Config::defaults(&paths);
        templates::write_compose(&config, &paths.compose_file).unwrap();

        let runtime = std::sync::Arc::new(OverlapRuntime::default());
        let state = AppState::new(
            paths,
            config,
            InstallState::default(),
            runtime.clone(),
            std::sync::Arc::new(FakeChecker {
                latest: "0.0.0".to_string(),
            }),
        );

        let app = router(state);
        let (up_result, down_result) = tokio::join!(
            send(app.clone(), "POST", "/api/v1/up", None),
            send(app.clone(), "POST", "/api/v1/down", None),
        );
        assert_eq!(up_result.0, StatusCode::OK);
        assert_eq!(down_result.0, StatusCode::OK);
        assert!(!runtime.overlap_seen.load(Ordering::SeqCst));
    }
}
