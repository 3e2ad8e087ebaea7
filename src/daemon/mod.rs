//! Background daemon: control-plane API server plus the monitor and
//! scheduler loops, supervised as independent tasks.

pub mod handlers;
pub mod monitor;
pub mod oplog;
pub mod protocol;
pub mod scheduler;
pub mod server;

pub use monitor::{Monitor, MonitorStats};
pub use oplog::OpLog;
pub use protocol::{ApiResponse, LogEntry, RestartRequest, UpRequest};
pub use scheduler::Scheduler;

use crate::config::{Config, State};
use crate::error::{BerthError, Result};
use crate::paths::Paths;
use crate::runtime::{ComposeRuntime, Container, ContainerRuntime};
use crate::version::{HttpVersionChecker, ImageVersionInfo, VersionChecker, VersionInfo};
use serde::Serialize;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const STATUS_VERSION_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything the handlers and loops share. The operation lock serializes
/// mutating control-plane operations; the config and state locks only guard
/// short clone-in/clone-out sections and are never held across awaits.
pub struct AppState {
    pub paths: Paths,
    pub config: Arc<RwLock<Config>>,
    pub state: RwLock<State>,
    pub runtime: Arc<dyn ContainerRuntime>,
    pub checker: Arc<dyn VersionChecker>,
    pub monitor: Arc<Monitor>,
    pub op_lock: tokio::sync::Mutex<()>,
}

impl AppState {
    pub fn new(
        paths: Paths,
        config: Config,
        state: State,
        runtime: Arc<dyn ContainerRuntime>,
        checker: Arc<dyn VersionChecker>,
    ) -> Arc<Self> {
        let monitor = Arc::new(Monitor::new(runtime.clone(), paths.compose_file.clone()));
        Arc::new(Self {
            paths,
            config: Arc::new(RwLock::new(config)),
            state: RwLock::new(state),
            runtime,
            checker,
            monitor,
            op_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn config_snapshot(&self) -> Config {
        self.config.read().expect("AppState config lock poisoned").clone()
    }

    pub fn state_snapshot(&self) -> State {
        self.state.read().expect("AppState state lock poisoned").clone()
    }

    /// Re-read the config document, picking up whatever an operation just
    /// persisted (new fields get defaults).
    pub fn reload_config(&self) -> Result<()> {
        let fresh = Config::load_or_default(&self.paths.config_file, &self.paths)?;
        *self.config.write().expect("AppState config lock poisoned") = fresh;
        Ok(())
    }

    pub fn reload_state(&self) -> Result<()> {
        let fresh = State::load_or_default(&self.paths.state_file)?;
        *self.state.write().expect("AppState state lock poisoned") = fresh;
        Ok(())
    }

    /// Full status snapshot. Version checks are best-effort and omitted on
    /// failure; a failing container query is a real error.
    pub async fn status(&self) -> Result<Status> {
        let containers = self.runtime.ps(&self.paths.compose_file).await?;
        let config = self.config_snapshot();

        let cli_version = match tokio::time::timeout(
            STATUS_VERSION_TIMEOUT,
            self.checker.check_cli(&config.version),
        )
        .await
        {
            Ok(Ok(info)) => Some(info),
            Ok(Err(e)) => {
                warn!("Failed to check CLI version: {e}");
                None
            }
            Err(_) => {
                warn!("CLI version check timed out");
                None
            }
        };

        let image_versions = match tokio::time::timeout(
            STATUS_VERSION_TIMEOUT,
            self.checker.check_images(&config.image_tag),
        )
        .await
        {
            Ok(Ok(images)) => Some(images),
            Ok(Err(e)) => {
                warn!("Failed to check image versions: {e}");
                None
            }
            Err(_) => {
                warn!("Image version check timed out");
                None
            }
        };

        Ok(Status {
            state: self.state_snapshot(),
            config,
            containers,
            cli_version,
            image_versions,
            monitor: self.monitor.stats(),
        })
    }
}

/// Snapshot returned by `GET /status`.
#[derive(Debug, Serialize)]
pub struct Status {
    pub state: State,
    pub config: Config,
    pub containers: Vec<Container>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cli_version: Option<VersionInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_versions: Option<Vec<ImageVersionInfo>>,
    pub monitor: MonitorStats,
}

pub struct Daemon {
    state: Arc<AppState>,
}

impl Daemon {
    /// Build a daemon from the environment. A missing config document is
    /// created with defaults rather than treated as fatal, so the daemon can
    /// start before the interactive installer has run.
    pub async fn new() -> Result<Self> {
        let paths = Paths::new(None, None);

        let config = Config::load_or_default(&paths.config_file, &paths)?;
        if !paths.config_file.exists() {
            warn!("Config file not found, creating default config");
            std::fs::create_dir_all(&paths.config_dir)?;
            config.save(&paths.config_file)?;
            info!("Created default config at {}", paths.config_file.display());
        }

        let state = State::load_or_default(&paths.state_file)?;

        let runtime: Arc<dyn ContainerRuntime> = Arc::new(ComposeRuntime::detect().await?);
        let checker: Arc<dyn VersionChecker> = Arc::new(HttpVersionChecker::new()?);

        Ok(Self {
            state: AppState::new(paths, config, state, runtime, checker),
        })
    }

    /// Supervisor with injected collaborators.
    pub fn with_state(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Run until the token fires or the server fails. Shutdown order:
    /// the server stops first so no new mutating operation begins, then the
    /// background loops are cancelled and joined before returning.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        info!("Starting daemon services");

        let background = CancellationToken::new();
        let server_cancel = CancellationToken::new();

        let monitor = self.state.monitor.clone();
        let monitor_handle = {
            let token = background.clone();
            tokio::spawn(async move { monitor.run(token).await })
        };

        let scheduler = Arc::new(Scheduler::new(
            self.state.runtime.clone(),
            self.state.checker.clone(),
            self.state.config.clone(),
            self.state.paths.compose_file.clone(),
        ));
        let scheduler_handle = tokio::spawn(scheduler.run(background.clone()));

        let mut server_handle = tokio::spawn(server::serve(
            self.state.clone(),
            server_cancel.clone(),
        ));

        info!("Daemon started");

        let result = tokio::select! {
            _ = cancel.cancelled() => {
                info!("Shutdown signal received, stopping daemon services");
                server_cancel.cancel();
                join_server(server_handle).await
            }
            res = &mut server_handle => match res {
                Ok(res) => res,
                Err(e) => Err(BerthError::Other(format!("server task panicked: {e}"))),
            },
        };

        background.cancel();
        let _ = monitor_handle.await;
        let _ = scheduler_handle.await;

        info!("Daemon stopped");
        result
    }
}

async fn join_server(handle: tokio::task::JoinHandle<Result<()>>) -> Result<()> {
    match handle.await {
        Ok(res) => res,
        Err(e) => Err(BerthError::Other(format!("server task panicked: {e}"))),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::runtime::fake::{container, FakeRuntime};
    use crate::version::fake::FakeChecker;
    use tempfile::TempDir;

    pub(crate) fn test_state(dir: &TempDir) -> (Arc<AppState>, Arc<FakeRuntime>) {
        let paths = Paths::new(
            Some(dir.path().join("config")),
            Some(dir.path().join("data")),
        );
        std::fs::create_dir_all(&paths.config_dir).unwrap();
        std::fs::create_dir_all(&paths.data_dir).unwrap();
        let config = Config::defaults(&paths);
        let runtime = Arc::new(FakeRuntime::new());
        let state = AppState::new(
            paths,
            config,
            State::default(),
            runtime.clone(),
            Arc::new(FakeChecker {
                latest: crate::config::DEFAULT_IMAGE_TAG.to_string(),
            }),
        );
        (state, runtime)
    }

    #[tokio::test]
    async fn status_snapshot_reflects_runtime_and_state() {
        let dir = TempDir::new().unwrap();
        let (state, runtime) = test_state(&dir);
        runtime.push_ps(Ok(vec![container("backend", "running")]));

        let status = state.status().await.unwrap();
        assert_eq!(status.containers.len(), 1);
        assert!(status.state.installed_at.is_none());
        assert_eq!(status.config.image_tag, crate::config::DEFAULT_IMAGE_TAG);
        assert!(status.cli_version.is_some());
    }

    #[tokio::test]
    async fn run_stops_cleanly_on_cancellation() {
        let dir = TempDir::new().unwrap();
        let (state, _runtime) = test_state(&dir);
        // Unused TCP port; bind may still fail on busy CI, so tolerate an
        // error result as long as the task completes.
        std::env::set_var(crate::env::ENV_PORT, "0");
        let daemon = Daemon::with_state(state);
        let cancel = CancellationToken::new();

        let token = cancel.clone();
        let handle = tokio::spawn(async move { daemon.run(token).await });
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("daemon did not stop")
            .unwrap()
            .ok();
        std::env::remove_var(crate::env::ENV_PORT);
    }
}
