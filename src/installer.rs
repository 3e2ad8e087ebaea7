//! First-run installation workflow.
//!
//! Each step is idempotent, so a crashed install can simply be re-run:
//! directory creation and artifact generation overwrite cleanly, pulls
//! resume, and `up` converges on the desired container set.

use crate::config::{Config, State};
use crate::error::{BerthError, Result};
use crate::paths::Paths;
use crate::report::Reporter;
use crate::runtime::ContainerRuntime;
use crate::templates;
use chrono::Utc;

/// Services whose images must pull successfully; optional sidecars may fail
/// with a warning.
const CRITICAL_SERVICES: &[&str] = &["backend", "frontend"];

pub struct Installer<'a> {
    config: &'a Config,
    paths: &'a Paths,
    runtime: &'a dyn ContainerRuntime,
    reporter: &'a dyn Reporter,
}

impl<'a> Installer<'a> {
    pub fn new(
        config: &'a Config,
        paths: &'a Paths,
        runtime: &'a dyn ContainerRuntime,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            config,
            paths,
            runtime,
            reporter,
        }
    }

    pub async fn install(&self) -> Result<()> {
        self.reporter.info("Starting installation...");

        self.preflight().await?;
        self.create_directories()?;
        self.generate_artifacts()?;
        self.pull_images().await?;
        self.start_containers().await?;
        self.save_state()?;

        self.reporter.success("Installed successfully");
        self.reporter.info(&format!(
            "Application is running at http://localhost:{}",
            self.config.port
        ));
        Ok(())
    }

    async fn preflight(&self) -> Result<()> {
        self.reporter.info("Running preflight checks...");

        self.reporter.debug("Checking container runtime...");
        self.runtime.ping().await?;

        self.reporter.debug("Checking port availability...");
        check_port_availability(self.config.port).await?;

        self.reporter.success("Preflight checks passed");
        Ok(())
    }

    fn create_directories(&self) -> Result<()> {
        self.reporter.info("Creating directories...");
        for dir in [
            &self.paths.config_dir,
            &self.paths.data_dir,
            &self.paths.app_data_dir,
        ] {
            self.reporter
                .debug(&format!("Creating directory: {}", dir.display()));
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    fn generate_artifacts(&self) -> Result<()> {
        self.reporter.info("Generating configuration files...");

        self.reporter.debug("Writing docker-compose.yml...");
        templates::write_compose(self.config, &self.paths.compose_file)?;

        self.reporter.debug("Writing config.yml...");
        self.config.save(&self.paths.config_file)?;

        Ok(())
    }

    async fn pull_images(&self) -> Result<()> {
        self.reporter.info("Pulling container images...");

        let mut services: Vec<String> =
            CRITICAL_SERVICES.iter().map(|s| s.to_string()).collect();
        if self.config.enable_deep_research {
            services.push("deep-research".to_string());
        }
        if self.config.enable_proxy_agent {
            services.push("proxy-agent".to_string());
        }

        let mut failed = Vec::new();
        for service in &services {
            match self
                .runtime
                .pull(&self.paths.compose_file, std::slice::from_ref(service))
                .await
            {
                Ok(()) => self.reporter.success(&format!("Pulled {service}")),
                Err(e) => {
                    self.reporter.warn(&format!("Failed to pull {service}: {e}"));
                    failed.push(service.clone());
                }
            }
        }

        for service in &failed {
            if CRITICAL_SERVICES.contains(&service.as_str()) {
                return Err(BerthError::ExternalCommand(format!(
                    "failed to pull critical service: {service}"
                )));
            }
        }
        if !failed.is_empty() {
            self.reporter
                .warn("Some non-critical images failed to pull, continuing anyway");
        }
        Ok(())
    }

    async fn start_containers(&self) -> Result<()> {
        self.reporter.info("Starting containers...");
        self.runtime.up(&self.paths.compose_file).await?;
        self.reporter.success("Containers started");
        Ok(())
    }

    fn save_state(&self) -> Result<()> {
        self.reporter.debug("Saving installation state...");
        let now = Utc::now();
        let state = State {
            version: self.config.version.clone(),
            installed_at: Some(now),
            last_updated: Some(now),
            inference_was_running: false,
        };
        state.save(&self.paths.state_file)
    }
}

/// Probe that the application port is free. A permission error means the
/// port is available but privileged; the container runtime binds it with
/// its own privileges, so that is not a failure.
async fn check_port_availability(port: u16) -> Result<()> {
    match tokio::net::TcpListener::bind(("0.0.0.0", port)).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => Ok(()),
        Err(_) => Err(BerthError::Validation {
            field: "port",
            reason: format!("port {port} is already in use"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Console;
    use crate::runtime::fake::FakeRuntime;
    use tempfile::TempDir;

    fn setup(dir: &TempDir) -> (Config, Paths) {
        let paths = Paths::new(
            Some(dir.path().join("config")),
            Some(dir.path().join("data")),
        );
        let mut config = Config::defaults(&paths);
        // High port so the availability probe can bind in CI.
        config.port = 42801;
        (config, paths)
    }

    #[tokio::test]
    async fn fresh_install_creates_all_artifacts() {
        let dir = TempDir::new().unwrap();
        let (config, paths) = setup(&dir);
        let runtime = FakeRuntime::new();
        let reporter = Console::silent();

        Installer::new(&config, &paths, &runtime, &reporter)
            .install()
            .await
            .unwrap();

        assert!(paths.config_file.exists());
        assert!(paths.compose_file.exists());
        assert!(paths.app_data_dir.is_dir());

        let state = State::load(&paths.state_file).unwrap();
        assert!(state.installed_at.is_some());
        assert_eq!(state.version, config.version);

        let calls = runtime.calls();
        assert!(calls.contains(&"pull backend".to_string()));
        assert!(calls.contains(&"pull frontend".to_string()));
        assert_eq!(calls.last().unwrap(), "up");
    }

    #[tokio::test]
    async fn optional_services_pulled_only_when_enabled() {
        let dir = TempDir::new().unwrap();
        let (mut config, paths) = setup(&dir);
        config.enable_deep_research = true;
        let runtime = FakeRuntime::new();
        let reporter = Console::silent();

        Installer::new(&config, &paths, &runtime, &reporter)
            .install()
            .await
            .unwrap();

        let calls = runtime.calls();
        assert!(calls.contains(&"pull deep-research".to_string()));
        assert!(!calls.iter().any(|c| c.contains("proxy-agent")));
    }

    #[tokio::test]
    async fn install_fails_fast_when_runtime_unreachable() {
        let dir = TempDir::new().unwrap();
        let (config, paths) = setup(&dir);
        let runtime = FakeRuntime::new();
        *runtime.fail_ping.lock().unwrap() = true;
        let reporter = Console::silent();

        let err = Installer::new(&config, &paths, &runtime, &reporter)
            .install()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not reachable"));

        // Nothing was written and no containers were touched.
        assert!(!paths.config_file.exists());
        assert!(!paths.compose_file.exists());
        assert_eq!(runtime.calls(), vec!["ping"]);
    }

    #[tokio::test]
    async fn port_probe_accepts_free_port() {
        check_port_availability(42899).await.unwrap();
    }

    #[tokio::test]
    async fn port_probe_rejects_taken_port() {
        let listener = tokio::net::TcpListener::bind(("0.0.0.0", 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(check_port_availability(port).await.is_err());
    }
}
