//! Background task scheduler: a daily version check and a five-minute
//! health sample, on independent cadences. Each tick handler runs in its
//! own task so a slow network call on one cadence never delays the other.

use crate::config::Config;
use crate::runtime::ContainerRuntime;
use crate::version::VersionChecker;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const VERSION_CHECK_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
pub const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(5 * 60);

const NETWORK_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Scheduler {
    runtime: Arc<dyn ContainerRuntime>,
    checker: Arc<dyn VersionChecker>,
    config: Arc<RwLock<Config>>,
    compose_file: PathBuf,
    version_interval: Duration,
    health_interval: Duration,
}

impl Scheduler {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        checker: Arc<dyn VersionChecker>,
        config: Arc<RwLock<Config>>,
        compose_file: PathBuf,
    ) -> Self {
        Self {
            runtime,
            checker,
            config,
            compose_file,
            version_interval: VERSION_CHECK_INTERVAL,
            health_interval: HEALTH_CHECK_INTERVAL,
        }
    }

    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        info!("Starting task scheduler");

        let mut version_ticker = tokio::time::interval(self.version_interval);
        let mut health_ticker = tokio::time::interval(self.health_interval);
        version_ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        health_ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        version_ticker.tick().await;
        health_ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Task scheduler stopped");
                    return;
                }
                _ = version_ticker.tick() => {
                    let scheduler = self.clone();
                    tokio::spawn(async move { scheduler.check_versions().await });
                }
                _ = health_ticker.tick() => {
                    let scheduler = self.clone();
                    tokio::spawn(async move { scheduler.sample_health().await });
                }
            }
        }
    }

    pub(crate) async fn check_versions(&self) {
        debug!("Running scheduled version check");

        let (current_version, current_tag) = {
            let config = self.config.read().expect("Scheduler config lock poisoned");
            (config.version.clone(), config.image_tag.clone())
        };

        match tokio::time::timeout(NETWORK_TIMEOUT, self.checker.check_cli(&current_version)).await
        {
            Ok(Ok(info)) if info.needs_update => {
                info!("CLI update available: {} -> {}", info.current, info.latest);
            }
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!("Failed to check CLI version: {e}"),
            Err(_) => warn!("CLI version check timed out"),
        }

        match tokio::time::timeout(NETWORK_TIMEOUT, self.checker.check_images(&current_tag)).await
        {
            Ok(Ok(images)) => {
                for image in images.iter().filter(|i| i.needs_update) {
                    info!(
                        "{} update available: {} -> {}",
                        image.image, image.current, image.latest
                    );
                }
            }
            Ok(Err(e)) => warn!("Failed to check image versions: {e}"),
            Err(_) => warn!("Image version check timed out"),
        }
    }

    /// Counts running containers, for the daemon log only.
    pub(crate) async fn sample_health(&self) {
        debug!("Running scheduled health check");

        match self.runtime.ps(&self.compose_file).await {
            Ok(containers) => {
                let running = containers.iter().filter(|c| c.state == "running").count();
                debug!("Health check: {}/{} containers running", running, containers.len());
            }
            Err(e) => warn!("Health check failed: {e}"),
        }
    }
}
