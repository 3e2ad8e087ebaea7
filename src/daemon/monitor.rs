//! Container health monitor.
//!
//! Polls the runtime on a fixed interval, tracks per-service state
//! transitions, and restarts containers that have newly entered the
//! `exited` state. The restart fires once per exit episode: a container
//! that stays `exited` across ticks is not restarted again until it
//! leaves and re-enters the state, which keeps a crash-looping service
//! from being hammered every tick.

use crate::runtime::ContainerRuntime;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Cumulative, process-lifetime monitoring counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MonitorStats {
    pub last_check: Option<DateTime<Utc>>,
    pub check_count: u64,
    pub restart_count: u64,
    pub failed_checks: u64,
    /// service name -> last observed state
    pub container_state: HashMap<String, String>,
}

pub struct Monitor {
    runtime: Arc<dyn ContainerRuntime>,
    compose_file: PathBuf,
    interval: Duration,
    auto_restart: bool,
    stats: RwLock<MonitorStats>,
}

impl Monitor {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, compose_file: PathBuf) -> Self {
        Self::with_interval(runtime, compose_file, DEFAULT_INTERVAL)
    }

    pub fn with_interval(
        runtime: Arc<dyn ContainerRuntime>,
        compose_file: PathBuf,
        interval: Duration,
    ) -> Self {
        Self {
            runtime,
            compose_file,
            interval,
            auto_restart: true,
            stats: RwLock::new(MonitorStats::default()),
        }
    }

    /// Tick loop; exits between ticks when the token fires.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(interval = ?self.interval, "Starting container monitor");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first interval tick fires immediately; skip it so the loop
        // waits a full period before the first check.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Container monitor stopped");
                    return;
                }
                _ = ticker.tick() => self.tick().await,
            }
        }
    }

    /// One monitoring pass. A failed runtime query counts as a failed check
    /// and skips restart logic entirely; it never reads as "everything
    /// exited".
    pub(crate) async fn tick(&self) {
        let containers = match self.runtime.ps(&self.compose_file).await {
            Ok(containers) => containers,
            Err(e) => {
                error!("Failed to check container status: {e}");
                self.stats.write().expect("Monitor lock poisoned").failed_checks += 1;
                return;
            }
        };

        let mut needs_restart = Vec::new();
        {
            let mut stats = self.stats.write().expect("Monitor lock poisoned");
            stats.last_check = Some(Utc::now());
            stats.check_count += 1;

            for container in &containers {
                let previous = stats
                    .container_state
                    .insert(container.service.clone(), container.state.clone());

                if let Some(previous) = &previous {
                    if *previous != container.state {
                        info!(
                            service = %container.service,
                            "Container changed state: {} -> {}",
                            previous, container.state
                        );
                    }
                }

                // Restart only on the transition into "exited".
                let entered_exited =
                    container.state == "exited" && previous.as_deref() != Some("exited");
                if self.auto_restart && entered_exited {
                    needs_restart.push(container.service.clone());
                }
            }

            // Forget services no longer part of the deployment so a later
            // service with the same name starts from a clean slate.
            stats
                .container_state
                .retain(|service, _| containers.iter().any(|c| c.service == *service));
        }

        // Restarts run outside the stats lock.
        for service in needs_restart {
            warn!(service = %service, "Container exited, attempting restart");
            match self.runtime.restart(&self.compose_file, Some(&service)).await {
                Ok(()) => {
                    self.stats.write().expect("Monitor lock poisoned").restart_count += 1;
                    info!(service = %service, "Restarted container");
                }
                Err(e) => error!(service = %service, "Failed to restart container: {e}"),
            }
        }
    }

    /// Deep copy of the current stats; callers never alias internal state.
    pub fn stats(&self) -> MonitorStats {
        self.stats.read().expect("Monitor lock poisoned").clone()
    }
}
