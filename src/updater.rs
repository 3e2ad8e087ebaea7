//! Upgrade workflow: move an installed deployment to the newest image tag
//! and recreate its containers.

use crate::config::{Config, State};
use crate::error::{BerthError, Result};
use crate::inference::InferenceEngine;
use crate::paths::Paths;
use crate::report::Reporter;
use crate::runtime::ContainerRuntime;
use crate::templates;
use crate::version::VersionChecker;
use chrono::Utc;
use std::time::Duration;

const VERSION_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Updater<'a> {
    config: &'a mut Config,
    paths: &'a Paths,
    runtime: &'a dyn ContainerRuntime,
    checker: &'a dyn VersionChecker,
    reporter: &'a dyn Reporter,
}

impl<'a> Updater<'a> {
    pub fn new(
        config: &'a mut Config,
        paths: &'a Paths,
        runtime: &'a dyn ContainerRuntime,
        checker: &'a dyn VersionChecker,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            config,
            paths,
            runtime,
            checker,
            reporter,
        }
    }

    /// Run the full upgrade. The version check is best-effort: if it fails
    /// the currently-configured tag is re-pulled and redeployed, which still
    /// picks up re-tagged images.
    pub async fn update(&mut self) -> Result<()> {
        self.reporter.info("Starting update...");

        if !self.paths.compose_file.exists() {
            return Err(BerthError::Other(
                "not installed, run 'berth up' first".to_string(),
            ));
        }

        self.backup_config()?;

        let new_tag = match self.apply_latest_tag().await {
            Ok(tag) => tag,
            Err(e) => {
                self.reporter
                    .warn(&format!("Could not resolve latest version: {e}"));
                self.reporter.info(&format!(
                    "Continuing with current version {}",
                    self.config.image_tag
                ));
                None
            }
        };

        self.pull_images().await?;
        self.recreate_containers().await?;
        let state = self.update_state()?;

        if state.inference_was_running {
            self.reporter
                .info("Restoring inference engine that was running before the update...");
            InferenceEngine::new(self.config, self.reporter).up().await?;
        }

        match new_tag {
            Some(tag) => self
                .reporter
                .success(&format!("Upgraded to version {tag} successfully")),
            None => self.reporter.success("Updated successfully"),
        }
        Ok(())
    }

    fn backup_config(&self) -> Result<()> {
        self.reporter.info("Backing up configuration...");
        let backup = self.paths.config_file.with_extension("yml.backup");
        std::fs::copy(&self.paths.config_file, &backup)?;
        self.reporter
            .success(&format!("Configuration backed up to {}", backup.display()));
        Ok(())
    }

    /// Resolve the latest image tag and, when it differs, commit it to the
    /// config and regenerate the compose file. Returns the new tag, or `None`
    /// when already current.
    async fn apply_latest_tag(&mut self) -> Result<Option<String>> {
        self.reporter.info("Checking for latest image versions...");

        let versions = tokio::time::timeout(
            VERSION_CHECK_TIMEOUT,
            self.checker.check_images(&self.config.image_tag),
        )
        .await
        .map_err(|_| BerthError::Other("version check timed out".to_string()))??;

        let Some(first) = versions.first() else {
            return Err(BerthError::Other(
                "no image version information available".to_string(),
            ));
        };

        if !first.needs_update {
            self.reporter.info(&format!(
                "Already running latest version {}",
                self.config.image_tag
            ));
            return Ok(None);
        }

        let latest = first.latest.clone();
        self.reporter.info(&format!(
            "Updating image tag: {} -> {}",
            self.config.image_tag, latest
        ));
        self.config
            .update_image_tag(&latest, &self.paths.config_file)?;

        self.reporter.info("Regenerating docker-compose.yml...");
        templates::write_compose(self.config, &self.paths.compose_file)?;

        Ok(Some(latest))
    }

    async fn pull_images(&self) -> Result<()> {
        self.reporter.info("Pulling latest images...");
        self.runtime.pull(&self.paths.compose_file, &[]).await?;
        self.reporter.success("Images pulled");
        Ok(())
    }

    async fn recreate_containers(&self) -> Result<()> {
        self.reporter.info("Recreating containers...");
        self.runtime.down(&self.paths.compose_file, false).await?;
        self.runtime.up(&self.paths.compose_file).await?;
        self.reporter.success("Containers recreated");
        Ok(())
    }

    fn update_state(&self) -> Result<State> {
        let mut state = State::load_or_default(&self.paths.state_file)?;
        state.version = self.config.version.clone();
        state.last_updated = Some(Utc::now());
        state.save(&self.paths.state_file)?;
        Ok(state)
    }
}
