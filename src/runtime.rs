//! Container runtime client.
//!
//! Everything that talks to the compose tooling goes through the
//! [`ContainerRuntime`] trait so the monitor, scheduler, and handlers can be
//! exercised against a canned runtime in tests. [`ComposeRuntime`] is the
//! real implementation, shelling out to `docker compose` (or the legacy
//! `docker-compose` binary).

use crate::error::{BerthError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

/// One container as reported by `ps`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    pub service: String,
    pub state: String,
    pub status: String,
    pub image: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogOptions {
    pub lines: usize,
}

#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Cheap probe that the runtime daemon itself is reachable, not just
    /// that the client binary exists.
    async fn ping(&self) -> Result<()>;
    async fn up(&self, compose_file: &Path) -> Result<()>;
    async fn down(&self, compose_file: &Path, remove_volumes: bool) -> Result<()>;
    /// Pull images; an empty `services` list pulls everything.
    async fn pull(&self, compose_file: &Path, services: &[String]) -> Result<()>;
    async fn ps(&self, compose_file: &Path) -> Result<Vec<Container>>;
    /// Fetch recent log lines, captured rather than streamed.
    async fn logs(
        &self,
        compose_file: &Path,
        service: Option<&str>,
        opts: LogOptions,
    ) -> Result<String>;
    /// Restart one service, or all when `service` is `None`.
    async fn restart(&self, compose_file: &Path, service: Option<&str>) -> Result<()>;

    async fn is_running(&self, compose_file: &Path) -> Result<bool> {
        let containers = match self.ps(compose_file).await {
            Ok(c) => c,
            Err(BerthError::ExternalCommand(msg)) if msg.contains("no such file") => {
                return Ok(false)
            }
            Err(e) => return Err(e),
        };
        Ok(containers.iter().any(|c| c.state == "running"))
    }
}

/// Shells out to the compose CLI. The core never interprets exit codes
/// beyond success/failure; stderr is carried in the error message.
pub struct ComposeRuntime {
    program: String,
    base_args: Vec<String>,
}

impl ComposeRuntime {
    /// Assume the modern `docker compose` plugin.
    pub fn new() -> Self {
        Self {
            program: "docker".to_string(),
            base_args: vec!["compose".to_string()],
        }
    }

    /// Probe for a working compose command, preferring the plugin and
    /// falling back to the standalone `docker-compose` binary.
    pub async fn detect() -> Result<Self> {
        let plugin = Self::new();
        if plugin.probe().await {
            return Ok(plugin);
        }

        let legacy = Self {
            program: "docker-compose".to_string(),
            base_args: Vec::new(),
        };
        if legacy.probe().await {
            return Ok(legacy);
        }

        Err(BerthError::ExternalCommand(
            "no compose command found: install the docker compose plugin or docker-compose"
                .to_string(),
        ))
    }

    async fn probe(&self) -> bool {
        Command::new(&self.program)
            .args(&self.base_args)
            .arg("version")
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn command(&self, compose_file: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.base_args);
        cmd.arg("-f").arg(compose_file);
        if let Some(dir) = compose_file.parent() {
            cmd.current_dir(dir);
        }
        cmd.kill_on_drop(true);
        cmd
    }

    async fn run(&self, mut cmd: Command, what: &str) -> Result<std::process::Output> {
        debug!("Running compose command: {}", what);
        let output = cmd.output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BerthError::ExternalCommand(format!(
                "{what} failed: {}",
                stderr.trim()
            )));
        }
        Ok(output)
    }
}

impl Default for ComposeRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContainerRuntime for ComposeRuntime {
    async fn ping(&self) -> Result<()> {
        let mut cmd = Command::new("docker");
        cmd.args(["ps", "-q"]);
        cmd.kill_on_drop(true);
        let output = cmd.output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BerthError::ExternalCommand(format!(
                "docker daemon is not reachable: {}",
                stderr.trim()
            )));
        }
        Ok(())
    }

    async fn up(&self, compose_file: &Path) -> Result<()> {
        let mut cmd = self.command(compose_file);
        cmd.args(["up", "-d"]);
        self.run(cmd, "up").await?;
        Ok(())
    }

    async fn down(&self, compose_file: &Path, remove_volumes: bool) -> Result<()> {
        let mut cmd = self.command(compose_file);
        cmd.arg("down");
        if remove_volumes {
            cmd.arg("-v");
        }
        self.run(cmd, "down").await?;
        Ok(())
    }

    async fn pull(&self, compose_file: &Path, services: &[String]) -> Result<()> {
        let mut cmd = self.command(compose_file);
        cmd.arg("pull");
        cmd.args(services);
        self.run(cmd, "pull").await?;
        Ok(())
    }

    async fn ps(&self, compose_file: &Path) -> Result<Vec<Container>> {
        let mut cmd = self.command(compose_file);
        cmd.args(["ps", "--format", "json"]);
        let output = self.run(cmd, "ps").await?;
        parse_ps_output(&String::from_utf8_lossy(&output.stdout))
    }

    async fn logs(
        &self,
        compose_file: &Path,
        service: Option<&str>,
        opts: LogOptions,
    ) -> Result<String> {
        let mut cmd = self.command(compose_file);
        cmd.arg("logs").arg("--no-color");
        if opts.lines > 0 {
            cmd.arg("--tail").arg(opts.lines.to_string());
        }
        if let Some(service) = service {
            cmd.arg(service);
        }
        let output = self.run(cmd, "logs").await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn restart(&self, compose_file: &Path, service: Option<&str>) -> Result<()> {
        let mut cmd = self.command(compose_file);
        cmd.arg("restart");
        if let Some(service) = service {
            cmd.arg(service);
        }
        self.run(cmd, "restart").await?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct PsEntry {
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Service", default)]
    service: String,
    #[serde(rename = "State", default)]
    state: String,
    #[serde(rename = "Status", default)]
    status: String,
    #[serde(rename = "Image", default)]
    image: String,
}

impl From<PsEntry> for Container {
    fn from(e: PsEntry) -> Self {
        Container {
            name: e.name,
            service: e.service,
            state: e.state,
            status: e.status,
            image: e.image,
        }
    }
}

/// `ps --format json` emits one JSON object per line on current compose
/// releases and a single array on some older ones; accept both.
fn parse_ps_output(stdout: &str) -> Result<Vec<Container>> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        let entries: Vec<PsEntry> = serde_json::from_str(trimmed)?;
        return Ok(entries.into_iter().map(Container::from).collect());
    }

    let mut containers = Vec::new();
    for line in trimmed.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let entry: PsEntry = serde_json::from_str(line)?;
        containers.push(entry.into());
    }
    Ok(containers)
}

// ---------------------------------------------------------------------------
// Test double
// ---------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ps_json_lines() {
        let out = r#"{"Name":"berth-backend-1","Service":"backend","State":"running","Status":"Up 2 hours","Image":"berth/backend:0.3.2"}
{"Name":"berth-frontend-1","Service":"frontend","State":"exited","Status":"Exited (1)","Image":"berth/frontend:0.3.2"}"#;

        let containers = parse_ps_output(out).unwrap();
        assert_eq!(containers.len(), 2);
        assert_eq!(containers[0].service, "backend");
        assert_eq!(containers[1].state, "exited");
    }

    #[test]
    fn parse_ps_array_form() {
        let out = r#"[{"Name":"a","Service":"backend","State":"running","Status":"Up","Image":"img"}]"#;
        let containers = parse_ps_output(out).unwrap();
        assert_eq!(containers.len(), 1);
        assert_eq!(containers[0].name, "a");
    }

    #[test]
    fn parse_ps_empty_output() {
        assert!(parse_ps_output("").unwrap().is_empty());
        assert!(parse_ps_output("\n  \n").unwrap().is_empty());
    }
}
