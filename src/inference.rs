//! Local GPU inference engine, run as a plain `docker run` container
//! outside the compose project so the application stack can restart
//! without dropping a loaded model.

use crate::config::Config;
use crate::error::{BerthError, Result};
use crate::report::Reporter;
use crate::runtime::LogOptions;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

pub const CONTAINER_NAME: &str = "berth-inference";
pub const IMAGE: &str = "ghcr.io/ggml-org/llama.cpp:server-cuda";

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Status snapshot of the inference container.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ContainerInfo {
    pub name: String,
    pub state: String,
    pub image: String,
    pub running: bool,
}

pub struct InferenceEngine<'a> {
    config: &'a Config,
    reporter: &'a dyn Reporter,
}

impl<'a> InferenceEngine<'a> {
    pub fn new(config: &'a Config, reporter: &'a dyn Reporter) -> Self {
        Self { config, reporter }
    }

    /// Start the container. A stopped leftover with the same name is removed
    /// first; starting an already-running engine is a no-op.
    pub async fn up(&self) -> Result<()> {
        if self.is_running().await? {
            self.reporter.info("Inference engine is already running");
            return Ok(());
        }

        if self.container_exists().await {
            self.reporter.info("Removing stale inference container...");
            self.remove_container().await?;
        }

        self.reporter.info("Starting inference engine...");
        let args = docker_run_args(self.config);
        run_docker(&args, "run").await?;
        self.reporter.success("Inference engine started");
        Ok(())
    }

    /// Stop and remove the container; a no-op when it is not running.
    pub async fn down(&self) -> Result<()> {
        if !self.is_running().await? {
            self.reporter.info("Inference engine is not running");
            return Ok(());
        }

        self.reporter.info("Stopping inference engine...");
        run_docker(&["stop".to_string(), CONTAINER_NAME.to_string()], "stop").await?;
        run_docker(&["rm".to_string(), CONTAINER_NAME.to_string()], "rm").await?;
        self.reporter.success("Inference engine stopped");
        Ok(())
    }

    /// Inspect the container. A missing container is reported as state
    /// `not found` rather than an error.
    pub async fn status(&self) -> Result<ContainerInfo> {
        let output = Command::new("docker")
            .args([
                "inspect",
                "--format",
                "{{.State.Status}}|{{.State.Running}}|{{.Config.Image}}",
                CONTAINER_NAME,
            ])
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Ok(ContainerInfo {
                name: CONTAINER_NAME.to_string(),
                state: "not found".to_string(),
                image: String::new(),
                running: false,
            });
        }

        parse_inspect_line(String::from_utf8_lossy(&output.stdout).trim())
    }

    pub async fn is_running(&self) -> Result<bool> {
        Ok(self.status().await?.running)
    }

    /// Recent log lines, captured. Docker writes container stderr to the
    /// daemon's stderr stream, so both are combined.
    pub async fn logs(&self, opts: LogOptions) -> Result<String> {
        let mut args = vec!["logs".to_string()];
        if opts.lines > 0 {
            args.push("--tail".to_string());
            args.push(opts.lines.to_string());
        }
        args.push(CONTAINER_NAME.to_string());

        let output = run_docker(&args, "logs").await?;
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(text)
    }

    /// HTTP probe against the engine's own health endpoint.
    pub async fn health_check(&self) -> Result<()> {
        let client = reqwest::Client::builder()
            .timeout(HEALTH_TIMEOUT)
            .build()?;
        let url = format!("http://localhost:{}/health", self.config.inference.port);
        let response = client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(BerthError::Other(format!(
                "inference engine health check returned status {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn container_exists(&self) -> bool {
        Command::new("docker")
            .args(["inspect", CONTAINER_NAME])
            .kill_on_drop(true)
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    async fn remove_container(&self) -> Result<()> {
        run_docker(
            &[
                "rm".to_string(),
                "-f".to_string(),
                CONTAINER_NAME.to_string(),
            ],
            "rm -f",
        )
        .await?;
        Ok(())
    }
}

async fn run_docker(args: &[String], what: &str) -> Result<std::process::Output> {
    debug!("Running docker command: {}", what);
    let output = Command::new("docker")
        .args(args)
        .kill_on_drop(true)
        .output()
        .await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BerthError::ExternalCommand(format!(
            "docker {what} failed: {}",
            stderr.trim()
        )));
    }
    Ok(output)
}

fn parse_inspect_line(line: &str) -> Result<ContainerInfo> {
    let parts: Vec<&str> = line.split('|').collect();
    if parts.len() != 3 {
        return Err(BerthError::ExternalCommand(format!(
            "unexpected docker inspect output: {line}"
        )));
    }
    Ok(ContainerInfo {
        name: CONTAINER_NAME.to_string(),
        state: parts[0].to_string(),
        image: parts[2].to_string(),
        running: parts[1] == "true",
    })
}

/// The full `docker run` argument list derived from the inference block.
/// Models live under `<data_dir>/models` on the host and are mounted
/// read-only at `/models` in the container.
pub fn docker_run_args(config: &Config) -> Vec<String> {
    let inf = &config.inference;
    let models_dir = config.data_dir.join("models");

    let mut args: Vec<String> = vec![
        "run".into(),
        "-d".into(),
        "--name".into(),
        CONTAINER_NAME.into(),
        "--restart".into(),
        "unless-stopped".into(),
        "--gpus".into(),
        format!("\"device={}\"", inf.gpu_devices),
        "--shm-size".into(),
        inf.shm_size.clone(),
        "--ipc=host".into(),
        "-p".into(),
        format!("{0}:{0}", inf.port),
        "-e".into(),
        format!("CUDA_VISIBLE_DEVICES={}", inf.gpu_devices),
        "-v".into(),
        format!("{}:/models:ro", models_dir.display()),
        IMAGE.into(),
    ];

    args.extend([
        "--host".into(),
        "0.0.0.0".into(),
        "--port".into(),
        inf.port.to_string(),
        "-m".into(),
        format!("/models/{}", inf.model_file),
        "-c".into(),
        inf.context_size.to_string(),
        "-b".into(),
        inf.batch_size.to_string(),
        "-ngl".into(),
        inf.gpu_layers.to_string(),
        "-ts".into(),
        inf.tensor_split.clone(),
        "-mg".into(),
        inf.main_gpu.to_string(),
        "-t".into(),
        inf.threads.to_string(),
        "--threads-http".into(),
        inf.http_threads.to_string(),
    ]);

    if inf.fit != "off" {
        args.push("--fit".into());
        args.push(inf.fit.clone());
    }

    args
}
