pub(crate) mod check;
pub(crate) mod completions;
pub(crate) mod config;
pub(crate) mod down;
pub(crate) mod inference;
pub(crate) mod logs;
pub(crate) mod restart;
pub(crate) mod status;
pub(crate) mod uninstall;
pub(crate) mod up;
pub(crate) mod upgrade;
pub(crate) mod version;

use berth::config::{find_missing_fields, find_unknown_fields};
use berth::{Config, ComposeRuntime, Console, Paths, Reporter, State};
use std::path::PathBuf;

/// Shared command context: resolved paths, the effective config, and the
/// console reporter.
pub(crate) struct Ctx {
    pub paths: Paths,
    pub config: Config,
    pub console: Console,
}

impl Ctx {
    pub fn load(
        config_dir: Option<PathBuf>,
        data_dir: Option<PathBuf>,
        verbose: bool,
    ) -> anyhow::Result<Self> {
        let paths = Paths::new(config_dir, data_dir);
        let config = Config::load_or_default(&paths.config_file, &paths)?;
        Ok(Self {
            paths,
            config,
            console: Console::new(verbose),
        })
    }

    pub async fn runtime(&self) -> anyhow::Result<ComposeRuntime> {
        Ok(ComposeRuntime::detect().await?)
    }

    pub fn state(&self) -> anyhow::Result<State> {
        Ok(State::load_or_default(&self.paths.state_file)?)
    }

    /// Persist the inference-engine running flag so the updater knows
    /// whether to bring the engine back after an upgrade.
    pub fn record_inference_running(&self, running: bool) -> anyhow::Result<()> {
        let mut state = self.state()?;
        if state.inference_was_running != running {
            state.inference_was_running = running;
            std::fs::create_dir_all(&self.paths.data_dir)?;
            state.save(&self.paths.state_file)?;
        }
        Ok(())
    }
}

/// Unknown/missing-field report shared by `check` and `config drift`.
/// Returns whether the file matches the current schema exactly.
pub(crate) fn report_drift(ctx: &Ctx) -> anyhow::Result<bool> {
    let unknown = find_unknown_fields(&ctx.paths.config_file)?;
    let missing = find_missing_fields(&ctx.paths.config_file)?;

    for field in &unknown {
        ctx.console
            .warn(&format!("Unknown config field (ignored): {field}"));
    }
    for field in &missing {
        ctx.console
            .info(&format!("Config field missing (default applied): {field}"));
    }

    let clean = unknown.is_empty() && missing.is_empty();
    if clean {
        ctx.console.success("Config file matches the current schema");
    }
    Ok(clean)
}
