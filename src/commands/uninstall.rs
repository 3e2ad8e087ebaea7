use crate::commands::Ctx;
use berth::inference::InferenceEngine;
use berth::{ContainerRuntime, Reporter};

pub(crate) async fn cmd_uninstall(ctx: Ctx, purge_data: bool) -> anyhow::Result<()> {
    if !ctx.paths.compose_file.exists() {
        ctx.console.warn("Nothing to uninstall");
        return Ok(());
    }

    let runtime = ctx.runtime().await?;

    ctx.console.info("Stopping and removing containers...");
    runtime.down(&ctx.paths.compose_file, purge_data).await?;

    let engine = InferenceEngine::new(&ctx.config, &ctx.console);
    if engine.is_running().await.unwrap_or(false) {
        engine.down().await?;
    }

    remove_file(&ctx, &ctx.paths.compose_file)?;
    remove_file(&ctx, &ctx.paths.state_file)?;

    if purge_data {
        ctx.console.info("Purging data and configuration...");
        remove_dir(&ctx, &ctx.paths.data_dir)?;
        remove_dir(&ctx, &ctx.paths.config_dir)?;
    }

    ctx.console.success("Uninstalled");
    Ok(())
}

fn remove_file(ctx: &Ctx, path: &std::path::Path) -> anyhow::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            ctx.console.debug(&format!("Removed {}", path.display()));
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn remove_dir(ctx: &Ctx, path: &std::path::Path) -> anyhow::Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => {
            ctx.console.debug(&format!("Removed {}", path.display()));
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
