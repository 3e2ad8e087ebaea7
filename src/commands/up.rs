use crate::commands::Ctx;
use berth::inference::InferenceEngine;
use berth::installer::Installer;
use berth::{ContainerRuntime, Reporter};

pub(crate) async fn cmd_up(ctx: Ctx, all: bool) -> anyhow::Result<()> {
    let runtime = ctx.runtime().await?;

    if ctx.paths.compose_file.exists() {
        ctx.console.info("Starting containers...");
        runtime.up(&ctx.paths.compose_file).await?;
        ctx.console.success("Containers started");
    } else {
        Installer::new(&ctx.config, &ctx.paths, &runtime, &ctx.console)
            .install()
            .await?;
    }

    if all || ctx.config.enable_inference_engine {
        InferenceEngine::new(&ctx.config, &ctx.console).up().await?;
        ctx.record_inference_running(true)?;
    }

    Ok(())
}
