use crate::commands::Ctx;
use berth::inference::InferenceEngine;
use berth::{ContainerRuntime, Reporter};

pub(crate) async fn cmd_down(ctx: Ctx, all: bool) -> anyhow::Result<()> {
    let runtime = ctx.runtime().await?;
    let engine = InferenceEngine::new(&ctx.config, &ctx.console);

    // Remember whether the engine was up before this stop so an upgrade can
    // bring it back.
    let engine_running = engine.is_running().await.unwrap_or(false);
    ctx.record_inference_running(engine_running)?;

    ctx.console.info("Stopping containers...");
    runtime.down(&ctx.paths.compose_file, false).await?;
    ctx.console.success("Containers stopped");

    if all && engine_running {
        engine.down().await?;
    }

    Ok(())
}
