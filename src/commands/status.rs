use crate::commands::Ctx;
use berth::inference::InferenceEngine;
use berth::{ContainerRuntime, Reporter};
use console::style;

pub(crate) async fn cmd_status(ctx: Ctx) -> anyhow::Result<()> {
    let state = ctx.state()?;

    if state.installed_at.is_none() {
        ctx.console.warn("Not installed, run 'berth up' first");
        return Ok(());
    }

    println!("{}", style("Installation").bold());
    println!("  version:      {}", state.version);
    if let Some(installed_at) = state.installed_at {
        println!("  installed:    {}", installed_at.to_rfc3339());
    }
    if let Some(last_updated) = state.last_updated {
        println!("  last updated: {}", last_updated.to_rfc3339());
    }
    println!("  image tag:    {}", ctx.config.image_tag);
    println!("  port:         {}", ctx.config.port);

    let runtime = ctx.runtime().await?;
    let containers = runtime.ps(&ctx.paths.compose_file).await?;

    println!();
    println!("{}", style("Containers").bold());
    if containers.is_empty() {
        println!("  (none running)");
    }
    for container in &containers {
        let state_styled = match container.state.as_str() {
            "running" => style(container.state.clone()).green(),
            "exited" => style(container.state.clone()).red(),
            _ => style(container.state.clone()).yellow(),
        };
        println!(
            "  {:<16} {:<10} {}",
            container.service, state_styled, container.status
        );
    }

    if ctx.config.enable_inference_engine {
        let engine = InferenceEngine::new(&ctx.config, &ctx.console);
        let info = engine.status().await?;
        println!();
        println!("{}", style("Inference engine").bold());
        println!("  {:<16} {}", info.name, info.state);
    }

    Ok(())
}
