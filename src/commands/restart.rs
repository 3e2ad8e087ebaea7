use crate::commands::Ctx;
use berth::{ContainerRuntime, Reporter};

pub(crate) async fn cmd_restart(ctx: Ctx, service: Option<String>) -> anyhow::Result<()> {
    let runtime = ctx.runtime().await?;

    match &service {
        Some(service) => ctx.console.info(&format!("Restarting {service}...")),
        None => ctx.console.info("Restarting all services..."),
    }
    runtime
        .restart(&ctx.paths.compose_file, service.as_deref())
        .await?;
    ctx.console.success("Restart completed");
    Ok(())
}
