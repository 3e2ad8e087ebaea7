use crate::commands::Ctx;
use berth::{ContainerRuntime, LogOptions};

pub(crate) async fn cmd_logs(ctx: Ctx, service: Option<String>, lines: usize) -> anyhow::Result<()> {
    let runtime = ctx.runtime().await?;
    let text = runtime
        .logs(
            &ctx.paths.compose_file,
            service.as_deref(),
            LogOptions { lines },
        )
        .await?;
    print!("{text}");
    Ok(())
}
