use crate::commands::Ctx;
use berth::updater::Updater;
use berth::version::HttpVersionChecker;

pub(crate) async fn cmd_upgrade(mut ctx: Ctx) -> anyhow::Result<()> {
    let runtime = ctx.runtime().await?;
    let checker = HttpVersionChecker::new()?;

    Updater::new(
        &mut ctx.config,
        &ctx.paths,
        &runtime,
        &checker,
        &ctx.console,
    )
    .update()
    .await?;
    Ok(())
}
