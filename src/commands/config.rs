use crate::args::ConfigCommands;
use crate::commands::{report_drift, Ctx};
use berth::templates;
use berth::Reporter;

pub(crate) async fn cmd_config(ctx: Ctx, command: ConfigCommands) -> anyhow::Result<()> {
    match command {
        ConfigCommands::Show => {
            print!("{}", serde_yaml::to_string(&ctx.config)?);
            Ok(())
        }
        ConfigCommands::Drift => drift(ctx),
        ConfigCommands::SetTag { tag } => set_tag(ctx, &tag),
    }
}

fn drift(ctx: Ctx) -> anyhow::Result<()> {
    if !ctx.paths.config_file.exists() {
        ctx.console.warn("No config file written yet, nothing to compare");
        return Ok(());
    }

    report_drift(&ctx)?;
    Ok(())
}

fn set_tag(mut ctx: Ctx, tag: &str) -> anyhow::Result<()> {
    std::fs::create_dir_all(&ctx.paths.config_dir)?;
    ctx.config.update_image_tag(tag, &ctx.paths.config_file)?;
    ctx.console.success(&format!("Image tag set to {tag}"));

    // Keep the compose file in step with the new tag.
    if ctx.paths.compose_file.exists() {
        templates::write_compose(&ctx.config, &ctx.paths.compose_file)?;
        ctx.console.info("Regenerated docker-compose.yml, restart to apply");
    }
    Ok(())
}
