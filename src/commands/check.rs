use crate::commands::{report_drift, Ctx};
use berth::Reporter;

pub(crate) async fn cmd_check(ctx: Ctx) -> anyhow::Result<()> {
    ctx.console.info("Validating configuration...");
    ctx.config.validate()?;
    ctx.console.success("Configuration is valid");

    if ctx.paths.config_file.exists() {
        report_drift(&ctx)?;
    }

    let mut ok = true;
    for (name, path) in [
        ("config file", &ctx.paths.config_file),
        ("compose file", &ctx.paths.compose_file),
        ("state file", &ctx.paths.state_file),
    ] {
        if path.exists() {
            ctx.console.debug(&format!("{name}: {}", path.display()));
        } else {
            ctx.console.warn(&format!("Missing {name}: {}", path.display()));
            ok = false;
        }
    }

    if ok {
        ctx.console.success("All required files present");
    } else {
        anyhow::bail!("installation incomplete, run 'berth up'");
    }
    Ok(())
}
