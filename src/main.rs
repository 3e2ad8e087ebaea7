mod args;
mod commands;

use args::{Cli, Commands};
use clap::Parser;
use commands::Ctx;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        commands::completions::cmd_completions(shell);
        return Ok(());
    }

    let ctx = Ctx::load(cli.config_dir, cli.data_dir, cli.verbose)?;

    match cli.command {
        Commands::Up { all } => commands::up::cmd_up(ctx, all).await?,
        Commands::Down { all } => commands::down::cmd_down(ctx, all).await?,
        Commands::Restart { service } => commands::restart::cmd_restart(ctx, service).await?,
        Commands::Status => commands::status::cmd_status(ctx).await?,
        Commands::Logs { service, lines } => commands::logs::cmd_logs(ctx, service, lines).await?,
        Commands::Upgrade => commands::upgrade::cmd_upgrade(ctx).await?,
        Commands::Version { json } => commands::version::cmd_version(ctx, json).await?,
        Commands::Check => commands::check::cmd_check(ctx).await?,
        Commands::Config { command } => commands::config::cmd_config(ctx, command).await?,
        Commands::Inference { command } => commands::inference::cmd_inference(ctx, command).await?,
        Commands::Uninstall { purge_data } => {
            commands::uninstall::cmd_uninstall(ctx, purge_data).await?
        }
        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
