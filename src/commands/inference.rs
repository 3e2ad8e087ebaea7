use crate::args::InferenceCommands;
use crate::commands::Ctx;
use berth::inference::InferenceEngine;
use berth::LogOptions;

pub(crate) async fn cmd_inference(ctx: Ctx, command: InferenceCommands) -> anyhow::Result<()> {
    let engine = InferenceEngine::new(&ctx.config, &ctx.console);

    match command {
        InferenceCommands::Up => {
            engine.up().await?;
            ctx.record_inference_running(true)?;
        }
        InferenceCommands::Down => {
            engine.down().await?;
            ctx.record_inference_running(false)?;
        }
        InferenceCommands::Status => {
            let info = engine.status().await?;
            println!("{:<16} {:<10} {}", info.name, info.state, info.image);
        }
        InferenceCommands::Logs { lines } => {
            let text = engine.logs(LogOptions { lines }).await?;
            print!("{text}");
        }
    }
    Ok(())
}
