use anyhow::Result;
use astra::{AstraConfig, tasks::career::CareerProfile};
use clap::Parser;

mod cli_args;
mod play;
mod probe;
mod provider;
mod telemetry;
mod utils;

use cli_args::{CliArgs, Commands};
use provider::task_controller;
use telemetry::setup_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let tracer_provider = setup_logging();
    let args = CliArgs::parse();

    let outcome = run(args).await;

    if let Some(tp) = tracer_provider {
        if let Err(e) = tp.shutdown() {
            log::debug!("tracer shutdown failed: {}", e);
        }
    }
    outcome
}

async fn run(args: CliArgs) -> Result<()> {
    match args.command {
        Commands::Models => return probe::list_models().await,
        Commands::Probe => return probe::probe().await,
        Commands::Connectivity => return probe::connectivity().await,
        _ => {}
    }

    let config = AstraConfig::load(args.config.as_deref())?;
    log::debug!("using model {} with data dir {}", config.model(), config.data_dir().display());

    match args.command {
        Commands::Progress { reset } => play::progress(&config, reset),
        Commands::Trivia { topic } => {
            play::trivia(&config, &task_controller(&config), &topic).await
        }
        Commands::Scan { file } => play::scan(&task_controller(&config), &file).await,
        Commands::Career {
            subjects,
            interests,
        } => {
            let profile = CareerProfile {
                subjects,
                interests,
            };
            play::career(&config, &task_controller(&config), profile).await
        }
        Commands::Models | Commands::Probe | Commands::Connectivity => Ok(()),
    }
}
