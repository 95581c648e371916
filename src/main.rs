//! carprice - Main Entry Point
//!
//! Trains, applies and evaluates the used-vehicle price model.

use clap::Parser;
use carprice::cli::{cmd_evaluate, cmd_predict, cmd_train, Cli, Commands, TrainOverrides};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "carprice=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train { config, train, test, model_out, metrics_out, cv_folds, seed, jobs } => {
            let overrides = TrainOverrides { train, test, model_out, metrics_out, cv_folds, seed, jobs };
            cmd_train(config.as_deref(), overrides)?;
        }
        Commands::Predict { model, data, output } => {
            cmd_predict(&model, &data, output.as_deref())?;
        }
        Commands::Evaluate { model, data, name, output } => {
            cmd_evaluate(&model, &data, &name, output.as_deref())?;
        }
    }

    Ok(())
}
