//! Rare-disease subreddit candidate scanner.

use clap::Parser;
use orpha_cli::{run_build_model, run_scan, Cli, Command};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Command::BuildModel(args)) => {
            let count = run_build_model(&args)?;
            tracing::info!(
                "Model written to {} with {} patterns",
                args.model.display(),
                count
            );
        }
        None => {
            let outcome = run_scan(&cli.scan)?;
            if !outcome.has_candidates() {
                tracing::warn!("No candidate subreddits found");
            }
        }
    }

    Ok(())
}
