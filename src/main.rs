//! lungcancer-rf - Main Entry Point

use clap::Parser;
use lungcancer_rf::cli::{cmd_info, cmd_train, Cli, Commands, TrainArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lungcancer_rf=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train { data, output, tracking_uri, experiment, index_url, no_index, n_jobs, json } => {
            let args = TrainArgs { tracking_uri, experiment, index_url, no_index, n_jobs, json };
            cmd_train(&data, &output, &args).await?;
        }
        Commands::Info { data } => {
            cmd_info(&data)?;
        }
    }

    Ok(())
}
