//! migralog - statistical report for a migraine log

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use migralog_cli::{run_report, run_summary, Cli, Commands};
use migralog_config::AppConfig;
use migralog_obs::LogFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Observability
    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    migralog_obs::init("migralog", format);

    // Config
    let cfg = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AppConfig::load().context("failed to load config")?,
    };

    match cli.command {
        Commands::Report(args) => {
            let path = run_report(&cfg, &args).await?;
            info!(path = %path.display(), "report complete");
            println!("{}", path.display());
        }
        Commands::Summary { log } => {
            print!("{}", run_summary(&log).await?);
        }
    }
    Ok(())
}
