use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "migralog")]
#[command(about = "Find calendar and weather patterns in a migraine log", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to $MIGRALOG_CONFIG or ./migralog.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full analysis and write the report
    Report(ReportArgs),

    /// Print aggregate counts for a log without running any tests
    Summary {
        /// iHeadache text export
        log: PathBuf,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ReportArgs {
    /// iHeadache text export
    pub log: PathBuf,

    /// Postal code of the place the log was kept
    #[arg(short, long)]
    pub postal_code: Option<String>,

    /// Daily weather CSV to use instead of the configured provider
    #[arg(long)]
    pub weather_csv: Option<PathBuf>,

    /// Meteostat API key
    #[arg(long, env = "METEOSTAT_API_KEY", hide_env_values = true)]
    pub meteostat_key: Option<String>,

    /// Output directory for the report and charts
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
