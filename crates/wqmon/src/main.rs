use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wqmon_core::Config;

mod commands;
use commands::extract::{handle_extract, ExtractArgs};
use commands::plot::{handle_plot, PlotArgs};

/// Water-quality workbook extraction and trend charts
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults are used when omitted
    #[arg(long, global = true, env = "WQMON_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Exports each station sheet of a workbook to its own CSV file.
    Extract(ExtractArgs),
    /// Draws one trend chart per station CSV in a directory.
    Plot(PlotArgs),
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Extract(args) => handle_extract(args, &config),
        Commands::Plot(args) => handle_plot(args, &config),
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => {
            let config = Config::load(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?;
            info!(path = %path.display(), "loaded configuration");
            Ok(config)
        }
        None => Ok(Config::default()),
    }
}
