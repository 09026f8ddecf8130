use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use briefscope::config::Config;
use briefscope::models::Period;

mod commands;

#[derive(Parser)]
#[command(
    name = "briefscope",
    version,
    about = "Research brief metadata normalization and keyword trend analysis",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML); environment variables are used otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path, overriding the configuration
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load flat harvester records (CSV, JSON Lines or JSON array)
    Load {
        /// Input file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Apply canonical mappings to tags, keywords, geo terms and funders
    Normalize {
        /// Extra mapping file (TOML) overlaid on the built-in tables
        #[arg(short, long)]
        mappings: Option<PathBuf>,
    },

    /// Build the keyword × period matrix and classify trends
    Trends,

    /// Keyword co-occurrence for one period
    Cooccur {
        /// Period to analyze (e.g. 2024Q2); defaults to the latest
        #[arg(short, long)]
        period: Option<Period>,

        /// Minimum number of shared publications
        #[arg(long)]
        min_freq: Option<u64>,
    },

    /// Print summary statistics about the store
    Explore,

    /// Run load, normalize, trends and co-occurrence in order
    Run {
        /// Input file to load first
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Extra mapping file (TOML)
        #[arg(short, long)]
        mappings: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref(), cli.db)?;

    // Initialize tracing/logging
    let log_format = cli
        .log_format
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    tracing::info!("briefscope starting");

    match cli.command {
        Commands::Load { input } => {
            tracing::info!(input = %input.display(), "Starting load command");
            commands::load(config, &input)?;
        }

        Commands::Normalize { mappings } => {
            tracing::info!(mappings = ?mappings, "Starting normalize command");
            commands::normalize(config, mappings.as_deref())?;
        }

        Commands::Trends => {
            tracing::info!("Starting trends command");
            commands::trends(config)?;
        }

        Commands::Cooccur { period, min_freq } => {
            tracing::info!(
                period = ?period,
                min_freq = ?min_freq,
                "Starting cooccur command"
            );
            commands::cooccur(config, period, min_freq)?;
        }

        Commands::Explore => {
            tracing::info!("Starting explore command");
            commands::explore(config)?;
        }

        Commands::Run { input, mappings } => {
            tracing::info!(
                input = ?input,
                mappings = ?mappings,
                "Starting run command"
            );
            commands::run(config, input.as_deref(), mappings.as_deref())?;
        }
    }

    tracing::info!("briefscope completed successfully");
    Ok(())
}

fn load_config(path: Option<&std::path::Path>, db: Option<PathBuf>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::from_env().context("Failed to read configuration from environment")?,
    };

    if let Some(db) = db {
        config.database.sqlite_path = db;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("briefscope=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new(format!("briefscope={level},warn"))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
