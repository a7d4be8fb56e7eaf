use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use svitlo::commands;
use svitlo::config::Config;
use svitlo::i18n;

#[derive(Parser)]
#[command(
    name = "svitlo",
    version,
    about = "Household power availability tracker with outage-schedule notifications",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML config file (environment variables otherwise)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook server, schedule watchdog and metrics endpoint
    Serve,

    /// Print the current grid status and rolling uptime
    Status,

    /// Print per-day availability reports
    Today {
        /// Number of trailing days to report
        #[arg(short, long, default_value = "1")]
        days: u32,
    },

    /// Fetch and print the outage timetable
    Schedule {
        /// Show tomorrow instead of today
        #[arg(long, default_value = "false")]
        tomorrow: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(&cli.log_format, cli.verbose)?;
    i18n::init_from_env();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    match cli.command {
        Commands::Serve => {
            tracing::info!(
                port = config.web.port,
                feed_enabled = config.schedule.enabled(),
                "starting serve command"
            );
            commands::serve(config).await?;
        }

        Commands::Status => {
            commands::status(&config)?;
        }

        Commands::Today { days } => {
            commands::today(&config, days)?;
        }

        Commands::Schedule { tomorrow } => {
            commands::schedule(&config, tomorrow).await?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("svitlo=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("svitlo=info,warn")
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
