// Outreach Directory - Main Entry Point
//
// Serves the agency and contact directories over HTTP:
// - Paginated agency listing
// - Paginated contact listing capped by a daily per-user view quota
// - Health and Prometheus endpoints

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use outreach_directory::clock::{Clock, SystemClock};
use outreach_directory::config::Config;
use outreach_directory::quota::token;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// Outreach Directory: quota-gated agency and contact listings
#[derive(Parser, Debug)]
#[command(name = "outreach")]
#[command(author = "Outreach Directory Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Quota-gated agency and contact directory service", long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Path to the configuration file (default: ./outreach.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// Port to listen on (overrides the config file)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Validate and print the effective configuration
    CheckConfig,
    /// Decode a quota token as it would be read today
    DecodeToken {
        /// Token value taken from the quota cookie
        token: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    init_tracing(&config, args.verbose)?;

    match args.command {
        Some(Commands::Serve { port }) => {
            if let Some(port) = port {
                config.server.port = port;
            }
            info!("Outreach Directory v0.1.0 starting...");
            outreach_directory::start_server(config).await?;
        }
        Some(Commands::CheckConfig) => {
            print!("{}", config.to_toml()?);
        }
        Some(Commands::DecodeToken { token: raw }) => {
            decode_token(&raw, config.quota.daily_limit);
        }
        None => {
            info!("No command specified. Use \"outreach --help\" for usage.");
        }
    }

    Ok(())
}

fn init_tracing(config: &Config, verbose: bool) -> Result<()> {
    let level = if verbose {
        Level::DEBUG
    } else {
        config.log_level()?
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.logging.format.to_lowercase().as_str() {
        "json" => builder.json().init(),
        "pretty" => builder.pretty().init(),
        _ => builder.compact().init(),
    }

    Ok(())
}

fn decode_token(raw: &str, daily_limit: u32) {
    let today = SystemClock.today();

    match token::try_decode(raw) {
        Ok(stored) => {
            let effective = stored.rolled_over(today);
            println!("Stored date:  {}", stored.day);
            println!("Stored count: {}", stored.viewed_count);
            if effective != stored {
                println!("Token is from another day; it resets to 0 today ({})", today);
            }
            println!(
                "Remaining today: {}",
                daily_limit.saturating_sub(effective.viewed_count)
            );
        }
        Err(e) => {
            println!("Unreadable token ({}); treated as a fresh quota", e);
            println!("Remaining today: {}", daily_limit);
        }
    }
}
