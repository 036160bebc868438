use activity_feed::Role;
use alloy_primitives::{Address, U256};
use clap::{Parser, Subcommand};
use eyre::Result;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use config::AppConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration directory
    #[arg(long, default_value = "./configs/dev")]
    config_path: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the recent payroll activity of an address as JSON
    History {
        #[arg(long)]
        address: Address,

        /// employer or employee
        #[arg(long)]
        role: Role,

        /// Maximum number of records
        #[arg(long, default_value_t = 20)]
        max: usize,

        /// Re-run every SECS seconds until interrupted
        #[arg(long, value_name = "SECS")]
        watch: Option<u64>,
    },

    /// Deposit tokens into the payroll contract, approving it first if needed
    Deposit {
        /// Amount in raw token units
        #[arg(long)]
        amount: U256,

        #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
        private_key: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = AppConfig::load(&PathBuf::from(&cli.config_path)).await?;
    config.validate()?;

    tracing::info!(
        rpc_url = %config.rpc_url,
        payroll = %config.payroll_address,
        lookback_blocks = config.feed.lookback(),
        "Config loaded"
    );

    match cli.command {
        Command::History {
            address,
            role,
            max,
            watch,
        } => commands::history::run(&config, address, role, max, watch).await,
        Command::Deposit {
            amount,
            private_key,
        } => commands::deposit::run(&config, amount, &private_key).await,
    }
}
