//! db-probe
//!
//! Reports whether this build can talk to PostgreSQL, and what server the
//! configured database parameters reach. Connection settings come from the
//! `DB_*` environment variables.

use clap::{Parser, Subcommand};
use core_config::tracing::{init_tracing, install_color_eyre};
use core_config::{Environment, FromEnv};
use db_connector::common::connect_with_retry;
use db_connector::postgres::check_health_detailed;
use db_connector::{DatabaseBackend, PostgresConnector, diagnose};
use eyre::{Result, WrapErr};
use tracing::info;

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "db-probe")]
#[command(about = "Check PostgreSQL support, connectivity and server version")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report whether PostgreSQL support is available (exit code 1 if not)
    Check,

    /// Connect and print the server version
    Version {
        /// Connection retries after the first attempt (overrides DB_CONNECT_RETRIES)
        #[arg(short, long)]
        retries: Option<u32>,
    },

    /// Connect and report session health as JSON (exit code 1 if unhealthy)
    Health {
        #[arg(short, long)]
        retries: Option<u32>,
    },

    /// Print a full diagnostics report as JSON; never fails on connection errors
    Diagnose,
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let environment = Environment::from_env();
    init_tracing(&environment);

    let cli = Cli::parse();
    let connector = PostgresConnector::new();

    match cli.command {
        Commands::Check => {
            let supported = connector.is_supported();
            println!(
                "{} support: {}",
                connector.name(),
                if supported { "available" } else { "unavailable" }
            );
            if !supported {
                std::process::exit(1);
            }
        }

        Commands::Version { retries } => {
            let config = Config::from_env()?.with_retries(retries);
            let handle = connect_with_retry(&connector, &config.database, config.retry)
                .await
                .wrap_err("Database configuration problem")?;

            println!("{}", connector.version(&handle).await);
            connector.close(handle).await?;
        }

        Commands::Health { retries } => {
            let config = Config::from_env()?.with_retries(retries);
            let handle = connect_with_retry(&connector, &config.database, config.retry)
                .await
                .wrap_err("Database configuration problem")?;

            let status = check_health_detailed(&handle).await;
            println!("{}", serde_json::to_string_pretty(&status)?);
            connector.close(handle).await?;
            if !status.healthy {
                std::process::exit(1);
            }
        }

        Commands::Diagnose => {
            let config = Config::from_env()?;
            info!(host = config.database.host(), "Running diagnostics");

            let report = diagnose(&connector, &config.database).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
