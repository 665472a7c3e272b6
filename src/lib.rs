pub mod cli;
pub mod core;
pub mod providers;

use anyhow::Result;
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::{debug, info};

pub enum AppCommand {
    Convert {
        date: NaiveDate,
        amount: f64,
        from: String,
        to: String,
    },
    Ledger {
        input: PathBuf,
        output: PathBuf,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fxledger starting...");

    let config = match config_path {
        Some(path) => core::config::AppConfig::load_from_path(path)?,
        None => core::config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Convert {
            date,
            amount,
            from,
            to,
        } => cli::convert::run(&config, date, amount, &from, &to).await,
        AppCommand::Ledger { input, output } => cli::ledger::run(&config, &input, &output).await,
    }
}
