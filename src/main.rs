use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use fxledger::core::log::init_logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for fxledger::AppCommand {
    fn from(cmd: Commands) -> fxledger::AppCommand {
        match cmd {
            Commands::Convert {
                date,
                amount,
                from,
                to,
            } => fxledger::AppCommand::Convert {
                date,
                amount,
                from,
                to,
            },
            Commands::Ledger { input, output } => fxledger::AppCommand::Ledger { input, output },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert an amount with the rate in force on a date
    Convert {
        /// Transaction date (YYYY-MM-DD)
        #[arg(short, long)]
        date: NaiveDate,
        /// Amount in the source currency
        #[arg(short, long, allow_negative_numbers = true)]
        amount: f64,
        /// Source currency (EUR, USD or BRL)
        #[arg(short, long)]
        from: String,
        /// Target currency (EUR, USD or BRL)
        #[arg(short, long)]
        to: String,
    },
    /// Backfill EUR, USD and BRL amounts for parsed statement transactions
    Ledger {
        /// CSV of transactions produced by the statement parsers
        #[arg(short, long)]
        input: PathBuf,
        /// Where to write the ledger CSV
        #[arg(short, long, default_value = "output.csv")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => fxledger::cli::setup::setup(),
        Some(cmd) => fxledger::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
