// relist - marketplace listing sync and repricing
//
// One run = one reconciliation pass: scan the profile's listings through
// the bridge, diff against the CSV ledger, persist the new ledger, and
// (in apply mode) push the approved price changes back.

mod bridge;
mod check;
mod config;
mod exit_codes;
mod run;
mod worklist;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{EXIT_RUN_LEDGER, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "relist")]
#[command(about = "Sync marketplace listings to a CSV ledger and apply percentage repricing")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one sync pass (dry-run by default)
    #[command(after_help = "\
The ledger is the control panel: edit change_percent and floor_price per
row, set status to 'removed' to retire a row by hand. A dry run plans and
persists bookkeeping (additions, removals) but never touches prices.

Examples:
  relist run --profile 12345
  relist run --profile 12345 --apply
  relist run --profile 12345 --manual --worklist today.html
  relist run --profile 12345 --apply --only-ids 111,222 --limit 5
  relist run --profile 12345 --percent -15 --title-contains nike
  relist run --profile 12345 --json | jq .summary")]
    Run(run::RunArgs),

    /// Verify bridge connectivity, profile access, and ledger health
    #[command(after_help = "\
Examples:
  relist check
  relist check --config prod.toml
  relist check --bridge-url http://127.0.0.1:7878")]
    Check {
        /// Config file (default: ./relist.toml if present)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Bridge base URL (overrides config)
        #[arg(long, env = "RELIST_BRIDGE_URL", value_name = "URL")]
        bridge_url: Option<String>,

        /// Profile whose listings are scanned (overrides config)
        #[arg(long, env = "RELIST_PROFILE")]
        profile: Option<String>,

        /// Ledger CSV path (overrides config)
        #[arg(long, value_name = "PATH")]
        ledger: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => run::cmd_run(args),
        Commands::Check { config: config_path, bridge_url, profile, ledger } => {
            match config::load(config_path.as_deref()) {
                Ok(mut settings) => {
                    if let Some(url) = bridge_url {
                        settings.bridge_url = url;
                    }
                    if let Some(profile) = profile {
                        settings.profile = profile;
                    }
                    let ledger = ledger.unwrap_or_else(|| settings.ledger.clone());
                    check::cmd_check(&settings, &ledger)
                }
                Err(e) => Err(e),
            }
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_RUN_LEDGER, message: msg.into(), hint: None }
    }

    /// Ledger error with a hint for the one recoverable case.
    pub fn ledger(err: relist_io::LedgerError) -> Self {
        let hint = match &err {
            relist_io::LedgerError::MissingColumn(_) => {
                Some("the header row may have been edited; restore it or start a fresh ledger".to_string())
            }
            _ => None,
        };
        Self { code: EXIT_RUN_LEDGER, message: err.to_string(), hint }
    }
}
