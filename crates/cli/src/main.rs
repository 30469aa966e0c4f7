// pairwise CLI - reconcile two CSV record sets from the command line

mod exit_codes;
mod recon;

use std::process::ExitCode;

use clap::{ArgAction, Parser};
use log::LevelFilter;

use exit_codes::{exit_code_for, EXIT_RECON_RUNTIME, EXIT_SUCCESS, EXIT_USAGE};
use pairwise_recon::ReconError;

#[derive(Parser)]
#[command(name = "pairwise")]
#[command(about = "Match two record sets within tolerance and explain what did not match")]
#[command(version)]
struct Cli {
    /// Log verbosity: -v info, -vv debug (RUST_LOG applies otherwise)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: recon::ReconCommands,
}

fn init_logging(verbose: u8) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(LevelFilter::Info);
        }
        _ => {
            builder.filter_level(LevelFilter::Debug);
        }
    }
    builder.format_timestamp(None).target(env_logger::Target::Stderr).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match recon::cmd_recon(cli.command) {
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
        Self { code: EXIT_RECON_RUNTIME, message: msg.into(), hint: None }
    }

    /// Engine error with its registered exit code and, where one helps, a hint.
    pub fn recon(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::MissingColumn { .. } => {
                Some("map CSV headers with [columns.a] / [columns.b] in --config".to_string())
            }
            ReconError::InvalidTolerance(_) => {
                Some("tolerances must be finite and non-negative".to_string())
            }
            ReconError::EmptyInput => Some("both CSV files contain no data rows".to_string()),
            _ => None,
        };
        Self { code: exit_code_for(&err), message: err.to_string(), hint }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
