//! cloudsweep CLI
//!
//! Collects AWS logs, table items, queue messages and role policies.

use clap::Parser;
use std::process::ExitCode;
use tracing::error;

mod args;
mod run;

use args::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Cli::parse();

    if let Err(e) = cs_cli_common::init_logging(args.global.log_level) {
        eprintln!("Error: {e:#}");
        return ExitCode::from(1);
    }

    match run::execute(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(run::exit_code(&e))
        }
    }
}
