//! Command line interface for InstallerGenie.
//!
//! Parses arguments, builds the [`RuntimeConfig`] and dispatches to the
//! subcommand in [`commands`].

pub mod args;
pub mod commands;
mod output;

pub use args::{Args, Command, RuntimeConfig};
pub use output::OutputManager;

use crate::error::Result;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    let runtime = RuntimeConfig::from(&args);
    execute(&args, &runtime).await
}

/// Execute already parsed arguments.
pub async fn execute(args: &Args, runtime: &RuntimeConfig) -> Result<i32> {
    match &args.command {
        Command::Init(init) => commands::init::execute(init, runtime).await,
        Command::Validate(config) => commands::validate::execute(config, runtime).await,
        Command::Departments(departments) => {
            commands::departments::execute(departments, runtime).await
        }
        Command::Generate(generate) => commands::generate::execute(generate, runtime).await,
        Command::Run(run) => commands::run::execute(run, runtime).await,
    }
}
