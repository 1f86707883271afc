//! Command line interface.
//!
//! Parses arguments, loads `AppShell.toml` and dispatches to one subcommand
//! handler. Handlers return the process exit code.

mod args;
pub mod commands;
mod output;

pub use args::{Args, Command, RuntimeConfig};
pub use output::OutputManager;

use crate::error::{CliError, Result};

/// Main CLI entry point, for already parsed arguments.
pub async fn run_with(args: Args) -> Result<i32> {
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;
    let runtime = RuntimeConfig::from(&args);

    match &args.command {
        Command::Check => commands::check(&args, &runtime),
        Command::Package => commands::package(&args, &runtime).await,
        Command::Make => commands::make(&args, &runtime).await,
        Command::Fuses { binary } => commands::fuses(binary, &runtime).await,
    }
}

/// Prints an error with its recovery suggestions.
pub fn report_error(error: &crate::error::BundlerError, output: &OutputManager) {
    let _ = output.error(&error.to_string());
    if output.is_quiet() {
        return;
    }
    for suggestion in error.recovery_suggestions() {
        let _ = output.indent(&format!("hint: {suggestion}"));
    }
}
