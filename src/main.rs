//! appshell-bundle - package a prebuilt WebGPU client into a desktop app shell.
//!
//! Exit code 0 means the pipeline ran to the generator stage. Generator
//! failures, including a run where every generator failed, are listed in the
//! make report rather than failing the build. Argument errors exit with 2,
//! every other failure with 1.

use appshell_bundler::cli::{self, Args, OutputManager};
use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // clap prints usage and exits with 2 on argument errors
    let args = Args::parse_args();
    let output = OutputManager::new(false, args.quiet);

    let exit_code = match cli::run_with(args).await {
        Ok(code) => code,
        Err(e) => {
            cli::report_error(&e, &output);
            e.exit_code()
        }
    };

    process::exit(exit_code);
}
