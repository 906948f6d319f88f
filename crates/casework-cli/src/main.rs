//! Casework CLI: run a scenario test library
//!
//! ## Usage
//!
//! ```bash
//! casework -lib sample                          # Run everything
//! casework /lib:sample /tag:smoke /list         # Show what a tag selects
//! casework -lib sample -extag slow -rerun 2     # Skip slow cases, retry twice
//! casework -lib sample -answerfile casework.answer
//! ```
//!
//! The exit code is the number of failed plus skipped attempts (capped at
//! 254); 255 means the run could not start.

use casework_cli::{
    CliError, CliResult, HarnessArgs, HarnessRunner, LibraryRegistry, Verbosity, LOG_ENV,
};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let code = match run() {
        Ok(code) => code,
        Err(e) => {
            if let CliError::Usage(err) = &e {
                let _ = err.print();
            } else {
                eprintln!("Error: {e}");
            }
            e.exit_code()
        }
    };
    ExitCode::from(u8::try_from(code).unwrap_or(u8::MAX))
}

fn run() -> CliResult<i32> {
    let args = HarnessArgs::parse_normalized(std::env::args())?;
    let config = args.cli_config();
    init_logging(config.verbosity);

    let mut runner = HarnessRunner::new(LibraryRegistry::builtin(), config);
    runner.run(&args)
}

fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(verbosity.default_log_filter()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
