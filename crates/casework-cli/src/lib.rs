//! Casework CLI Library
//!
//! Command-line front end for the Casework scenario test harness: flag
//! normalization, library lookup, progress output and the `list` dry run.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod args;
mod config;
mod error;
mod output;
pub mod registry;
mod runner;
pub mod sample;
pub mod tree;

pub use args::{normalize_args, ColorArg, HarnessArgs};
pub use config::{CliConfig, ColorChoice, Verbosity, LOG_ENV};
pub use error::{CliError, CliResult};
pub use output::{ConsoleOperator, ProgressReporter};
pub use registry::LibraryRegistry;
pub use runner::HarnessRunner;
pub use tree::{render_tree, TreeConfig};
