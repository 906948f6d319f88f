//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// Test execution error
    #[error("Test execution failed: {message}")]
    TestExecution {
        /// Error message
        message: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Harness error
    #[error("{0}")]
    Harness(#[from] casework::HarnessError),

    /// Command line could not be parsed, or help/version was requested
    #[error("{0}")]
    Usage(#[from] clap::Error),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a test execution error
    #[must_use]
    pub fn test_execution(message: impl Into<String>) -> Self {
        Self::TestExecution {
            message: message.into(),
        }
    }

    /// Whether this is a help or version request rather than a failure
    #[must_use]
    pub fn is_informational(&self) -> bool {
        matches!(self, Self::Usage(err) if !err.use_stderr())
    }

    /// Process exit code: 0 for help/version, fatal otherwise
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.is_informational() {
            0
        } else {
            casework::FATAL_EXIT_CODE
        }
    }
}
