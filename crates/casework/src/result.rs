//! Result and error types for Casework.
//!
//! Two families live here: [`HarnessError`] for failures of the harness itself
//! (bad input, unloadable library, suite init), and [`CaseError`] for what test
//! bodies and lifecycle hooks report back to the executor.

use thiserror::Error;

/// Result type for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors that stop a harness run
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Malformed or conflicting selection input
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Error message
        message: String,
    },

    /// The test library could not be resolved or loaded
    #[error("Failed to load test library '{library}': {message}")]
    LibraryLoad {
        /// Library name or path as given
        library: String,
        /// Error message
        message: String,
    },

    /// A suite-level init hook failed, nothing else may run
    #[error("Suite initialization failed in {class}: {message}")]
    SuiteInit {
        /// Class declaring the hook
        class: String,
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    /// Create an invalid input error
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a library load error
    #[must_use]
    pub fn library_load(library: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LibraryLoad {
            library: library.into(),
            message: message.into(),
        }
    }

    /// Whether this error was caused by user input rather than by running tests
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidInput { .. } | Self::LibraryLoad { .. })
    }
}

/// Result type returned by test bodies and lifecycle hooks
pub type CaseResult<T> = Result<T, CaseError>;

/// What a test body or hook can report instead of success
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaseError {
    /// An assertion inside the test did not hold
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Any other failure raised by test code
    #[error("{message}")]
    Failed {
        /// Error message
        message: String,
    },

    /// Operator-intervention signal: suspend the run for manual inspection.
    /// Not a failure.
    #[error("Paused: {reason}")]
    Pause {
        /// Why the test asked for a pause
        reason: String,
    },
}

impl CaseError {
    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a generic failure
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Create a pause signal
    #[must_use]
    pub fn pause(reason: impl Into<String>) -> Self {
        Self::Pause {
            reason: reason.into(),
        }
    }

    /// Check if this is the pause signal
    #[must_use]
    pub const fn is_pause(&self) -> bool {
        matches!(self, Self::Pause { .. })
    }
}

impl From<std::io::Error> for CaseError {
    fn from(err: std::io::Error) -> Self {
        Self::failed(format!("I/O error: {err}"))
    }
}

/// Fail the current case with an assertion error unless `condition` holds.
///
/// ```ignore
/// ensure(listing.len() == 3, "expected three blobs")?;
/// ```
pub fn ensure(condition: bool, message: impl Into<String>) -> CaseResult<()> {
    if condition {
        Ok(())
    } else {
        Err(CaseError::assertion(message))
    }
}

/// Fail the current case unless `left == right`.
pub fn ensure_eq<T>(left: T, right: T, context: &str) -> CaseResult<()>
where
    T: PartialEq + std::fmt::Debug,
{
    if left == right {
        Ok(())
    } else {
        Err(CaseError::assertion(format!(
            "{context}: expected {right:?}, got {left:?}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod harness_error_tests {
        use super::*;

        #[test]
        fn test_invalid_input_message() {
            let err = HarnessError::invalid_input("offset out of range");
            assert!(err.to_string().contains("Invalid input"));
            assert!(err.to_string().contains("offset out of range"));
            assert!(err.is_input_error());
        }

        #[test]
        fn test_library_load_message() {
            let err = HarnessError::library_load("StorageScenarios.dll", "not registered");
            assert!(err.to_string().contains("StorageScenarios.dll"));
            assert!(err.is_input_error());
        }

        #[test]
        fn test_suite_init_is_not_input_error() {
            let err = HarnessError::SuiteInit {
                class: "Accounts".to_string(),
                message: "no credentials".to_string(),
            };
            assert!(!err.is_input_error());
            assert!(err.to_string().contains("Accounts"));
        }

        #[test]
        fn test_io_error_from() {
            let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
            let err: HarnessError = io_err.into();
            assert!(err.to_string().contains("I/O"));
        }
    }

    mod case_error_tests {
        use super::*;

        #[test]
        fn test_pause_detection() {
            assert!(CaseError::pause("inspect container").is_pause());
            assert!(!CaseError::failed("boom").is_pause());
            assert!(!CaseError::assertion("nope").is_pause());
        }

        #[test]
        fn test_failed_displays_bare_message() {
            assert_eq!(CaseError::failed("boom").to_string(), "boom");
        }

        #[test]
        fn test_ensure() {
            assert!(ensure(true, "fine").is_ok());
            assert_eq!(
                ensure(false, "blob missing"),
                Err(CaseError::assertion("blob missing"))
            );
        }

        #[test]
        fn test_ensure_eq_message() {
            let err = ensure_eq(2, 3, "blob count").unwrap_err();
            let text = err.to_string();
            assert!(text.contains("blob count"));
            assert!(text.contains("expected 3"));
            assert!(text.contains("got 2"));
        }

        #[test]
        fn test_io_error_becomes_failure() {
            let err: CaseError = std::io::Error::other("disk").into();
            assert!(matches!(err, CaseError::Failed { .. }));
        }
    }
}
