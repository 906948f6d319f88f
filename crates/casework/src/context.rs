//! Execution context handed to hooks and test bodies.
//!
//! A context is created once per test class from the run-level properties,
//! then updated by the executor before every attempt. Each attempt gets a
//! clone carrying a fresh [`CancellationToken`].

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Property key for the free-form target language passed with `lang`
pub const PROPERTY_LANG: &str = "lang";
/// Property key for the run configuration/data file passed with `config`
pub const PROPERTY_CONFIG: &str = "config";

/// Cooperative cancellation flag shared between the controller and a worker.
///
/// The controller raises it when an attempt times out. The worker is not
/// joined afterwards, so honoring the flag is up to the test body.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check whether the flag has been raised
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Per-run, per-class, per-method state visible to test code
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    class_name: String,
    method_name: String,
    attempt: u32,
    properties: BTreeMap<String, String>,
    cancellation: CancellationToken,
}

impl ExecutionContext {
    /// Create a context seeded with run-level properties
    #[must_use]
    pub fn new(properties: BTreeMap<String, String>) -> Self {
        Self {
            properties,
            ..Self::default()
        }
    }

    /// Context for a class about to run; no method is current yet
    #[must_use]
    pub fn for_class(properties: BTreeMap<String, String>, class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Self::new(properties)
        }
    }

    /// Point the context at the next attempt of `method_name`.
    ///
    /// Installs a fresh cancellation token so a previous, abandoned attempt
    /// cannot be confused with this one.
    pub fn begin_attempt(&mut self, method_name: impl Into<String>, attempt: u32) {
        self.method_name = method_name.into();
        self.attempt = attempt;
        self.cancellation = CancellationToken::new();
    }

    /// Leave method scope before class-level hooks run again
    pub fn clear_method(&mut self) {
        self.method_name.clear();
        self.attempt = 0;
    }

    /// Current class name
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Current method name (empty while class-level hooks run)
    #[must_use]
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    /// `ClassName.MethodName` of the current case
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.class_name, self.method_name)
    }

    /// Zero-based attempt index (non-zero only when rerunning)
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Look up a property
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Set a property for the remainder of this class
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    /// All properties
    #[must_use]
    pub const fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// The `lang` run option, if given
    #[must_use]
    pub fn lang(&self) -> Option<&str> {
        self.property(PROPERTY_LANG)
    }

    /// The `config` run option, if given
    #[must_use]
    pub fn config_path(&self) -> Option<&str> {
        self.property(PROPERTY_CONFIG)
    }

    /// Token of the current attempt
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Whether the controller gave up on the current attempt
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
