//! Run configuration

use crate::context::{PROPERTY_CONFIG, PROPERTY_LANG};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// File name of the re-run list written after a run
pub const ANSWER_FILE_NAME: &str = "casework.answer";

/// Timeout used when neither the method nor the run sets one (10 minutes)
pub const DEFAULT_TIMEOUT_MS: u64 = 600_000;

/// Per-attempt time bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptTimeout {
    /// Wait at most this long
    Bounded(Duration),
    /// Wait until the body returns
    Unbounded,
}

impl AttemptTimeout {
    /// Duration to wait, `None` when unbounded
    #[must_use]
    pub const fn as_duration(self) -> Option<Duration> {
        match self {
            Self::Bounded(d) => Some(d),
            Self::Unbounded => None,
        }
    }
}

/// Configuration for one harness run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Timeout applied when nothing else sets one
    pub default_timeout_ms: u64,
    /// Run-wide timeout in seconds; `Some(0)` disables the bound
    pub global_timeout_secs: Option<u64>,
    /// Extra attempts per case
    pub rerun: u32,
    /// Where the re-run list is written
    pub answer_file: PathBuf,
    /// Properties copied into every class context
    pub properties: BTreeMap<String, String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            global_timeout_secs: None,
            rerun: 0,
            answer_file: PathBuf::from(ANSWER_FILE_NAME),
            properties: BTreeMap::new(),
        }
    }
}

impl HarnessConfig {
    /// Create default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fallback timeout
    #[must_use]
    pub const fn with_default_timeout_ms(mut self, ms: u64) -> Self {
        self.default_timeout_ms = ms;
        self
    }

    /// Set the run-wide timeout in seconds (0 = infinite)
    #[must_use]
    pub const fn with_global_timeout_secs(mut self, secs: u64) -> Self {
        self.global_timeout_secs = Some(secs);
        self
    }

    /// Set the rerun count
    #[must_use]
    pub const fn with_rerun(mut self, rerun: u32) -> Self {
        self.rerun = rerun;
        self
    }

    /// Set the answer file location
    #[must_use]
    pub fn with_answer_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.answer_file = path.into();
        self
    }

    /// Add a context property
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Set the `lang` property
    #[must_use]
    pub fn with_lang(self, lang: impl Into<String>) -> Self {
        self.with_property(PROPERTY_LANG, lang)
    }

    /// Set the `config` property
    #[must_use]
    pub fn with_config_path(self, path: impl Into<String>) -> Self {
        self.with_property(PROPERTY_CONFIG, path)
    }

    /// Attempts per enabled case
    #[must_use]
    pub const fn attempts_per_case(&self) -> u32 {
        self.rerun.saturating_add(1)
    }

    /// Resolve the bound for a method: its own override, then the run-wide
    /// value, then the default.
    #[must_use]
    pub fn timeout_for(&self, method_timeout_ms: Option<u64>) -> AttemptTimeout {
        if let Some(ms) = method_timeout_ms {
            return AttemptTimeout::Bounded(Duration::from_millis(ms));
        }
        match self.global_timeout_secs {
            Some(0) => AttemptTimeout::Unbounded,
            Some(secs) => AttemptTimeout::Bounded(Duration::from_secs(secs)),
            None => AttemptTimeout::Bounded(Duration::from_millis(self.default_timeout_ms)),
        }
    }
}
