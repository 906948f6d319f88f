//! Library registry: maps the `lib` option to a registered test library.
//!
//! Libraries are linked into the binary and registered by name. The `lib`
//! value is matched against names exactly first, then by its file stem, so
//! `-lib sample`, `-lib ./sample.dll` and `-lib /opt/suites/Sample.so` all
//! reach the library registered as `sample`.

use crate::error::{CliError, CliResult};
use crate::sample;
use casework::{HarnessError, HarnessResult, TestSuiteProvider};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Name → provider table
#[derive(Clone, Default)]
pub struct LibraryRegistry {
    entries: Vec<(String, Arc<dyn TestSuiteProvider>)>,
}

impl std::fmt::Debug for LibraryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryRegistry")
            .field("libraries", &self.names())
            .finish()
    }
}

impl LibraryRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the libraries shipped in this binary
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.entries.push((
            sample::LIBRARY_NAME.to_string(),
            Arc::new(sample::library()),
        ));
        registry
    }

    /// Register a library under `name`
    pub fn register(
        &mut self,
        name: impl Into<String>,
        provider: Arc<dyn TestSuiteProvider>,
    ) -> CliResult<()> {
        let name = name.into();
        if self.entries.iter().any(|(existing, _)| *existing == name) {
            return Err(CliError::config(format!(
                "library '{name}' is already registered"
            )));
        }
        self.entries.push((name, provider));
        Ok(())
    }

    /// Registered names, in registration order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Find the library for a `lib` value
    pub fn resolve(&self, lib: &str) -> HarnessResult<Arc<dyn TestSuiteProvider>> {
        if let Some((_, provider)) = self.entries.iter().find(|(name, _)| name == lib) {
            return Ok(Arc::clone(provider));
        }

        let stem = Path::new(lib)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        if let Some((name, provider)) = self
            .entries
            .iter()
            .find(|(name, _)| !stem.is_empty() && name.eq_ignore_ascii_case(&stem))
        {
            debug!(lib, library = %name, "resolved library by file stem");
            return Ok(Arc::clone(provider));
        }

        Err(HarnessError::library_load(
            lib,
            format!(
                "no registered library matches (available: {})",
                self.names().join(", ")
            ),
        ))
    }
}
