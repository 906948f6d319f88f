//! Result Aggregator: run-level counters, summary text and the answer file.
//!
//! One aggregator is owned by the controlling thread for the whole run.
//! Pass count is derived, never stored: `total_run - fail_count - skip_count`.
//!
//! ```text
//! ===Result Summary===
//! Total Run: 3
//! Pass: 1
//! Fail: 2
//! Skip: 0
//! Exclude: 0
//! ===Failed Cases===
//! Blobs.Download
//! Blobs.Copy
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Header printed before the counters
pub const SUMMARY_HEADER: &str = "===Result Summary===";
/// Header of the failed case list
pub const FAILED_HEADER: &str = "===Failed Cases===";
/// Header of the skipped case list
pub const SKIPPED_HEADER: &str = "===Skipped Cases===";
/// Header of the excluded case list
pub const EXCLUDED_HEADER: &str = "===Excluded Cases===";

/// Highest exit code a completed run can report
pub const MAX_RUN_EXIT_CODE: i32 = 254;
/// Exit code of a run aborted by a fatal error
pub const FATAL_EXIT_CODE: i32 = 255;

/// Counters and case lists for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultAggregator {
    total_run: usize,
    fail_count: usize,
    skip_count: usize,
    failed_cases: Vec<String>,
    skipped_cases: Vec<String>,
    excluded_cases: Vec<String>,
}

impl ResultAggregator {
    /// Create an empty aggregator
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A case selected to run that never executed
    pub fn record_skip(&mut self, qualified_name: &str) {
        self.total_run += 1;
        self.skip_count += 1;
        self.skipped_cases.push(qualified_name.to_string());
    }

    /// A case removed by an exclude tag
    pub fn record_exclude(&mut self, qualified_name: &str) {
        self.excluded_cases.push(qualified_name.to_string());
    }

    /// One finished attempt
    pub fn record_outcome(&mut self, qualified_name: &str, passed: bool) {
        self.total_run += 1;
        if !passed {
            self.fail_count += 1;
            self.failed_cases.push(qualified_name.to_string());
        }
    }

    /// Attempts run plus skipped cases
    #[must_use]
    pub const fn total_run(&self) -> usize {
        self.total_run
    }

    /// Derived pass count
    #[must_use]
    pub const fn pass_count(&self) -> usize {
        self.total_run
            .saturating_sub(self.fail_count)
            .saturating_sub(self.skip_count)
    }

    /// Failed attempts
    #[must_use]
    pub const fn fail_count(&self) -> usize {
        self.fail_count
    }

    /// Skipped cases
    #[must_use]
    pub const fn skip_count(&self) -> usize {
        self.skip_count
    }

    /// Excluded cases
    #[must_use]
    pub fn exclude_count(&self) -> usize {
        self.excluded_cases.len()
    }

    /// Failed attempts, in order (a rerun case may appear more than once)
    #[must_use]
    pub fn failed_cases(&self) -> &[String] {
        &self.failed_cases
    }

    /// Skipped cases, in order
    #[must_use]
    pub fn skipped_cases(&self) -> &[String] {
        &self.skipped_cases
    }

    /// Excluded cases, in order
    #[must_use]
    pub fn excluded_cases(&self) -> &[String] {
        &self.excluded_cases
    }

    /// `fail_count + skip_count`; zero means a full pass
    #[must_use]
    pub const fn failure_total(&self) -> usize {
        self.fail_count + self.skip_count
    }

    /// Process exit code: `fail + skip`, saturated below the fatal code
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::try_from(self.failure_total())
            .unwrap_or(MAX_RUN_EXIT_CODE)
            .min(MAX_RUN_EXIT_CODE)
    }

    /// Check if nothing failed or was skipped
    #[must_use]
    pub const fn all_passed(&self) -> bool {
        self.failure_total() == 0
    }

    /// Render the summary block
    #[must_use]
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        out.push_str(SUMMARY_HEADER);
        out.push('\n');
        out.push_str(&format!("Total Run: {}\n", self.total_run));
        out.push_str(&format!("Pass: {}\n", self.pass_count()));
        out.push_str(&format!("Fail: {}\n", self.fail_count));
        out.push_str(&format!("Skip: {}\n", self.skip_count));
        out.push_str(&format!("Exclude: {}\n", self.exclude_count()));

        for (header, cases) in [
            (FAILED_HEADER, &self.failed_cases),
            (SKIPPED_HEADER, &self.skipped_cases),
            (EXCLUDED_HEADER, &self.excluded_cases),
        ] {
            if cases.is_empty() {
                continue;
            }
            out.push_str(header);
            out.push('\n');
            for case in cases {
                out.push_str(case);
                out.push('\n');
            }
        }
        out
    }

    /// Print the summary to stdout
    pub fn print_summary(&self) {
        print!("{}", self.render_summary());
    }

    /// Failed cases then skipped cases, each name once
    #[must_use]
    pub fn answer_entries(&self) -> Vec<&str> {
        let mut entries: Vec<&str> = Vec::new();
        for case in self.failed_cases.iter().chain(&self.skipped_cases) {
            if !entries.contains(&case.as_str()) {
                entries.push(case);
            }
        }
        entries
    }

    /// Write the answer file when anything failed or was skipped.
    ///
    /// Overwrites previous content. Returns whether a file was written; an
    /// all-green run leaves any previous file untouched.
    pub fn persist_answer_file(&self, path: &Path) -> std::io::Result<bool> {
        let entries = self.answer_entries();
        if entries.is_empty() {
            return Ok(false);
        }
        let mut content = entries.join("\n");
        content.push('\n');
        std::fs::write(path, content)?;
        Ok(true)
    }
}
