//! Progress reporting and the interactive pause handler

use casework::{AttemptOutcome, OperatorHook, ResultAggregator, RunObserver};
use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::warn;

/// Progress reporter for a harness run.
///
/// Writes to stderr so stdout carries only the summary.
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    attempts_per_case: u64,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            attempts_per_case: 1,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar over `total` attempts
    pub fn start_progress(&mut self, total: u64, attempts_per_case: u64, message: &str) {
        self.attempts_per_case = attempts_per_case.max(1);
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Increment progress
    pub fn increment(&self, delta: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    /// Update progress message
    pub fn set_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(message.to_string());
        }
    }

    /// Finish progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    fn write_line(&self, line: &str) {
        match self.progress_bar {
            Some(ref pb) if !pb.is_hidden() => pb.println(line),
            _ => {
                let _ = self.term.write_line(line);
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "PASS".to_string()
        };

        self.write_line(&format!("{prefix} {message}"));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Always print failures, even in quiet mode
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };

        self.write_line(&format!("{prefix} {message}"));
    }

    /// Print a skip message
    pub fn skipped(&self, message: &str) {
        let prefix = if self.use_color {
            style("-").yellow().bold().to_string()
        } else {
            "SKIP".to_string()
        };

        self.write_line(&format!("{prefix} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("⚠").yellow().bold().to_string()
        } else {
            "WARN".to_string()
        };

        self.write_line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };

        self.write_line(&format!("{prefix} {message}"));
    }

    /// Print the one-line run verdict
    pub fn verdict(&self, aggregator: &ResultAggregator, duration: Duration) {
        if self.quiet && aggregator.all_passed() {
            return;
        }

        let total = aggregator.total_run();
        let passed = aggregator.pass_count();
        let failed = aggregator.fail_count();
        let skipped = aggregator.skip_count();
        let duration_secs = duration.as_secs_f64();

        let line = if self.use_color {
            let passed_style = Style::new().green().bold();
            let failed_style = Style::new().red().bold();
            let skipped_style = Style::new().yellow();

            let status = if aggregator.all_passed() {
                passed_style.apply_to("PASSED")
            } else {
                failed_style.apply_to("FAILED")
            };

            format!(
                "{} {} attempts in {:.2}s ({} passed, {} failed, {} skipped)",
                status,
                total,
                duration_secs,
                passed_style.apply_to(passed),
                if failed > 0 {
                    failed_style.apply_to(failed).to_string()
                } else {
                    failed.to_string()
                },
                skipped_style.apply_to(skipped)
            )
        } else {
            let status = if aggregator.all_passed() {
                "PASSED"
            } else {
                "FAILED"
            };
            format!(
                "{status} {total} attempts in {duration_secs:.2}s ({passed} passed, {failed} failed, {skipped} skipped)"
            )
        };
        let _ = self.term.write_line(&line);
    }

    fn attempt_label(qualified_name: &str, attempt: u32) -> String {
        if attempt == 0 {
            qualified_name.to_string()
        } else {
            format!("{qualified_name} (rerun {attempt})")
        }
    }
}

impl RunObserver for ProgressReporter {
    fn class_started(&self, class: &str, active_cases: usize) {
        self.set_message(class);
        if !self.quiet && self.progress_bar.is_none() {
            self.info(&format!("{class}: {active_cases} case(s)"));
        }
    }

    fn attempt_finished(&self, qualified_name: &str, attempt: u32, outcome: &AttemptOutcome) {
        self.increment(1);
        let label = Self::attempt_label(qualified_name, attempt);
        match outcome {
            AttemptOutcome::Passed => self.success(&label),
            AttemptOutcome::Paused { reason } => self.warning(&format!("{label} paused: {reason}")),
            other => {
                let detail = other.detail().unwrap_or_default();
                self.failure(&format!("{label} [{}] {detail}", other.label()));
            }
        }
    }

    fn case_skipped(&self, qualified_name: &str, reason: &str) {
        self.increment(self.attempts_per_case);
        self.skipped(&format!("{qualified_name}: {reason}"));
    }

    fn run_finished(&self, _aggregator: &ResultAggregator) {
        self.finish();
    }
}

/// Pause handler that waits for Enter on the terminal
#[derive(Debug, Clone)]
pub struct ConsoleOperator {
    term: Term,
}

impl Default for ConsoleOperator {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleOperator {
    /// Create a handler bound to stderr
    #[must_use]
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }
}

impl OperatorHook for ConsoleOperator {
    fn pause(&self, qualified_name: &str, reason: &str) {
        let _ = self.term.write_line(&format!(
            "{} {qualified_name}: {reason}",
            style("PAUSED").yellow().bold()
        ));
        let _ = self.term.write_line("Press Enter to continue...");
        if let Err(err) = self.term.read_line() {
            warn!(%err, "could not read operator input; resuming");
        }
    }
}
