//! Harness runner: one `casework` invocation from parsed arguments to exit code

use crate::args::HarnessArgs;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{ConsoleOperator, ProgressReporter};
use crate::registry::LibraryRegistry;
use crate::tree::{render_tree, TreeConfig};
use casework::{
    discover, Executor, FilterEngine, HarnessError, NoopOperator, OperatorHook, ResultAggregator,
};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Drives selection, execution and reporting for one invocation
#[derive(Debug)]
pub struct HarnessRunner {
    registry: LibraryRegistry,
    config: CliConfig,
    reporter: ProgressReporter,
    answer_file: Option<PathBuf>,
}

impl HarnessRunner {
    /// Create a new runner over `registry`
    #[must_use]
    pub fn new(registry: LibraryRegistry, config: CliConfig) -> Self {
        let reporter =
            ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
        Self {
            registry,
            config,
            reporter,
            answer_file: None,
        }
    }

    /// Write the answer file to `path` instead of the working directory
    #[must_use]
    pub fn with_answer_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.answer_file = Some(path.into());
        self
    }

    /// Run one invocation and return the process exit code.
    ///
    /// # Errors
    ///
    /// Returns error on invalid selection input, when the library cannot be
    /// resolved or loaded, and when suite initialization fails. All of these
    /// map to the fatal exit code.
    pub fn run(&mut self, args: &HarnessArgs) -> CliResult<i32> {
        // Input errors surface before the library is touched.
        let engine = FilterEngine::prepare(args.selection_criteria())?;

        let provider = self.registry.resolve(&args.lib)?;
        let mut suite = discover(provider.as_ref())?;
        let mut aggregator = ResultAggregator::new();
        let report = engine.apply(&mut suite, &mut aggregator)?;
        debug!(?report, "selection");

        if args.list {
            print!(
                "{}",
                render_tree(&suite, &report.excluded, &TreeConfig::default())
            );
            return Ok(0);
        }

        let mut harness_config = args.harness_config();
        if let Some(path) = &self.answer_file {
            harness_config = harness_config.with_answer_file(path);
        }
        let answer_path = harness_config.answer_file.clone();
        let attempts_per_case = u64::from(harness_config.attempts_per_case());

        let executor = Executor::new(harness_config).with_operator(Self::operator());
        let planned = executor.planned_attempts(&suite) as u64;
        if planned == 0 {
            self.reporter.warning("No test cases selected");
        }
        self.reporter
            .start_progress(planned, attempts_per_case, &suite.library);

        let start = Instant::now();
        match executor.run(&suite, &mut aggregator, &self.reporter) {
            Ok(run) => {
                debug!(
                    run_id = %run.run_id,
                    classes = run.classes_run,
                    attempts = run.attempts,
                    "executor finished"
                );
                if self.config.verbosity.is_verbose() {
                    self.reporter.info(&format!(
                        "run {}: {} class(es), {} attempt(s) in {:.2}s",
                        run.run_id,
                        run.classes_run,
                        run.attempts,
                        run.elapsed.as_secs_f64()
                    ));
                }
            }
            Err(err @ HarnessError::SuiteInit { .. }) => {
                self.reporter.finish();
                return Err(CliError::test_execution(err.to_string()));
            }
            Err(err) => {
                self.reporter.finish();
                return Err(err.into());
            }
        }

        aggregator.print_summary();
        self.reporter.verdict(&aggregator, start.elapsed());

        match aggregator.persist_answer_file(&answer_path) {
            Ok(true) => info!(path = %answer_path.display(), "answer file written"),
            Ok(false) => debug!("nothing to rerun; answer file not written"),
            Err(err) => {
                warn!(path = %answer_path.display(), %err, "could not write answer file");
                self.reporter.warning(&format!(
                    "could not write answer file {}: {err}",
                    answer_path.display()
                ));
            }
        }

        Ok(aggregator.exit_code())
    }

    fn operator() -> Arc<dyn OperatorHook> {
        if std::io::stdin().is_terminal() {
            Arc::new(ConsoleOperator::new())
        } else {
            Arc::new(NoopOperator)
        }
    }

    /// Get the configuration
    #[must_use]
    pub const fn config(&self) -> &CliConfig {
        &self.config
    }

    /// Get the reporter (for testing)
    #[must_use]
    pub const fn reporter(&self) -> &ProgressReporter {
        &self.reporter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColorChoice, Verbosity};
    use casework::{
        ensure, CaseError, CaseMetadata, ExecutionContext, HookKind, SuiteLibrary, TypeDescriptor,
    };
    use tempfile::TempDir;

    fn ok(_: &ExecutionContext) -> casework::CaseResult<()> {
        Ok(())
    }

    fn broken(_: &ExecutionContext) -> casework::CaseResult<()> {
        ensure(false, "broken on purpose")
    }

    fn registry() -> LibraryRegistry {
        let mut registry = LibraryRegistry::new();
        let library = SuiteLibrary::new("orders")
            .with_type(|| {
                TypeDescriptor::test_group("Orders")
                    .case_with("Create", CaseMetadata::new().with_tags(["smoke"]), ok)
                    .case_with("Refund", CaseMetadata::new().with_tags(["slow"]), broken)
            })
            .with_type(|| TypeDescriptor::test_group("Invoices").case("Render", ok));
        registry.register("orders", Arc::new(library)).unwrap();

        let failing_init = SuiteLibrary::new("unstable").with_type(|| {
            TypeDescriptor::test_group("Unstable")
                .hook(HookKind::SuiteInit, |_: &ExecutionContext| {
                    Err(CaseError::failed("database unavailable"))
                })
                .case("Never", ok)
        });
        registry.register("unstable", Arc::new(failing_init)).unwrap();
        registry
    }

    fn quiet() -> CliConfig {
        CliConfig::new()
            .with_verbosity(Verbosity::Quiet)
            .with_color(ColorChoice::Never)
    }

    fn args(extra: &[&str]) -> HarnessArgs {
        let mut raw = vec!["casework"];
        raw.extend_from_slice(extra);
        HarnessArgs::parse_normalized(raw).unwrap()
    }

    fn runner(dir: &TempDir) -> HarnessRunner {
        HarnessRunner::new(registry(), quiet()).with_answer_file(dir.path().join("casework.answer"))
    }

    mod execution_tests {
        use super::*;

        #[test]
        fn test_failures_set_exit_code_and_answer_file() {
            let dir = TempDir::new().unwrap();
            let code = runner(&dir).run(&args(&["-lib", "orders"])).unwrap();
            assert_eq!(code, 1);
            let answer = std::fs::read_to_string(dir.path().join("casework.answer")).unwrap();
            assert_eq!(answer, "Orders.Refund\n");
        }

        #[test]
        fn test_full_pass_writes_nothing() {
            let dir = TempDir::new().unwrap();
            let code = runner(&dir)
                .run(&args(&["-lib", "orders", "-extag", "slow"]))
                .unwrap();
            assert_eq!(code, 0);
            assert!(!dir.path().join("casework.answer").exists());
        }

        #[test]
        fn test_rerun_counts_every_attempt() {
            let dir = TempDir::new().unwrap();
            let code = runner(&dir)
                .run(&args(&["-lib", "orders", "-case", "Refund", "-rerun", "2"]))
                .unwrap();
            assert_eq!(code, 3);
        }

        #[test]
        fn test_verbose_run_reports_same_exit_code() {
            let dir = TempDir::new().unwrap();
            let config = CliConfig::new()
                .with_verbosity(Verbosity::Verbose)
                .with_color(ColorChoice::Never);
            let mut runner = HarnessRunner::new(registry(), config)
                .with_answer_file(dir.path().join("casework.answer"));
            assert!(runner.config().verbosity.is_verbose());
            assert_eq!(runner.run(&args(&["-lib", "orders"])).unwrap(), 1);
        }

        #[test]
        fn test_answer_file_ignores_window() {
            let dir = TempDir::new().unwrap();
            let answer = dir.path().join("rerun.txt");
            std::fs::write(&answer, "Orders.Create\nInvoices.Render\n").unwrap();
            let answer = answer.to_string_lossy().to_string();
            let code = runner(&dir)
                .run(&args(&["-lib", "orders", "-answerfile", &answer, "-offset", "5"]))
                .unwrap();
            assert_eq!(code, 0);
        }

        #[test]
        fn test_suite_init_failure_is_fatal() {
            let dir = TempDir::new().unwrap();
            let err = runner(&dir).run(&args(&["-lib", "unstable"])).unwrap_err();
            assert!(matches!(err, CliError::TestExecution { .. }));
            assert!(err.to_string().contains("database unavailable"));
            assert_eq!(err.exit_code(), 255);
            // No summary means no answer file either.
            assert!(!dir.path().join("casework.answer").exists());
        }
    }

    mod input_tests {
        use super::*;

        #[test]
        fn test_conflict_rejected_before_library_lookup() {
            let dir = TempDir::new().unwrap();
            let answer = dir.path().join("rerun.txt");
            std::fs::write(&answer, "Orders.Create\n").unwrap();
            let answer = answer.to_string_lossy().to_string();

            let err = runner(&dir)
                .run(&args(&["-lib", "missing", "-answerfile", &answer, "-tag", "smoke"]))
                .unwrap_err();
            assert!(matches!(
                err,
                CliError::Harness(HarnessError::InvalidInput { .. })
            ));
        }

        #[test]
        fn test_blank_tag_conflicts_with_answer_file() {
            let dir = TempDir::new().unwrap();
            let answer = dir.path().join("rerun.txt");
            std::fs::write(&answer, "Orders.Create\n").unwrap();
            let answer = answer.to_string_lossy().to_string();

            let err = runner(&dir)
                .run(&args(&["-lib", "orders", "-answerfile", &answer, "-tag", ""]))
                .unwrap_err();
            assert!(matches!(
                err,
                CliError::Harness(HarnessError::InvalidInput { .. })
            ));
        }

        #[test]
        fn test_unknown_library() {
            let dir = TempDir::new().unwrap();
            let err = runner(&dir).run(&args(&["-lib", "missing"])).unwrap_err();
            assert!(matches!(
                err,
                CliError::Harness(HarnessError::LibraryLoad { .. })
            ));
        }

        #[test]
        fn test_offset_out_of_range() {
            let dir = TempDir::new().unwrap();
            let err = runner(&dir)
                .run(&args(&["-lib", "orders", "-offset", "7"]))
                .unwrap_err();
            assert_eq!(err.exit_code(), 255);
        }
    }

    mod list_tests {
        use super::*;

        #[test]
        fn test_list_runs_nothing() {
            let dir = TempDir::new().unwrap();
            let code = runner(&dir)
                .run(&args(&["-lib", "unstable", "-list"]))
                .unwrap();
            // Suite init would fail if anything ran.
            assert_eq!(code, 0);
            assert!(!dir.path().join("casework.answer").exists());
        }
    }

    #[test]
    fn test_reporter_follows_config() {
        let runner = HarnessRunner::new(registry(), quiet());
        assert!(runner.reporter().quiet);
        assert!(!runner.reporter().use_color);
        assert_eq!(runner.config().verbosity, Verbosity::Quiet);
    }
}
