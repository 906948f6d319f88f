//! Scheduler/Executor: drives the suite → class → method → attempt lifecycle.
//!
//! ```text
//! SuiteInit
//! for each class with active cases:
//!     ClassInit
//!     for each enabled method:
//!         (TestInit → Execute[timeout] → TestCleanup) × (rerun + 1)
//!     ClassCleanup
//! SuiteCleanup
//! ```
//!
//! Everything runs on the calling thread except test bodies: each attempt
//! gets its own worker thread so the controller can stop waiting after the
//! timeout. A timed-out worker is signalled through its cancellation token
//! and then abandoned, never joined.

use crate::aggregator::ResultAggregator;
use crate::config::{AttemptTimeout, HarnessConfig};
use crate::context::ExecutionContext;
use crate::discovery::{TestClassUnit, TestMethodUnit, TestSuiteUnit};
use crate::model::{CaseFn, HookKind};
use crate::result::{CaseError, CaseResult, HarnessError, HarnessResult};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

/// Receives the pause signal raised by test code.
///
/// The run is suspended for as long as `pause` blocks.
pub trait OperatorHook: Send + Sync {
    /// Called on the controlling thread; return to resume the run
    fn pause(&self, qualified_name: &str, reason: &str);
}

/// Operator hook that resumes immediately (headless runs)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopOperator;

impl OperatorHook for NoopOperator {
    fn pause(&self, qualified_name: &str, reason: &str) {
        info!(case = qualified_name, reason, "pause requested; no operator attached");
    }
}

/// How one attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Body returned normally
    Passed,
    /// Body returned an error or panicked
    Failed {
        /// Failure message
        message: String,
    },
    /// Controller stopped waiting
    TimedOut {
        /// Bound that was exceeded
        after: Duration,
    },
    /// Test-init failed, body not run
    InitFailed {
        /// Failure message
        message: String,
    },
    /// Body raised the pause signal; counts as passed
    Paused {
        /// Reason given by the body
        reason: String,
    },
}

impl AttemptOutcome {
    /// Whether the attempt is recorded as passed
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Passed | Self::Paused { .. })
    }

    /// Short label for progress output
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Passed => "PASS",
            Self::Failed { .. } => "FAIL",
            Self::TimedOut { .. } => "TIMEOUT",
            Self::InitFailed { .. } => "INIT FAILED",
            Self::Paused { .. } => "PAUSED",
        }
    }

    /// Failure detail, if any
    #[must_use]
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Passed => None,
            Self::Failed { message } | Self::InitFailed { message } => Some(message.clone()),
            Self::TimedOut { after } => Some(format!("timed out after {} ms", after.as_millis())),
            Self::Paused { reason } => Some(reason.clone()),
        }
    }
}

/// Progress callbacks, invoked on the controlling thread
pub trait RunObserver {
    /// Before suite init, with the number of planned attempts
    fn run_started(&self, _planned_attempts: usize) {}

    /// Before class init
    fn class_started(&self, _class: &str, _active_cases: usize) {}

    /// After every attempt
    fn attempt_finished(&self, _qualified_name: &str, _attempt: u32, _outcome: &AttemptOutcome) {}

    /// A case recorded as skipped
    fn case_skipped(&self, _qualified_name: &str, _reason: &str) {}

    /// After suite cleanup
    fn run_finished(&self, _aggregator: &ResultAggregator) {}
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentObserver;

impl RunObserver for SilentObserver {}

/// Facts about a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Identifier used in log spans
    pub run_id: Uuid,
    /// Classes that went through class init
    pub classes_run: usize,
    /// Attempts executed (skips not included)
    pub attempts: usize,
    /// Wall-clock time of the run
    pub elapsed: Duration,
}

/// Sequential lifecycle driver
#[derive(Clone)]
pub struct Executor {
    config: HarnessConfig,
    operator: Arc<dyn OperatorHook>,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Executor {
    /// Create an executor with the no-op operator hook
    #[must_use]
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            operator: Arc::new(NoopOperator),
        }
    }

    /// Install the pause handler
    #[must_use]
    pub fn with_operator(mut self, operator: Arc<dyn OperatorHook>) -> Self {
        self.operator = operator;
        self
    }

    /// Run configuration
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Attempts the run will execute if every class init succeeds
    #[must_use]
    pub fn planned_attempts(&self, suite: &TestSuiteUnit) -> usize {
        suite.enabled_cases() * self.config.attempts_per_case() as usize
    }

    /// Execute the enabled part of `suite`.
    ///
    /// Only a failing suite init aborts the run; every other failure is
    /// recorded in `aggregator`.
    pub fn run(
        &self,
        suite: &TestSuiteUnit,
        aggregator: &mut ResultAggregator,
        observer: &dyn RunObserver,
    ) -> HarnessResult<RunReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("run", %run_id, library = %suite.library);
        let _enter = span.enter();
        let started = Instant::now();

        observer.run_started(self.planned_attempts(suite));
        info!(
            cases = suite.enabled_cases(),
            rerun = self.config.rerun,
            "starting run"
        );

        if let Some((owner, hook)) = suite.suite_hook(HookKind::SuiteInit) {
            let ctx = ExecutionContext::for_class(self.config.properties.clone(), owner);
            if let Err(message) = self.run_hook(HookKind::SuiteInit, hook, &ctx) {
                error!(class = owner, %message, "suite init failed; aborting run");
                return Err(HarnessError::SuiteInit {
                    class: owner.to_string(),
                    message,
                });
            }
        }

        let mut classes_run = 0;
        let mut attempts = 0;
        for class in suite.classes.iter().filter(|c| c.enabled && c.active_cases > 0) {
            classes_run += 1;
            attempts += self.run_class(class, aggregator, observer);
        }

        if let Some((owner, hook)) = suite.suite_hook(HookKind::SuiteCleanup) {
            let ctx = ExecutionContext::for_class(self.config.properties.clone(), owner);
            if let Err(message) = self.run_hook(HookKind::SuiteCleanup, hook, &ctx) {
                warn!(class = owner, %message, "suite cleanup failed");
            }
        }

        let report = RunReport {
            run_id,
            classes_run,
            attempts,
            elapsed: started.elapsed(),
        };
        info!(
            attempts,
            failed = aggregator.fail_count(),
            skipped = aggregator.skip_count(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "run finished"
        );
        observer.run_finished(aggregator);
        Ok(report)
    }

    fn run_class(
        &self,
        class: &TestClassUnit,
        aggregator: &mut ResultAggregator,
        observer: &dyn RunObserver,
    ) -> usize {
        let span = info_span!("class", class = %class.name);
        let _enter = span.enter();
        observer.class_started(&class.name, class.active_cases);

        let mut ctx = ExecutionContext::for_class(self.config.properties.clone(), &class.name);
        let mut attempts = 0;

        let init = class
            .hook(HookKind::ClassInit)
            .map_or(Ok(()), |hook| self.run_hook(HookKind::ClassInit, hook, &ctx));

        match init {
            Ok(()) => {
                for method in class.enabled_methods() {
                    attempts += self.run_method(class, method, &mut ctx, aggregator, observer);
                }
            }
            Err(message) => {
                warn!(%message, "class init failed; skipping enabled cases");
                let reason = format!("class init failed: {message}");
                for method in class.enabled_methods() {
                    let name = class.qualified_name(method);
                    aggregator.record_skip(&name);
                    observer.case_skipped(&name, &reason);
                }
            }
        }

        ctx.clear_method();
        if let Some(hook) = class.hook(HookKind::ClassCleanup) {
            if let Err(message) = self.run_hook(HookKind::ClassCleanup, hook, &ctx) {
                warn!(%message, "class cleanup failed");
            }
        }
        attempts
    }

    fn run_method(
        &self,
        class: &TestClassUnit,
        method: &TestMethodUnit,
        ctx: &mut ExecutionContext,
        aggregator: &mut ResultAggregator,
        observer: &dyn RunObserver,
    ) -> usize {
        let name = class.qualified_name(method);
        let timeout = self.config.timeout_for(method.timeout_ms);
        let attempts = self.config.attempts_per_case();

        for attempt in 0..attempts {
            let span = info_span!("attempt", case = %name, attempt);
            let _enter = span.enter();
            ctx.begin_attempt(&method.name, attempt);

            let outcome = match class.hook(HookKind::TestInit) {
                Some(hook) => match self.run_hook(HookKind::TestInit, hook, ctx) {
                    Ok(()) => self.run_body(&name, method.body(), ctx, timeout),
                    Err(message) => AttemptOutcome::InitFailed { message },
                },
                None => self.run_body(&name, method.body(), ctx, timeout),
            };

            if let Some(hook) = class.hook(HookKind::TestCleanup) {
                if let Err(message) = self.run_hook(HookKind::TestCleanup, hook, ctx) {
                    warn!(%message, "test cleanup failed");
                }
            }

            match &outcome {
                AttemptOutcome::Passed => info!("passed"),
                AttemptOutcome::Paused { reason } => info!(%reason, "resumed after pause"),
                AttemptOutcome::TimedOut { after } => {
                    warn!(timeout_ms = after.as_millis() as u64, "timed out; worker abandoned");
                }
                AttemptOutcome::Failed { message } => warn!(%message, "failed"),
                AttemptOutcome::InitFailed { message } => {
                    warn!(%message, "test init failed; body not run");
                }
            }
            aggregator.record_outcome(&name, outcome.is_pass());
            observer.attempt_finished(&name, attempt, &outcome);
        }
        attempts as usize
    }

    /// Run a test body on its own thread and wait at most `timeout`
    fn run_body(
        &self,
        name: &str,
        body: &CaseFn,
        ctx: &ExecutionContext,
        timeout: AttemptTimeout,
    ) -> AttemptOutcome {
        let (tx, rx) = mpsc::channel();
        let worker_body = Arc::clone(body);
        let worker_ctx = ctx.clone();
        let span = tracing::Span::current();

        debug!(timeout = ?timeout, "spawning worker");
        let spawned = thread::Builder::new()
            .name(format!("casework:{name}"))
            .spawn(move || {
                let _entered = span.enter();
                let result = invoke(&worker_body, &worker_ctx);
                // The controller may have stopped listening after a timeout.
                let _ = tx.send(result);
            });
        if let Err(err) = spawned {
            return AttemptOutcome::Failed {
                message: format!("could not start worker thread: {err}"),
            };
        }

        let received = match timeout.as_duration() {
            Some(limit) => rx.recv_timeout(limit).map_err(|err| match err {
                RecvTimeoutError::Timeout => Some(limit),
                RecvTimeoutError::Disconnected => None,
            }),
            None => rx.recv().map_err(|_| None),
        };

        match received {
            Ok(Ok(())) => AttemptOutcome::Passed,
            Ok(Err(CaseError::Pause { reason })) => {
                self.operator.pause(name, &reason);
                AttemptOutcome::Paused { reason }
            }
            Ok(Err(err)) => AttemptOutcome::Failed {
                message: err.to_string(),
            },
            Err(Some(after)) => {
                ctx.cancellation().cancel();
                AttemptOutcome::TimedOut { after }
            }
            Err(None) => AttemptOutcome::Failed {
                message: "worker exited without reporting a result".to_string(),
            },
        }
    }

    /// Run a hook on the controlling thread
    fn run_hook(&self, kind: HookKind, hook: &CaseFn, ctx: &ExecutionContext) -> Result<(), String> {
        debug!(hook = %kind, "running hook");
        match invoke(hook, ctx) {
            Ok(()) => Ok(()),
            Err(CaseError::Pause { reason }) => {
                self.operator.pause(&ctx.qualified_name(), &reason);
                Ok(())
            }
            Err(err) => Err(err.to_string()),
        }
    }
}

/// Call `f`, turning a panic into a failure
fn invoke(f: &CaseFn, ctx: &ExecutionContext) -> CaseResult<()> {
    catch_unwind(AssertUnwindSafe(|| f(ctx)))
        .unwrap_or_else(|payload| Err(CaseError::failed(format!("panicked: {}", panic_message(&*payload)))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::discover;
    use crate::model::{CaseMetadata, SuiteLibrary, TypeDescriptor};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn ok(_: &ExecutionContext) -> CaseResult<()> {
        Ok(())
    }

    fn quick() -> HarnessConfig {
        HarnessConfig::new().with_default_timeout_ms(2_000)
    }

    fn run(library: &SuiteLibrary, config: HarnessConfig) -> (ResultAggregator, HarnessResult<RunReport>) {
        let suite = discover(library).unwrap();
        let mut aggregator = ResultAggregator::new();
        let result = Executor::new(config).run(&suite, &mut aggregator, &SilentObserver);
        (aggregator, result)
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    fn recording(
        rec: &Arc<Recorder>,
        label: &'static str,
    ) -> impl Fn(&ExecutionContext) -> CaseResult<()> + Send + Sync + 'static {
        let rec = Arc::clone(rec);
        move |ctx: &ExecutionContext| {
            rec.push(format!("{label}:{}", ctx.method_name()));
            Ok(())
        }
    }

    impl Recorder {
        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    mod outcome_tests {
        use super::*;

        #[test]
        fn test_pass_fail_and_panic() {
            let library = SuiteLibrary::new("lib").with_type(|| {
                TypeDescriptor::test_group("C")
                    .case("A", ok)
                    .case("B", |_| Err(CaseError::assertion("expected 3 blobs")))
                    .case("P", |_| panic!("boom"))
            });
            let (agg, result) = run(&library, quick());
            assert_eq!(result.unwrap().attempts, 3);
            assert_eq!(agg.total_run(), 3);
            assert_eq!(agg.pass_count(), 1);
            assert_eq!(agg.failed_cases(), ["C.B", "C.P"]);
        }

        #[test]
        fn test_timeout_bounds_attempt() {
            let library = SuiteLibrary::new("lib").with_type(|| {
                TypeDescriptor::test_group("C").case_with(
                    "Sleepy",
                    CaseMetadata::new().with_timeout_ms(100),
                    |_| {
                        thread::sleep(Duration::from_secs(5));
                        Ok(())
                    },
                )
            });
            let started = Instant::now();
            let (agg, _) = run(&library, HarnessConfig::new());
            assert!(started.elapsed() < Duration::from_secs(3));
            assert_eq!(agg.failed_cases(), ["C.Sleepy"]);
        }

        #[test]
        fn test_timed_out_worker_sees_cancellation() {
            let observed = Arc::new(AtomicUsize::new(0));
            let seen = observed.clone();
            let library = SuiteLibrary::new("lib").with_type(move || {
                let seen = seen.clone();
                TypeDescriptor::test_group("C").case_with(
                    "Cooperative",
                    CaseMetadata::new().with_timeout_ms(50),
                    move |ctx| {
                        while !ctx.is_cancelled() {
                            thread::sleep(Duration::from_millis(5));
                        }
                        seen.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    },
                )
            });
            let (agg, _) = run(&library, HarnessConfig::new());
            assert_eq!(agg.fail_count(), 1);

            let deadline = Instant::now() + Duration::from_secs(2);
            while observed.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(10));
            }
            assert_eq!(observed.load(Ordering::SeqCst), 1);
        }

        #[test]
        fn test_zero_global_timeout_waits() {
            let library = SuiteLibrary::new("lib").with_type(|| {
                TypeDescriptor::test_group("C").case("Slow", |_| {
                    thread::sleep(Duration::from_millis(150));
                    Ok(())
                })
            });
            let config = HarnessConfig::new()
                .with_default_timeout_ms(10)
                .with_global_timeout_secs(0);
            let (agg, _) = run(&library, config);
            assert_eq!(agg.pass_count(), 1);
        }

        #[test]
        fn test_outcome_labels() {
            assert!(AttemptOutcome::Paused { reason: "x".into() }.is_pass());
            assert!(!AttemptOutcome::InitFailed { message: "x".into() }.is_pass());
            assert_eq!(
                AttemptOutcome::TimedOut { after: Duration::from_millis(5) }.detail(),
                Some("timed out after 5 ms".to_string())
            );
        }
    }

    mod lifecycle_tests {
        use super::*;

        #[test]
        fn test_hook_order() {
            let rec = Arc::new(Recorder::default());
            let r = rec.clone();
            let library = SuiteLibrary::new("lib").with_type(move || {
                TypeDescriptor::test_group("C")
                    .hook(HookKind::SuiteInit, recording(&r, "suite-init"))
                    .hook(HookKind::ClassInit, recording(&r, "class-init"))
                    .hook(HookKind::TestInit, recording(&r, "test-init"))
                    .hook(HookKind::TestCleanup, recording(&r, "test-cleanup"))
                    .hook(HookKind::ClassCleanup, recording(&r, "class-cleanup"))
                    .hook(HookKind::SuiteCleanup, recording(&r, "suite-cleanup"))
                    .case("A", recording(&r, "body"))
            });
            let (agg, result) = run(&library, quick());
            result.unwrap();
            assert_eq!(agg.pass_count(), 1);
            assert_eq!(
                rec.events(),
                [
                    "suite-init:",
                    "class-init:",
                    "test-init:A",
                    "body:A",
                    "test-cleanup:A",
                    "class-cleanup:",
                    "suite-cleanup:",
                ]
            );
        }

        #[test]
        fn test_rerun_runs_full_triplet() {
            let rec = Arc::new(Recorder::default());
            let r = rec.clone();
            let library = SuiteLibrary::new("lib").with_type(move || {
                TypeDescriptor::test_group("C")
                    .hook(HookKind::TestInit, recording(&r, "init"))
                    .hook(HookKind::TestCleanup, recording(&r, "cleanup"))
                    .case("A", recording(&r, "body"))
            });
            let (agg, result) = run(&library, quick().with_rerun(2));
            assert_eq!(result.unwrap().attempts, 3);
            assert_eq!(agg.total_run(), 3);
            assert_eq!(rec.events().len(), 9);
            assert_eq!(rec.events().iter().filter(|e| *e == "body:A").count(), 3);
        }

        #[test]
        fn test_rerun_attempt_index_visible() {
            let attempts = Arc::new(Mutex::new(Vec::new()));
            let seen = attempts.clone();
            let library = SuiteLibrary::new("lib").with_type(move || {
                let seen = seen.clone();
                TypeDescriptor::test_group("C").case("A", move |ctx| {
                    seen.lock().unwrap().push(ctx.attempt());
                    Ok(())
                })
            });
            run(&library, quick().with_rerun(1)).1.unwrap();
            assert_eq!(*attempts.lock().unwrap(), [0, 1]);
        }

        #[test]
        fn test_init_failure_skips_body_but_runs_cleanup() {
            let rec = Arc::new(Recorder::default());
            let r = rec.clone();
            let library = SuiteLibrary::new("lib").with_type(move || {
                TypeDescriptor::test_group("C")
                    .hook(HookKind::TestInit, |_| Err(CaseError::failed("no account")))
                    .hook(HookKind::TestCleanup, recording(&r, "cleanup"))
                    .case("A", recording(&r, "body"))
            });
            let (agg, _) = run(&library, quick());
            assert_eq!(agg.failed_cases(), ["C.A"]);
            assert_eq!(rec.events(), ["cleanup:A"]);
        }

        #[test]
        fn test_class_init_failure_skips_all_enabled() {
            let cleanups = Arc::new(AtomicUsize::new(0));
            let count = cleanups.clone();
            let library = SuiteLibrary::new("lib").with_type(move || {
                let count = count.clone();
                TypeDescriptor::test_group("C")
                    .hook(HookKind::ClassInit, |_| Err(CaseError::failed("setup")))
                    .hook(HookKind::ClassCleanup, move |_| {
                        count.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .case("A", ok)
                    .case("B", ok)
                    .case("D", ok)
            });
            let (agg, result) = run(&library, quick().with_rerun(3));
            assert_eq!(result.unwrap().attempts, 0);
            assert_eq!(agg.skip_count(), 3);
            assert_eq!(agg.total_run(), 3);
            assert_eq!(agg.skipped_cases(), ["C.A", "C.B", "C.D"]);
            assert_eq!(cleanups.load(Ordering::SeqCst), 1);
        }

        #[test]
        fn test_class_init_panic_is_failure() {
            let library = SuiteLibrary::new("lib").with_type(|| {
                TypeDescriptor::test_group("C")
                    .hook(HookKind::ClassInit, |_| panic!("bad fixture"))
                    .case("A", ok)
            });
            let (agg, _) = run(&library, quick());
            assert_eq!(agg.skipped_cases(), ["C.A"]);
        }

        #[test]
        fn test_suite_init_failure_is_fatal() {
            let ran = Arc::new(AtomicUsize::new(0));
            let r = ran.clone();
            let library = SuiteLibrary::new("lib")
                .with_type(|| {
                    TypeDescriptor::test_group("First")
                        .hook(HookKind::SuiteInit, |_| Err(CaseError::failed("no endpoint")))
                })
                .with_type(move || {
                    let r = r.clone();
                    TypeDescriptor::test_group("Second").case("A", move |_| {
                        r.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    })
                });
            let (agg, result) = run(&library, quick());
            let err = result.unwrap_err();
            assert!(matches!(err, HarnessError::SuiteInit { ref class, .. } if class == "First"));
            assert_eq!(ran.load(Ordering::SeqCst), 0);
            assert_eq!(agg.total_run(), 0);
        }

        #[test]
        fn test_suite_hooks_run_even_if_owner_filtered_out() {
            let rec = Arc::new(Recorder::default());
            let r = rec.clone();
            let library = SuiteLibrary::new("lib")
                .with_type(move || {
                    TypeDescriptor::test_group("Setup")
                        .hook(HookKind::SuiteInit, recording(&r, "suite-init"))
                        .case("Unused", ok)
                })
                .with_type(|| TypeDescriptor::test_group("Work").case("A", ok));
            let mut suite = discover(&library).unwrap();
            suite.classes[0].methods[0].enabled = false;
            suite.recount_active();

            let mut agg = ResultAggregator::new();
            Executor::new(quick())
                .run(&suite, &mut agg, &SilentObserver)
                .unwrap();
            assert_eq!(rec.events(), ["suite-init:"]);
            assert_eq!(agg.total_run(), 1);
        }

        #[test]
        fn test_cleanup_failure_not_recorded() {
            let library = SuiteLibrary::new("lib").with_type(|| {
                TypeDescriptor::test_group("C")
                    .hook(HookKind::TestCleanup, |_| Err(CaseError::failed("leak")))
                    .hook(HookKind::ClassCleanup, |_| panic!("leak"))
                    .case("A", ok)
            });
            let (agg, result) = run(&library, quick());
            result.unwrap();
            assert_eq!(agg.pass_count(), 1);
            assert_eq!(agg.fail_count(), 0);
        }

        #[test]
        fn test_empty_class_not_run() {
            let rec = Arc::new(Recorder::default());
            let r = rec.clone();
            let library = SuiteLibrary::new("lib").with_type(move || {
                TypeDescriptor::test_group("Empty").hook(HookKind::ClassInit, recording(&r, "class-init"))
            });
            let (_, result) = run(&library, quick());
            assert_eq!(result.unwrap().classes_run, 0);
            assert!(rec.events().is_empty());
        }

        #[test]
        fn test_context_properties_visible() {
            let library = SuiteLibrary::new("lib").with_type(|| {
                TypeDescriptor::test_group("C").case("Lang", |ctx| {
                    crate::ensure_eq(ctx.lang(), Some("python"), "lang property")
                })
            });
            let (agg, _) = run(&library, quick().with_lang("python"));
            assert_eq!(agg.pass_count(), 1);
        }
    }

    mod operator_tests {
        use super::*;

        #[derive(Default)]
        struct CountingOperator {
            pauses: Mutex<Vec<(String, String)>>,
        }

        impl OperatorHook for CountingOperator {
            fn pause(&self, qualified_name: &str, reason: &str) {
                self.pauses
                    .lock()
                    .unwrap()
                    .push((qualified_name.to_string(), reason.to_string()));
            }
        }

        #[test]
        fn test_pause_invokes_operator_and_counts_as_pass() {
            let library = SuiteLibrary::new("lib").with_type(|| {
                TypeDescriptor::test_group("C").case("Inspect", |_| Err(CaseError::pause("look at the account")))
            });
            let suite = discover(&library).unwrap();
            let operator = Arc::new(CountingOperator::default());
            let mut agg = ResultAggregator::new();
            Executor::new(quick())
                .with_operator(operator.clone())
                .run(&suite, &mut agg, &SilentObserver)
                .unwrap();

            assert_eq!(agg.pass_count(), 1);
            assert_eq!(
                *operator.pauses.lock().unwrap(),
                [("C.Inspect".to_string(), "look at the account".to_string())]
            );
        }
    }

    mod observer_tests {
        use super::*;

        #[derive(Default)]
        struct Collecting {
            planned: AtomicUsize,
            events: Mutex<Vec<String>>,
        }

        impl RunObserver for Collecting {
            fn run_started(&self, planned_attempts: usize) {
                self.planned.store(planned_attempts, Ordering::SeqCst);
            }

            fn attempt_finished(&self, qualified_name: &str, attempt: u32, outcome: &AttemptOutcome) {
                self.events
                    .lock()
                    .unwrap()
                    .push(format!("{qualified_name}#{attempt} {}", outcome.label()));
            }

            fn case_skipped(&self, qualified_name: &str, _reason: &str) {
                self.events.lock().unwrap().push(format!("{qualified_name} SKIP"));
            }
        }

        #[test]
        fn test_observer_sees_every_attempt() {
            let library = SuiteLibrary::new("lib")
                .with_type(|| {
                    TypeDescriptor::test_group("C")
                        .case("A", ok)
                        .case("B", |_| Err(CaseError::failed("nope")))
                })
                .with_type(|| {
                    TypeDescriptor::test_group("D")
                        .hook(HookKind::ClassInit, |_| Err(CaseError::failed("setup")))
                        .case("X", ok)
                });
            let suite = discover(&library).unwrap();
            let observer = Collecting::default();
            let mut agg = ResultAggregator::new();
            Executor::new(quick().with_rerun(1))
                .run(&suite, &mut agg, &observer)
                .unwrap();

            assert_eq!(observer.planned.load(Ordering::SeqCst), 6);
            assert_eq!(
                *observer.events.lock().unwrap(),
                ["C.A#0 PASS", "C.A#1 PASS", "C.B#0 FAIL", "C.B#1 FAIL", "D.X SKIP"]
            );
        }
    }
}
