//! Casework: scenario test harness
//!
//! Casework takes a test library (classes with lifecycle hooks and tagged
//! test methods), selects a subset of methods by name, tag, slice window or
//! answer file, runs each selected method with a per-attempt timeout on an
//! abandonable worker thread, repeats it for reruns, and reports
//! pass/fail/skip/exclude counts plus a re-run list.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────┐   ┌──────────────┐   ┌───────────┐   ┌────────────┐
//! │ TestSuite-   │──►│ discover  │──►│ FilterEngine │──►│ Executor  │──►│ Result-    │
//! │ Provider     │   │           │   │ (enabled     │   │ (suite →  │   │ Aggregator │
//! │ (registered  │   │ suite /   │   │  flags,      │   │  class →  │   │ (summary,  │
//! │  at build)   │   │ class /   │   │  window)     │   │  attempt) │   │  answer    │
//! │              │   │ method    │   │              │   │           │   │  file)     │
//! └──────────────┘   └───────────┘   └──────────────┘   └───────────┘   └────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use casework::{
//!     discover, CaseError, Executor, FilterEngine, HarnessConfig, ResultAggregator,
//!     SelectionCriteria, SilentObserver, SuiteLibrary, TypeDescriptor,
//! };
//!
//! let library = SuiteLibrary::new("storage").with_type(|| {
//!     TypeDescriptor::test_group("Blobs")
//!         .case("Upload", |_| Ok(()))
//!         .case("Download", |_| Err(CaseError::assertion("checksum mismatch")))
//! });
//!
//! let mut suite = discover(&library)?;
//! let mut aggregator = ResultAggregator::new();
//! FilterEngine::prepare(SelectionCriteria::default())?.apply(&mut suite, &mut aggregator)?;
//! Executor::new(HarnessConfig::new()).run(&suite, &mut aggregator, &SilentObserver)?;
//! aggregator.print_summary();
//! # Ok::<(), casework::HarnessError>(())
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

// Lets `#[test_group]` expansions name `::casework` from inside this crate.
extern crate self as casework;

/// Result aggregation, summary and answer file
pub mod aggregator;
/// Run configuration
pub mod config;
/// Execution context handed to test code
pub mod context;
/// Discovery of classes and methods
pub mod discovery;
/// Lifecycle driver
pub mod executor;
/// Selection of enabled cases
pub mod filter;
/// Test library model and provider interface
pub mod model;
mod result;

pub use aggregator::{
    ResultAggregator, EXCLUDED_HEADER, FAILED_HEADER, FATAL_EXIT_CODE, MAX_RUN_EXIT_CODE,
    SKIPPED_HEADER, SUMMARY_HEADER,
};
pub use config::{AttemptTimeout, HarnessConfig, ANSWER_FILE_NAME, DEFAULT_TIMEOUT_MS};
pub use context::{CancellationToken, ExecutionContext, PROPERTY_CONFIG, PROPERTY_LANG};
pub use discovery::{discover, TestClassUnit, TestMethodUnit, TestSuiteUnit};
pub use executor::{
    AttemptOutcome, Executor, NoopOperator, OperatorHook, RunObserver, RunReport, SilentObserver,
};
pub use filter::{
    parse_list, read_answer_file, FilterEngine, FilterReport, SelectionCriteria, WildcardPattern,
};
pub use model::{
    CaseFn, CaseMetadata, HookKind, MemberDescriptor, MemberKind, SuiteLibrary, TestGroup,
    TestSuiteProvider, TypeDescriptor,
};
pub use result::{ensure, ensure_eq, CaseError, CaseResult, HarnessError, HarnessResult};

#[cfg(feature = "derive")]
pub use casework_derive::test_group;

/// Prelude for test libraries
pub mod prelude {
    pub use super::{
        ensure, ensure_eq, CaseError, CaseMetadata, CaseResult, ExecutionContext, HookKind,
        SuiteLibrary, TestGroup, TypeDescriptor,
    };

    #[cfg(feature = "derive")]
    pub use super::test_group;
}
