//! Built-in `sample` library.
//!
//! Small, deterministic scenarios for trying selection options and for the
//! CLI smoke tests: one passing, one failing and one slow case in `Sample`,
//! and two cases in `Context` that read the forwarded run properties.

use casework::prelude::*;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Name the library is registered under
pub const LIBRARY_NAME: &str = "sample";

/// How long `Sample.Hang` runs when nothing stops it
pub const HANG_FOR: Duration = Duration::from_secs(5);

/// Build the library
#[must_use]
pub fn library() -> SuiteLibrary {
    SuiteLibrary::new(LIBRARY_NAME)
        .with_group::<SampleScenarios>()
        .with_group::<ContextScenarios>()
}

/// Pass, fail and slow cases
#[derive(Debug, Default)]
pub struct SampleScenarios;

#[test_group(name = "Sample")]
impl SampleScenarios {
    #[suite_init]
    fn announce(&self, ctx: &ExecutionContext) -> CaseResult<()> {
        debug!(properties = ?ctx.properties(), "sample suite starting");
        Ok(())
    }

    #[test_init]
    fn before_each(&self, ctx: &ExecutionContext) -> CaseResult<()> {
        debug!(case = %ctx.qualified_name(), attempt = ctx.attempt(), "test init");
        Ok(())
    }

    #[test_case(name = "Pass", tags = "smoke,fast")]
    fn pass(&self, _ctx: &ExecutionContext) -> CaseResult<()> {
        ensure(Self::checksum(b"casework") != 0, "checksum of a non-empty buffer")
    }

    #[test_case(name = "Fail", tags = "flaky")]
    fn fail(&self, _ctx: &ExecutionContext) -> CaseResult<()> {
        ensure_eq(Self::checksum(b"etag-1"), Self::checksum(b"etag-2"), "etag checksum")
    }

    #[test_case(name = "Hang", tags = "slow")]
    fn hang(&self, ctx: &ExecutionContext) -> CaseResult<()> {
        let started = Instant::now();
        while started.elapsed() < HANG_FOR {
            if ctx.is_cancelled() {
                return Err(CaseError::failed("cancelled"));
            }
            thread::sleep(Duration::from_millis(20));
        }
        Ok(())
    }

    fn checksum(bytes: &[u8]) -> u32 {
        bytes
            .iter()
            .fold(0u32, |acc, b| acc.rotate_left(5) ^ u32::from(*b))
    }
}

/// Cases reading `lang` and `config`
#[derive(Debug, Default)]
pub struct ContextScenarios;

#[test_group(name = "Context")]
impl ContextScenarios {
    #[test_case(name = "EchoLang", tags = "context,fast")]
    fn echo_lang(&self, ctx: &ExecutionContext) -> CaseResult<()> {
        debug!(lang = ctx.lang().unwrap_or("<unset>"), "target language");
        ensure_eq(ctx.class_name(), "Context", "class name in context")
    }

    #[test_case(name = "ConfigReadable", tags = "context,config")]
    fn config_readable(&self, ctx: &ExecutionContext) -> CaseResult<()> {
        match ctx.config_path() {
            Some(path) => ensure(
                Path::new(path).is_file(),
                format!("config file {path} does not exist"),
            ),
            None => Ok(()),
        }
    }
}
