//! Test library model: what a provider hands to discovery.
//!
//! A test library is a list of [`TypeDescriptor`]s. Each type is either marked
//! as a test group or not, and lists its members in declaration order: test
//! cases with their metadata, lifecycle hooks, and plain helpers. Discovery
//! reads this the way a reflection scan would read attributes.
//!
//! Libraries are registered at build time, either by hand with the builder
//! methods below or through `#[casework::test_group]`.

use crate::context::ExecutionContext;
use crate::result::{CaseResult, HarnessResult};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Callable shape shared by test bodies and lifecycle hooks
pub type CaseFn = Arc<dyn Fn(&ExecutionContext) -> CaseResult<()> + Send + Sync>;

/// Lifecycle hook kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// Once before any class runs
    SuiteInit,
    /// Once after all classes ran
    SuiteCleanup,
    /// Once before the first case of the declaring class
    ClassInit,
    /// Once after the last case of the declaring class
    ClassCleanup,
    /// Before every attempt of every case in the class
    TestInit,
    /// After every attempt of every case in the class
    TestCleanup,
}

impl HookKind {
    /// All kinds, in lifecycle order
    pub const ALL: [Self; 6] = [
        Self::SuiteInit,
        Self::ClassInit,
        Self::TestInit,
        Self::TestCleanup,
        Self::ClassCleanup,
        Self::SuiteCleanup,
    ];

    /// Human-readable label used in logs
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SuiteInit => "suite-init",
            Self::SuiteCleanup => "suite-cleanup",
            Self::ClassInit => "class-init",
            Self::ClassCleanup => "class-cleanup",
            Self::TestInit => "test-init",
            Self::TestCleanup => "test-cleanup",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Metadata attached to a test case
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseMetadata {
    /// Tags used for include/exclude filtering
    pub tags: BTreeSet<String>,
    /// Per-case timeout override in milliseconds
    pub timeout_ms: Option<u64>,
}

impl CaseMetadata {
    /// Metadata with no tags and no timeout override
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add tags
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Set the timeout override
    #[must_use]
    pub const fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }
}

/// Role of a member inside a type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberKind {
    /// A test case with its metadata
    TestCase(CaseMetadata),
    /// A lifecycle hook
    Hook(HookKind),
    /// Anything else; ignored by discovery
    Helper,
}

/// One member of a type, in declaration order
#[derive(Clone)]
pub struct MemberDescriptor {
    /// Member name
    pub name: String,
    /// What the member is
    pub kind: MemberKind,
    /// Callable, absent for helpers
    pub invoke: Option<CaseFn>,
}

impl fmt::Debug for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("invocable", &self.invoke.is_some())
            .finish()
    }
}

impl MemberDescriptor {
    /// Describe a test case
    #[must_use]
    pub fn test_case<F>(name: impl Into<String>, metadata: CaseMetadata, body: F) -> Self
    where
        F: Fn(&ExecutionContext) -> CaseResult<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind: MemberKind::TestCase(metadata),
            invoke: Some(Arc::new(body)),
        }
    }

    /// Describe a lifecycle hook
    #[must_use]
    pub fn hook<F>(kind: HookKind, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&ExecutionContext) -> CaseResult<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind: MemberKind::Hook(kind),
            invoke: Some(Arc::new(hook)),
        }
    }

    /// Describe a helper that discovery should skip
    #[must_use]
    pub fn helper(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Helper,
            invoke: None,
        }
    }
}

/// One type exposed by a test library
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    /// Type name, used as the class part of qualified names
    pub name: String,
    /// Whether the type is marked as a test group
    pub is_test_group: bool,
    /// Members in declaration order
    pub members: Vec<MemberDescriptor>,
}

impl TypeDescriptor {
    /// A type marked as a test group
    #[must_use]
    pub fn test_group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_test_group: true,
            members: Vec::new(),
        }
    }

    /// A type without the test group marker
    #[must_use]
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_test_group: false,
            members: Vec::new(),
        }
    }

    /// Append a member
    #[must_use]
    pub fn with_member(mut self, member: MemberDescriptor) -> Self {
        self.members.push(member);
        self
    }

    /// Append an untagged test case without timeout override
    #[must_use]
    pub fn case<F>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&ExecutionContext) -> CaseResult<()> + Send + Sync + 'static,
    {
        self.with_member(MemberDescriptor::test_case(name, CaseMetadata::new(), body))
    }

    /// Append a test case with metadata
    #[must_use]
    pub fn case_with<F>(self, name: impl Into<String>, metadata: CaseMetadata, body: F) -> Self
    where
        F: Fn(&ExecutionContext) -> CaseResult<()> + Send + Sync + 'static,
    {
        self.with_member(MemberDescriptor::test_case(name, metadata, body))
    }

    /// Append a lifecycle hook, named after its kind
    #[must_use]
    pub fn hook<F>(self, kind: HookKind, hook: F) -> Self
    where
        F: Fn(&ExecutionContext) -> CaseResult<()> + Send + Sync + 'static,
    {
        self.with_member(MemberDescriptor::hook(kind, kind.label(), hook))
    }
}

/// Source of test types for one run.
///
/// `load` may fail when the library cannot be produced; discovery turns that
/// into a fatal error.
pub trait TestSuiteProvider: Send + Sync {
    /// Library name, as shown in logs and errors
    fn name(&self) -> &str;

    /// Produce the type descriptors, in declaration order
    fn load(&self) -> HarnessResult<Vec<TypeDescriptor>>;
}

/// A type that can describe itself as a test group.
///
/// Generated by `#[casework::test_group]`; implement by hand when the macro
/// does not fit. The instance is shared by every hook and case of the class.
pub trait TestGroup: Send + Sync + 'static {
    /// Build the descriptor, capturing `self` in every callable
    fn describe(self: Arc<Self>) -> TypeDescriptor;
}

type DescriptorFactory = Arc<dyn Fn() -> TypeDescriptor + Send + Sync>;

/// Build-time registration table of test types.
///
/// Each registered factory is called on every `load`, so class instances are
/// fresh per run.
#[derive(Clone)]
pub struct SuiteLibrary {
    name: String,
    factories: Vec<DescriptorFactory>,
}

impl fmt::Debug for SuiteLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuiteLibrary")
            .field("name", &self.name)
            .field("type_count", &self.factories.len())
            .finish()
    }
}

impl SuiteLibrary {
    /// Create an empty library
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            factories: Vec::new(),
        }
    }

    /// Register a default-constructible test group
    #[must_use]
    pub fn with_group<T>(self) -> Self
    where
        T: TestGroup + Default,
    {
        self.with_type(|| Arc::new(T::default()).describe())
    }

    /// Register a test group built by `make`
    #[must_use]
    pub fn with_group_from<T, F>(self, make: F) -> Self
    where
        T: TestGroup,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.with_type(move || Arc::new(make()).describe())
    }

    /// Register a raw descriptor factory
    #[must_use]
    pub fn with_type<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> TypeDescriptor + Send + Sync + 'static,
    {
        self.factories.push(Arc::new(factory));
        self
    }

    /// Number of registered types
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.factories.len()
    }
}

impl TestSuiteProvider for SuiteLibrary {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> HarnessResult<Vec<TypeDescriptor>> {
        Ok(self.factories.iter().map(|factory| factory()).collect())
    }
}
