//! Discovery: turn a test library into the suite/class/method tree.
//!
//! Only types marked as test groups become classes. Within a class, members
//! marked as test cases become methods in declaration order; the first member
//! of each hook kind becomes that class's hook. Everything starts enabled.

use crate::model::{CaseFn, HookKind, MemberKind, TestSuiteProvider};
use crate::result::{HarnessError, HarnessResult};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use tracing::{debug, warn};

/// One discovered test method
#[derive(Clone)]
pub struct TestMethodUnit {
    /// Method name
    pub name: String,
    /// Selected for execution
    pub enabled: bool,
    /// Tag set, possibly empty
    pub tags: BTreeSet<String>,
    /// Per-method timeout override in milliseconds
    pub timeout_ms: Option<u64>,
    body: CaseFn,
}

impl fmt::Debug for TestMethodUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestMethodUnit")
            .field("name", &self.name)
            .field("enabled", &self.enabled)
            .field("tags", &self.tags)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl TestMethodUnit {
    /// Test body
    #[must_use]
    pub const fn body(&self) -> &CaseFn {
        &self.body
    }

    /// Check whether the method carries `tag`
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// Lifecycle hooks owned by a class
#[derive(Clone, Default)]
struct ClassHooks {
    suite_init: Option<CaseFn>,
    suite_cleanup: Option<CaseFn>,
    class_init: Option<CaseFn>,
    class_cleanup: Option<CaseFn>,
    test_init: Option<CaseFn>,
    test_cleanup: Option<CaseFn>,
}

impl ClassHooks {
    fn slot(&mut self, kind: HookKind) -> &mut Option<CaseFn> {
        match kind {
            HookKind::SuiteInit => &mut self.suite_init,
            HookKind::SuiteCleanup => &mut self.suite_cleanup,
            HookKind::ClassInit => &mut self.class_init,
            HookKind::ClassCleanup => &mut self.class_cleanup,
            HookKind::TestInit => &mut self.test_init,
            HookKind::TestCleanup => &mut self.test_cleanup,
        }
    }

    const fn get(&self, kind: HookKind) -> Option<&CaseFn> {
        match kind {
            HookKind::SuiteInit => self.suite_init.as_ref(),
            HookKind::SuiteCleanup => self.suite_cleanup.as_ref(),
            HookKind::ClassInit => self.class_init.as_ref(),
            HookKind::ClassCleanup => self.class_cleanup.as_ref(),
            HookKind::TestInit => self.test_init.as_ref(),
            HookKind::TestCleanup => self.test_cleanup.as_ref(),
        }
    }
}

/// One discovered test class
#[derive(Clone)]
pub struct TestClassUnit {
    /// Class name
    pub name: String,
    /// Considered by the filter (a class with zero active cases still does not run)
    pub enabled: bool,
    /// Enabled methods, recomputed after filtering
    pub active_cases: usize,
    /// Methods in declaration order
    pub methods: Vec<TestMethodUnit>,
    hooks: ClassHooks,
}

impl fmt::Debug for TestClassUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hooks: Vec<_> = HookKind::ALL
            .iter()
            .filter(|kind| self.has_hook(**kind))
            .map(|kind| kind.label())
            .collect();
        f.debug_struct("TestClassUnit")
            .field("name", &self.name)
            .field("enabled", &self.enabled)
            .field("active_cases", &self.active_cases)
            .field("hooks", &hooks)
            .field("methods", &self.methods)
            .finish()
    }
}

impl TestClassUnit {
    /// Hook of the given kind, if declared
    #[must_use]
    pub const fn hook(&self, kind: HookKind) -> Option<&CaseFn> {
        self.hooks.get(kind)
    }

    /// Check whether the class declares a hook of the given kind
    #[must_use]
    pub const fn has_hook(&self, kind: HookKind) -> bool {
        self.hooks.get(kind).is_some()
    }

    /// `ClassName.MethodName`
    #[must_use]
    pub fn qualified_name(&self, method: &TestMethodUnit) -> String {
        format!("{}.{}", self.name, method.name)
    }

    /// Enabled methods in declaration order
    pub fn enabled_methods(&self) -> impl Iterator<Item = &TestMethodUnit> {
        self.methods.iter().filter(|m| m.enabled)
    }

    /// Recompute and store `active_cases`
    pub fn recount_active(&mut self) -> usize {
        self.active_cases = self.methods.iter().filter(|m| m.enabled).count();
        self.active_cases
    }
}

/// The discovered suite
#[derive(Debug, Clone)]
pub struct TestSuiteUnit {
    /// Library the suite came from
    pub library: String,
    /// Classes in declaration order
    pub classes: Vec<TestClassUnit>,
}

impl TestSuiteUnit {
    /// First class declaring a suite-level hook of `kind`, with the hook
    #[must_use]
    pub fn suite_hook(&self, kind: HookKind) -> Option<(&str, &CaseFn)> {
        self.classes
            .iter()
            .find_map(|class| class.hook(kind).map(|hook| (class.name.as_str(), hook)))
    }

    /// Number of discovered methods
    #[must_use]
    pub fn total_cases(&self) -> usize {
        self.classes.iter().map(|c| c.methods.len()).sum()
    }

    /// Number of enabled methods across all classes
    #[must_use]
    pub fn enabled_cases(&self) -> usize {
        self.classes.iter().map(|c| c.enabled_methods().count()).sum()
    }

    /// Recompute `active_cases` on every class, returning the sum
    pub fn recount_active(&mut self) -> usize {
        self.classes
            .iter_mut()
            .map(TestClassUnit::recount_active)
            .sum()
    }

    /// Qualified names of enabled methods, in execution order
    #[must_use]
    pub fn enabled_qualified_names(&self) -> Vec<String> {
        self.classes
            .iter()
            .flat_map(|class| class.enabled_methods().map(|m| class.qualified_name(m)))
            .collect()
    }
}

/// Scan a test library.
///
/// Fails only when the provider cannot load the library.
pub fn discover(provider: &dyn TestSuiteProvider) -> HarnessResult<TestSuiteUnit> {
    let types = provider.load().map_err(|err| match err {
        err @ HarnessError::LibraryLoad { .. } => err,
        other => HarnessError::library_load(provider.name(), other.to_string()),
    })?;

    let mut classes = Vec::new();
    let mut seen = HashSet::new();

    for ty in types {
        if !ty.is_test_group {
            debug!(type_name = %ty.name, "skipping type without test group marker");
            continue;
        }
        if !seen.insert(ty.name.clone()) {
            warn!(class = %ty.name, "duplicate test group name; qualified names will be ambiguous");
        }

        let mut hooks = ClassHooks::default();
        let mut methods = Vec::new();

        for member in ty.members {
            match (member.kind, member.invoke) {
                (MemberKind::TestCase(meta), Some(body)) => methods.push(TestMethodUnit {
                    name: member.name,
                    enabled: true,
                    tags: meta.tags,
                    timeout_ms: meta.timeout_ms,
                    body,
                }),
                (MemberKind::Hook(kind), Some(hook)) => {
                    let slot = hooks.slot(kind);
                    if slot.is_some() {
                        warn!(class = %ty.name, member = %member.name, hook = %kind, "ignoring duplicate hook");
                    } else {
                        *slot = Some(hook);
                    }
                }
                (MemberKind::Helper, _) => {}
                (kind, None) => {
                    warn!(class = %ty.name, member = %member.name, ?kind, "member has no callable; skipped");
                }
            }
        }

        debug!(class = %ty.name, methods = methods.len(), "discovered test group");
        let active_cases = methods.len();
        classes.push(TestClassUnit {
            name: ty.name,
            enabled: true,
            active_cases,
            methods,
            hooks,
        });
    }

    Ok(TestSuiteUnit {
        library: provider.name().to_string(),
        classes,
    })
}
