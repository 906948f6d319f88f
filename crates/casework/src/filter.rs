//! Filter Engine: narrow a discovered suite to the cases that will run.
//!
//! Two exclusive modes:
//!
//! - **answer-file mode**: exactly the qualified names listed in the file
//! - **normal mode**: class list, wildcard method list, include-tag groups
//!   (OR inside a group, AND across groups) and exclude tags
//!
//! Normal mode may then be cut down by an offset/length window over the
//! globally ordered enabled cases. The window is ignored in answer-file mode.

use crate::aggregator::ResultAggregator;
use crate::discovery::{TestMethodUnit, TestSuiteUnit};
use crate::result::{HarnessError, HarnessResult};
use glob::Pattern;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Split a comma-separated option value, trimming blanks
#[must_use]
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Anchored wildcard over a method name: `*` any run, `?` one character
#[derive(Debug, Clone)]
pub struct WildcardPattern {
    source: String,
    pattern: Pattern,
}

impl WildcardPattern {
    /// Compile a pattern
    pub fn new(source: &str) -> HarnessResult<Self> {
        let pattern = Pattern::new(&Self::to_glob(source)).map_err(|e| {
            HarnessError::invalid_input(format!("bad case pattern '{source}': {e}"))
        })?;
        Ok(Self {
            source: source.to_string(),
            pattern,
        })
    }

    /// Escape everything but `*` and `?`, collapsing `*` runs
    fn to_glob(source: &str) -> String {
        let mut glob = String::with_capacity(source.len());
        let mut previous_star = false;
        for c in source.chars() {
            match c {
                '*' if previous_star => continue,
                '*' | '?' => glob.push(c),
                _ => glob.push_str(&Pattern::escape(c.encode_utf8(&mut [0; 4]))),
            }
            previous_star = c == '*';
        }
        glob
    }

    /// Full-string, case-sensitive match
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.pattern.matches(name)
    }

    /// Pattern as written
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Selection options, as given on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionCriteria {
    /// Explicit class names
    pub classes: Vec<String>,
    /// Wildcard method name patterns
    pub cases: Vec<String>,
    /// Include-tag groups: every group needs at least one of its tags
    pub include_tags: Vec<Vec<String>>,
    /// Tags that remove a case
    pub exclude_tags: Vec<String>,
    /// Window start over the ordered enabled cases
    pub offset: Option<usize>,
    /// Window length
    pub length: Option<usize>,
    /// Newline-delimited list of qualified names to run
    pub answer_file: Option<PathBuf>,
    /// A class, case, tag or extag option was supplied, even if blank
    pub name_or_tag_given: bool,
}

impl SelectionCriteria {
    /// Select everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a comma-separated class list
    #[must_use]
    pub fn with_classes(mut self, list: &str) -> Self {
        self.name_or_tag_given = true;
        self.classes.extend(parse_list(list));
        self
    }

    /// Restrict to a comma-separated wildcard method list
    #[must_use]
    pub fn with_cases(mut self, list: &str) -> Self {
        self.name_or_tag_given = true;
        self.cases.extend(parse_list(list));
        self
    }

    /// Add an include group (comma-separated OR-set)
    #[must_use]
    pub fn with_tag_group(mut self, group: &str) -> Self {
        self.name_or_tag_given = true;
        let tags = parse_list(group);
        if !tags.is_empty() {
            self.include_tags.push(tags);
        }
        self
    }

    /// Add comma-separated exclude tags
    #[must_use]
    pub fn with_excluded_tags(mut self, list: &str) -> Self {
        self.name_or_tag_given = true;
        self.exclude_tags.extend(parse_list(list));
        self
    }

    /// Set the window start
    #[must_use]
    pub const fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Set the window length
    #[must_use]
    pub const fn with_length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    /// Use an answer file
    #[must_use]
    pub fn with_answer_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.answer_file = Some(path.into());
        self
    }

    /// Whether any name or tag option is present
    #[must_use]
    pub fn has_name_or_tag_selection(&self) -> bool {
        self.name_or_tag_given
            || !self.classes.is_empty()
            || !self.cases.is_empty()
            || !self.include_tags.is_empty()
            || !self.exclude_tags.is_empty()
    }

    /// Whether a window was requested
    #[must_use]
    pub const fn has_window(&self) -> bool {
        self.offset.is_some() || self.length.is_some()
    }

    /// Reject combinations that can never be honored
    pub fn validate(&self) -> HarnessResult<()> {
        if self.answer_file.is_some() && self.has_name_or_tag_selection() {
            return Err(HarnessError::invalid_input(
                "answerfile cannot be combined with group, case, tag or extag",
            ));
        }
        Ok(())
    }
}

/// Read an answer file: one qualified name per line, blank lines ignored
pub fn read_answer_file(path: &Path) -> HarnessResult<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        HarnessError::invalid_input(format!(
            "cannot read answer file {}: {e}",
            path.display()
        ))
    })?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect())
}

/// What filtering did to the suite
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterReport {
    /// Cases left enabled
    pub enabled: usize,
    /// Qualified names removed only by an exclude tag
    pub excluded: Vec<String>,
    /// Cases disabled by the offset/length window
    pub outside_window: usize,
}

enum Mode {
    Answer(HashSet<String>),
    Normal {
        classes: HashSet<String>,
        patterns: Vec<WildcardPattern>,
    },
}

/// Prepared selection, ready to apply to a discovered suite.
///
/// Preparing validates the criteria, compiles wildcards and reads the answer
/// file, so every input error surfaces before the library is loaded.
pub struct FilterEngine {
    criteria: SelectionCriteria,
    mode: Mode,
}

impl std::fmt::Debug for FilterEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterEngine")
            .field("criteria", &self.criteria)
            .field(
                "mode",
                &match self.mode {
                    Mode::Answer(_) => "answer-file",
                    Mode::Normal { .. } => "normal",
                },
            )
            .finish()
    }
}

impl FilterEngine {
    /// Validate and compile the criteria
    pub fn prepare(criteria: SelectionCriteria) -> HarnessResult<Self> {
        criteria.validate()?;

        let mode = if let Some(path) = &criteria.answer_file {
            let entries = read_answer_file(path)?;
            debug!(path = %path.display(), entries = entries.len(), "loaded answer file");
            Mode::Answer(entries.into_iter().collect())
        } else {
            let patterns = criteria
                .cases
                .iter()
                .map(|p| WildcardPattern::new(p))
                .collect::<HarnessResult<Vec<_>>>()?;
            Mode::Normal {
                classes: criteria.classes.iter().cloned().collect(),
                patterns,
            }
        };

        Ok(Self { criteria, mode })
    }

    /// The criteria this engine was prepared from
    #[must_use]
    pub const fn criteria(&self) -> &SelectionCriteria {
        &self.criteria
    }

    /// Toggle enabled flags on `suite`, record excluded cases, recount
    /// active cases.
    ///
    /// Fails when the window offset lies beyond the enabled cases.
    pub fn apply(
        &self,
        suite: &mut TestSuiteUnit,
        aggregator: &mut ResultAggregator,
    ) -> HarnessResult<FilterReport> {
        let mut report = FilterReport::default();

        match &self.mode {
            Mode::Answer(entries) => self.apply_answer_set(suite, entries),
            Mode::Normal { classes, patterns } => {
                for class in &mut suite.classes {
                    if !classes.is_empty() && !classes.contains(&class.name) {
                        class.enabled = false;
                        for method in &mut class.methods {
                            method.enabled = false;
                        }
                        continue;
                    }
                    class.enabled = true;
                    for method in &mut class.methods {
                        let selected = Self::name_matches(patterns, &method.name)
                            && self.includes(method);
                        let excluded = selected && self.excludes(method);
                        method.enabled = selected && !excluded;
                        if excluded {
                            let name = format!("{}.{}", class.name, method.name);
                            aggregator.record_exclude(&name);
                            report.excluded.push(name);
                        }
                    }
                }
            }
        }

        if self.criteria.has_window() {
            match self.mode {
                Mode::Normal { .. } => report.outside_window = self.apply_window(suite)?,
                Mode::Answer(_) => warn!("offset/length ignored in answer-file mode"),
            }
        }

        report.enabled = suite.recount_active();
        debug!(
            enabled = report.enabled,
            excluded = report.excluded.len(),
            outside_window = report.outside_window,
            "selection applied"
        );
        Ok(report)
    }

    fn apply_answer_set(&self, suite: &mut TestSuiteUnit, entries: &HashSet<String>) {
        let mut matched = HashSet::new();
        for class in &mut suite.classes {
            class.enabled = true;
            for method in &mut class.methods {
                let name = format!("{}.{}", class.name, method.name);
                method.enabled = entries.contains(&name);
                if method.enabled {
                    matched.insert(name);
                }
            }
        }
        for missing in entries.difference(&matched) {
            warn!(case = %missing, "answer file entry matches no discovered case");
        }
    }

    fn name_matches(patterns: &[WildcardPattern], name: &str) -> bool {
        patterns.is_empty() || patterns.iter().any(|p| p.matches(name))
    }

    fn includes(&self, method: &TestMethodUnit) -> bool {
        self.criteria
            .include_tags
            .iter()
            .all(|group| group.iter().any(|tag| method.has_tag(tag)))
    }

    fn excludes(&self, method: &TestMethodUnit) -> bool {
        self.criteria.exclude_tags.iter().any(|tag| method.has_tag(tag))
    }

    fn apply_window(&self, suite: &mut TestSuiteUnit) -> HarnessResult<usize> {
        let total = suite.enabled_cases();
        let offset = self.criteria.offset.unwrap_or(0);
        if self.criteria.offset.is_some() && offset >= total {
            return Err(HarnessError::invalid_input(format!(
                "offset {offset} is out of range: only {total} case(s) selected"
            )));
        }
        let end = self
            .criteria
            .length
            .map_or(total, |length| offset.saturating_add(length).min(total));

        let mut index = 0;
        let mut dropped = 0;
        for class in &mut suite.classes {
            for method in class.methods.iter_mut().filter(|m| m.enabled) {
                if index < offset || index >= end {
                    method.enabled = false;
                    dropped += 1;
                }
                index += 1;
            }
        }
        Ok(dropped)
    }
}
