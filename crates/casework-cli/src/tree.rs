//! Selection tree for the `list` dry run
//!
//! Shows every discovered class and method with its selection state after
//! filtering. Nothing is executed.
//!
//! ## Example Output
//!
//! ```text
//! sample
//! ├── Sample
//! │   ├── [x] Pass [fast, smoke]
//! │   ├── [ ] Fail [flaky] (excluded)
//! │   └── [x] Hang [slow]
//! └── Context
//!     ├── [ ] EchoLang [context, fast]
//!     └── [ ] ConfigReadable [config, context]
//!
//! Total: 2 enabled of 5 cases in 2 classes
//! ```

#![allow(clippy::format_push_string)]

use casework::{TestMethodUnit, TestSuiteUnit};
use std::collections::HashSet;

/// Configuration for tree display
#[derive(Debug, Clone, Copy)]
pub struct TreeConfig {
    /// Show method tags
    pub show_tags: bool,
    /// Show per-method timeout overrides
    pub show_timeouts: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            show_tags: true,
            show_timeouts: true,
        }
    }
}

impl TreeConfig {
    /// Set whether to show tags
    #[must_use]
    pub const fn with_tags(mut self, show: bool) -> Self {
        self.show_tags = show;
        self
    }

    /// Set whether to show timeout overrides
    #[must_use]
    pub const fn with_timeouts(mut self, show: bool) -> Self {
        self.show_timeouts = show;
        self
    }
}

/// Render the filtered suite.
///
/// `excluded` holds qualified names removed by an exclude tag; those methods
/// get an `(excluded)` annotation.
#[must_use]
pub fn render_tree(suite: &TestSuiteUnit, excluded: &[String], config: &TreeConfig) -> String {
    let excluded: HashSet<&str> = excluded.iter().map(String::as_str).collect();
    let mut output = String::new();

    output.push_str(&suite.library);
    output.push('\n');

    let class_count = suite.classes.len();
    for (i, class) in suite.classes.iter().enumerate() {
        let is_last = i + 1 == class_count;
        let connector = if is_last { "└── " } else { "├── " };
        let child_prefix = if is_last { "    " } else { "│   " };

        output.push_str(connector);
        output.push_str(&class.name);
        output.push('\n');

        let method_count = class.methods.len();
        for (j, method) in class.methods.iter().enumerate() {
            let connector = if j + 1 == method_count {
                "└── "
            } else {
                "├── "
            };
            let qualified = class.qualified_name(method);
            output.push_str(child_prefix);
            output.push_str(connector);
            output.push_str(&method_line(
                method,
                excluded.contains(qualified.as_str()),
                config,
            ));
            output.push('\n');
        }
    }

    output.push('\n');
    output.push_str(&format!(
        "Total: {} enabled of {} cases in {} classes\n",
        suite.enabled_cases(),
        suite.total_cases(),
        class_count
    ));

    output
}

fn method_line(method: &TestMethodUnit, excluded: bool, config: &TreeConfig) -> String {
    let mut line = format!(
        "[{}] {}",
        if method.enabled { 'x' } else { ' ' },
        method.name
    );
    if config.show_tags && !method.tags.is_empty() {
        let tags: Vec<&str> = method.tags.iter().map(String::as_str).collect();
        line.push_str(&format!(" [{}]", tags.join(", ")));
    }
    if config.show_timeouts {
        if let Some(ms) = method.timeout_ms {
            line.push_str(&format!(" (timeout {ms} ms)"));
        }
    }
    if excluded {
        line.push_str(" (excluded)");
    }
    line
}
