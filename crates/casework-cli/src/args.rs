//! Command line definition and flag syntax normalization.
//!
//! Three spellings are accepted and folded into clap's long form before
//! parsing:
//!
//! ```text
//! /lib:sample /tag:smoke /list        (slash form)
//! -lib sample -tag smoke -list        (single-dash form)
//! --lib sample --tag=smoke --list     (native form)
//! ```
//!
//! Option names are case-insensitive. Tokens that are not a known option,
//! such as `/tmp/run.xml` or `-vv`, are passed through untouched.

use crate::config::{CliConfig, ColorChoice, Verbosity};
use crate::error::{CliError, CliResult};
use casework::{HarnessConfig, SelectionCriteria, ANSWER_FILE_NAME};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Options that take a value
const VALUE_OPTIONS: [&str; 13] = [
    "lib",
    "group",
    "case",
    "tag",
    "extag",
    "config",
    "rerun",
    "lang",
    "timeout",
    "offset",
    "length",
    "answerfile",
    "color",
];

/// Options that take no value
const SWITCHES: [&str; 5] = ["list", "verbose", "quiet", "help", "version"];

/// Casework: run a scenario test library with selection, timeouts and reruns
#[derive(Parser, Debug, Clone)]
#[command(name = "casework")]
#[command(author, version, about, long_about = None)]
pub struct HarnessArgs {
    /// Test library to load (registered name or a path whose file stem is one)
    #[arg(long)]
    pub lib: String,

    /// Comma-separated class names
    #[arg(long)]
    pub group: Option<String>,

    /// Comma-separated method name wildcards (`*`, `?`)
    #[arg(long)]
    pub case: Option<String>,

    /// Comma-separated tag group; a case needs one tag of every group
    #[arg(long)]
    pub tag: Vec<String>,

    /// Comma-separated tags that exclude a case
    #[arg(long)]
    pub extag: Option<String>,

    /// Run configuration file, forwarded to test code
    #[arg(long)]
    pub config: Option<String>,

    /// Extra attempts per case
    #[arg(long, default_value_t = 0)]
    pub rerun: u32,

    /// Target language, forwarded to test code
    #[arg(long)]
    pub lang: Option<String>,

    /// Per-attempt timeout in seconds (0 = wait forever)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// First case of the window over selected cases
    #[arg(long)]
    pub offset: Option<usize>,

    /// Number of cases in the window
    #[arg(long)]
    pub length: Option<usize>,

    /// Run exactly the cases listed in this file
    #[arg(long)]
    pub answerfile: Option<PathBuf>,

    /// Print the selection tree without running anything
    #[arg(long)]
    pub list: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (failures and summary only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, value_enum, default_value = "auto")]
    pub color: ColorArg,
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

impl HarnessArgs {
    /// Normalize `raw` (program name first) and parse it
    pub fn parse_normalized<I, S>(raw: I) -> CliResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let normalized = normalize_args(raw)?;
        Ok(Self::try_parse_from(normalized)?)
    }

    /// Selection options for the filter engine
    #[must_use]
    pub fn selection_criteria(&self) -> SelectionCriteria {
        let mut criteria = SelectionCriteria::new();
        if let Some(group) = &self.group {
            criteria = criteria.with_classes(group);
        }
        if let Some(case) = &self.case {
            criteria = criteria.with_cases(case);
        }
        for group in &self.tag {
            criteria = criteria.with_tag_group(group);
        }
        if let Some(extag) = &self.extag {
            criteria = criteria.with_excluded_tags(extag);
        }
        if let Some(offset) = self.offset {
            criteria = criteria.with_offset(offset);
        }
        if let Some(length) = self.length {
            criteria = criteria.with_length(length);
        }
        if let Some(path) = &self.answerfile {
            criteria = criteria.with_answer_file(path);
        }
        criteria
    }

    /// Run configuration for the executor
    #[must_use]
    pub fn harness_config(&self) -> HarnessConfig {
        let mut config = HarnessConfig::new()
            .with_rerun(self.rerun)
            .with_answer_file(ANSWER_FILE_NAME);
        if let Some(secs) = self.timeout {
            config = config.with_global_timeout_secs(secs);
        }
        if let Some(lang) = &self.lang {
            config = config.with_lang(lang);
        }
        if let Some(path) = &self.config {
            config = config.with_config_path(path);
        }
        config
    }

    /// Output configuration
    #[must_use]
    pub fn cli_config(&self) -> CliConfig {
        CliConfig::new()
            .with_verbosity(Verbosity::from_flags(self.quiet, self.verbose))
            .with_color(self.color.into())
    }
}

/// Fold slash and single-dash options into `--name` / `--name=value`.
///
/// The first element is the program name and is kept as is.
pub fn normalize_args<I, S>(raw: I) -> CliResult<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut tokens = raw.into_iter().map(Into::into);
    let mut out = Vec::new();
    if let Some(program) = tokens.next() {
        out.push(program);
    }

    while let Some(token) = tokens.next() {
        if let Some(rest) = token.strip_prefix("--") {
            out.push(lowercase_long(rest));
        } else if let Some(rest) = token.strip_prefix('/') {
            match split_slash_option(rest) {
                Some((name, value)) => out.push(fold_option(&name, value)?),
                None => out.push(token),
            }
        } else if let Some(rest) = token.strip_prefix('-') {
            let name = rest.to_ascii_lowercase();
            if SWITCHES.contains(&name.as_str()) {
                out.push(format!("--{name}"));
            } else if VALUE_OPTIONS.contains(&name.as_str()) {
                let value = tokens.next().ok_or_else(|| {
                    CliError::invalid_argument(format!("option '-{name}' requires a value"))
                })?;
                out.push(format!("--{name}={value}"));
            } else {
                out.push(token);
            }
        } else {
            out.push(token);
        }
    }
    Ok(out)
}

/// `--Name=Value` → `--name=Value`
fn lowercase_long(rest: &str) -> String {
    match rest.split_once('=') {
        Some((name, value)) => format!("--{}={value}", name.to_ascii_lowercase()),
        None => format!("--{}", rest.to_ascii_lowercase()),
    }
}

/// Recognize `name` or `name:value` where `name` is a known option
fn split_slash_option(rest: &str) -> Option<(String, Option<String>)> {
    let (name, value) = match rest.split_once(':') {
        Some((name, value)) => (name, Some(value.to_string())),
        None => (rest, None),
    };
    let name = name.to_ascii_lowercase();
    let known = VALUE_OPTIONS.contains(&name.as_str()) || SWITCHES.contains(&name.as_str());
    known.then_some((name, value))
}

fn fold_option(name: &str, value: Option<String>) -> CliResult<String> {
    let is_switch = SWITCHES.contains(&name);
    match (is_switch, value) {
        (true, None) => Ok(format!("--{name}")),
        (true, Some(_)) => Err(CliError::invalid_argument(format!(
            "switch '/{name}' does not take a value"
        ))),
        (false, Some(value)) => Ok(format!("--{name}={value}")),
        (false, None) => Err(CliError::invalid_argument(format!(
            "option '/{name}' requires a value, as in /{name}:value"
        ))),
    }
}
