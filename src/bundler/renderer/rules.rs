//! Bundle rule set: which handler chain applies to which source files.
//!
//! Rules are collected in a [`RuleSetBuilder`] and frozen into a [`RuleSet`]
//! snapshot before a stage is constructed. A snapshot never observes rules
//! pushed after it was taken. The builder only appends; there is no way to
//! remove or reorder rules.

use crate::bundler::error::{Error, Result};
use serde::Deserialize;
use std::{fmt, path::Path, str::FromStr, sync::Arc};

/// Built-in content handler.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Handler {
    /// Stylesheet text to a module exporting the stylesheet
    Css,
    /// Module exporting a stylesheet to one that also injects it
    Style,
    /// JSON text to a module exporting the parsed value
    Json,
    /// Arbitrary text to a module exporting the raw string
    Text,
}

impl Handler {
    pub fn name(&self) -> &'static str {
        match self {
            Handler::Css => "css",
            Handler::Style => "style",
            Handler::Json => "json",
            Handler::Text => "text",
        }
    }
}

impl fmt::Display for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Handler {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        // Accept loader-style names as written in older configurations
        match s.trim_end_matches("-loader") {
            "css" => Ok(Handler::Css),
            "style" => Ok(Handler::Style),
            "json" => Ok(Handler::Json),
            "text" | "raw" => Ok(Handler::Text),
            other => Err(Error::config(format!(
                "unknown handler '{other}' (expected css, style, json or text)"
            ))),
        }
    }
}

/// `[[rules]]` entry as declared in configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDecl {
    /// Glob matched against paths relative to the project directory.
    pub test: String,
    /// Handler names, applied in this order.
    #[serde(rename = "use")]
    pub uses: Vec<String>,
}

/// A file pattern and the handlers applied to matching files.
#[derive(Clone, Debug)]
pub struct BundleRule {
    pattern: glob::Pattern,
    handlers: Vec<Handler>,
}

impl BundleRule {
    /// Creates a rule from a glob and a handler chain.
    pub fn new(test: &str, handlers: Vec<Handler>) -> Result<Self> {
        let pattern = glob::Pattern::new(test)
            .map_err(|e| Error::config(format!("invalid rule pattern '{test}': {e}")))?;
        if handlers.is_empty() {
            return Err(Error::config(format!("rule '{test}' has no handlers")));
        }
        Ok(Self { pattern, handlers })
    }

    /// Parses a declared rule, resolving handler names.
    pub fn from_decl(decl: &RuleDecl) -> Result<Self> {
        let handlers = decl
            .uses
            .iter()
            .map(|name| name.parse())
            .collect::<Result<Vec<Handler>>>()?;
        Self::new(&decl.test, handlers)
    }

    /// Whether the rule applies to a project-relative path.
    ///
    /// Patterns without a separator also match on the bare file name.
    pub fn matches(&self, relative: &Path) -> bool {
        if self.pattern.matches_path(relative) {
            return true;
        }
        !self.pattern.as_str().contains('/')
            && relative
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| self.pattern.matches(n))
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Handler chain in application order.
    pub fn handlers(&self) -> &[Handler] {
        &self.handlers
    }
}

/// Mutable, append-only collection of rules.
#[derive(Clone, Debug, Default)]
pub struct RuleSetBuilder {
    rules: Vec<BundleRule>,
}

impl RuleSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule to the tail.
    pub fn push(&mut self, rule: BundleRule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    /// Rules in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &BundleRule> {
        self.rules.iter()
    }

    /// Freezes the current rules into an immutable snapshot.
    pub fn snapshot(&self) -> RuleSet {
        RuleSet {
            rules: self.rules.clone().into(),
        }
    }
}

/// Immutable snapshot of a rule list, cheap to clone.
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    rules: Arc<[BundleRule]>,
}

impl RuleSet {
    /// Rules in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &BundleRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Handlers for a file: every matching rule's chain, in rule order.
    pub fn handlers_for(&self, relative: &Path) -> Vec<Handler> {
        self.rules
            .iter()
            .filter(|rule| rule.matches(relative))
            .flat_map(|rule| rule.handlers().iter().copied())
            .collect()
    }
}
