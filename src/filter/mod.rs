//! Response filtering from command-line path rules.
//!
//! The HTTP layer hands over a decoded response body and the path strings the
//! user passed as `--only`, `--ignore`, `--move` and `--map`. `ResponseFilter`
//! compiles them into one `TransactionPlan`. A rule whose path does not
//! compile is set aside with its error; every other rule still applies.

use crate::datapath::{ExecuteOptions, Execution, PathError, Result, TransactionPlan};
use crate::document::DataValue;
use tracing::warn;

/// Separates the source path from the destination template in `FROM>TO`.
pub const MAPPING_SEPARATOR: char = '>';

/// One user-supplied rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Keep only what the path matches
    Only(String),
    /// Drop what the path matches
    Ignore(String),
    /// Relocate matches to a template
    Move { from: String, to: String },
    /// Copy matches to a template
    Map { from: String, to: String },
}

impl Rule {
    /// Parses `FROM>TO` into a move rule.
    pub fn parse_move(mapping: &str) -> Result<Self> {
        let (from, to) = split_mapping(mapping)?;
        Ok(Rule::Move { from, to })
    }

    /// Parses `FROM>TO` into a map rule.
    pub fn parse_map(mapping: &str) -> Result<Self> {
        let (from, to) = split_mapping(mapping)?;
        Ok(Rule::Map { from, to })
    }

    /// The path string the rule matches with.
    pub fn path(&self) -> &str {
        match self {
            Rule::Only(path) | Rule::Ignore(path) => path,
            Rule::Move { from, .. } | Rule::Map { from, .. } => from,
        }
    }
}

/// Splits on the first `>` not escaped with `\`. The escape is kept so the
/// path compiler still sees it.
fn split_mapping(mapping: &str) -> Result<(String, String)> {
    let mut escaped = false;
    for (i, ch) in mapping.char_indices() {
        match ch {
            '\\' if !escaped => escaped = true,
            MAPPING_SEPARATOR if !escaped => {
                let to = &mapping[i + ch.len_utf8()..];
                return Ok((mapping[..i].to_string(), to.to_string()));
            }
            _ => escaped = false,
        }
    }
    Err(PathError::malformed(mapping, mapping, "expected FROM>TO"))
}

/// A batch of rules compiled into one transaction.
#[derive(Debug, Clone, Default)]
pub struct ResponseFilter {
    plan: TransactionPlan,
    rejected: Vec<PathError>,
}

impl ResponseFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles every rule, keeping the ones that compile.
    pub fn from_rules(rules: impl IntoIterator<Item = Rule>) -> Self {
        let mut filter = Self::new();
        for rule in rules {
            filter.add(rule);
        }
        filter
    }

    /// Adds a rule. Returns `false` if its path was rejected.
    pub fn add(&mut self, rule: Rule) -> bool {
        let added = match &rule {
            Rule::Only(path) => self.plan.select(path).map(drop),
            Rule::Ignore(path) => self.plan.delete(path).map(drop),
            Rule::Move { from, to } => self.plan.move_to(from, to).map(drop),
            Rule::Map { from, to } => self.plan.map(from, to).map(drop),
        };
        match added {
            Ok(()) => true,
            Err(err) => {
                warn!(path = rule.path(), error = %err, "skipping rule");
                self.rejected.push(err);
                false
            }
        }
    }

    /// Records a rule that failed before reaching the filter, such as a
    /// mapping without `>`.
    pub fn reject(&mut self, err: PathError) {
        warn!(error = %err, "skipping rule");
        self.rejected.push(err);
    }

    /// Errors for every rule that was not added.
    pub fn rejected(&self) -> &[PathError] {
        &self.rejected
    }

    /// Returns `true` when no rule was added.
    pub fn is_empty(&self) -> bool {
        self.plan.is_empty()
    }

    /// Runs the compiled rules over a response body. The rules are used up;
    /// a second call leaves the body as it was.
    pub fn apply(&mut self, body: &DataValue, options: ExecuteOptions) -> Result<Execution> {
        self.plan.execute(body, options)
    }
}
