//! Path queries and transactions over nested response data.
//!
//! A path addresses a set of locations inside a `DataValue`. Paths are
//! compiled once and can then be run against any number of values, either
//! to find matches or as part of a `TransactionPlan`.
//!
//! # Path syntax
//!
//! - `a/b/1` - Segments separated by `/`; indices are plain numbers
//! - `\X` - Literal `X`, e.g. `foo\*bar` or `a\/b`
//! - `key=value` - Entries whose key and value both match
//! - `*`, `?` - Any run of characters / any one character (captured)
//! - `a|b`, `(...)` - Alternation and explicit capture groups
//! - `**` - Search at every depth for the next segment; `**=v` finds any
//!   key whose value matches `v`
//! - `..` - Parent of the current match
//! - `N..M`, `N...M`, `N,M` - Inclusive range, exclusive range, start and length
//! - `//imxn` - Trailing regex flags applied to every segment
//!
//! # Templates
//!
//! Move and map destinations are templates: `/` separates segments, `%N`
//! inserts capture `N`, `%%` inserts the keys walked by a recursive descent.
//!
//! # Examples
//!
//! ```
//! use respdiff::datapath;
//! use respdiff::document::parser::parse_json;
//! use respdiff::document::PathKey;
//!
//! let data = parse_json(r#"{"a": {"b": [1, 2, 3]}}"#).unwrap();
//! let path = datapath::compile("a/b/1").unwrap();
//! let found: Vec<_> = datapath::find(&path, &data).collect();
//! assert_eq!(found[0].keys, vec![PathKey::from("a"), "b".into(), PathKey::Index(1)]);
//! ```

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod matcher;
pub mod parser;
pub mod sparse;
pub mod template;
pub mod transaction;

pub use ast::{CompiledPath, NodeMatcher, PathSegment, RegexFlags};
pub use error::{PathError, Result};
pub use evaluator::{find, Matches, PathMatch};
pub use parser::Parser;
pub use template::Template;
pub use transaction::{ExecuteOptions, Execution, TransactionPlan};

use crate::document::{DataValue, Tree};

/// Compiles a path string.
pub fn compile(path: &str) -> Result<CompiledPath> {
    Parser::parse(path)
}

/// Runs `path` against `data`, pairing each match with the value it found.
pub fn find_values<'a>(
    path: &'a CompiledPath,
    data: &'a DataValue,
) -> impl Iterator<Item = (PathMatch, &'a DataValue)> + 'a {
    find(path, data).filter_map(move |found| {
        let value = data.lookup(&found.keys)?;
        Some((found, value))
    })
}

/// Returns `true` if `path` matches at least once in `data` and every
/// match holds `expected`.
pub fn path_equals(path: &str, data: &DataValue, expected: &DataValue) -> Result<bool> {
    let path = compile(path)?;
    let mut any = false;
    for (_, value) in find_values(&path, data) {
        if value != expected {
            return Ok(false);
        }
        any = true;
    }
    Ok(any)
}
