//! Transactions: select, delete, move and map over one data value.
//!
//! A `TransactionPlan` collects compiled paths for each kind of action.
//! `execute` runs them as four passes in a fixed order, each pass working on
//! the output of the previous one:
//!
//! 1. **select** narrows the tree to the matched locations and their ancestors
//! 2. **delete** removes matched locations
//! 3. **move** relocates matched values to a templated destination
//! 4. **map** copies matched values to a templated destination
//!
//! Sequences that a pass only partially rebuilds are held as sparse index maps
//! until the end, then compacted back into sequences (or left as index maps
//! with `ExecuteOptions::preserve_indices`).
//!
//! # Example
//!
//! ```
//! use respdiff::datapath::{ExecuteOptions, TransactionPlan};
//! use respdiff::document::parser::parse_json;
//!
//! let data = parse_json(r#"{"subs": ["a", "b"], "meta": {"page": 1}}"#).unwrap();
//! let mut plan = TransactionPlan::new();
//! plan.delete("subs/1").unwrap().delete("meta").unwrap();
//!
//! let out = plan.execute(&data, ExecuteOptions::default()).unwrap();
//! assert_eq!(out.data, parse_json(r#"{"subs": ["a"]}"#).unwrap());
//! ```

use super::ast::CompiledPath;
use super::error::{PathError, Result};
use super::parser::Parser;
use super::sparse::{key_for, Node};
use super::template::Template;
use crate::document::{DataValue, PathKey, Tree};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Options for [`TransactionPlan::execute`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Leave partially rebuilt sequences as `index -> value` maps.
    pub preserve_indices: bool,
}

/// The result of running a plan.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub data: DataValue,
    /// Template references that could not be resolved. The affected
    /// destinations were still written, with the reference left empty.
    pub diagnostics: Vec<PathError>,
}

/// A set of path actions to run against a data value.
#[derive(Debug, Clone, Default)]
pub struct TransactionPlan {
    select: Vec<CompiledPath>,
    delete: Vec<CompiledPath>,
    moves: Vec<(CompiledPath, Template)>,
    maps: Vec<(CompiledPath, Template)>,
}

impl TransactionPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps only what `path` matches.
    pub fn select(&mut self, path: &str) -> Result<&mut Self> {
        Ok(self.select_path(Parser::parse(path)?))
    }

    pub fn select_path(&mut self, path: CompiledPath) -> &mut Self {
        self.select.push(path);
        self
    }

    /// Removes what `path` matches.
    pub fn delete(&mut self, path: &str) -> Result<&mut Self> {
        Ok(self.delete_path(Parser::parse(path)?))
    }

    pub fn delete_path(&mut self, path: CompiledPath) -> &mut Self {
        self.delete.push(path);
        self
    }

    /// Moves what `path` matches to `template`.
    pub fn move_to(&mut self, path: &str, template: &str) -> Result<&mut Self> {
        Ok(self.move_path(Parser::parse(path)?, Template::parse(template)))
    }

    pub fn move_path(&mut self, path: CompiledPath, template: Template) -> &mut Self {
        self.moves.push((path, template));
        self
    }

    /// Copies what `path` matches to `template`, leaving the source in place.
    pub fn map(&mut self, path: &str, template: &str) -> Result<&mut Self> {
        Ok(self.map_path(Parser::parse(path)?, Template::parse(template)))
    }

    pub fn map_path(&mut self, path: CompiledPath, template: Template) -> &mut Self {
        self.maps.push((path, template));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.select.is_empty()
            && self.delete.is_empty()
            && self.moves.is_empty()
            && self.maps.is_empty()
    }

    pub fn clear(&mut self) {
        self.select.clear();
        self.delete.clear();
        self.moves.clear();
        self.maps.clear();
    }

    /// Runs every pass against a copy of `data`, leaving the plan empty.
    ///
    /// Fails only when `data` is a bare scalar. Paths that match nothing
    /// leave the data as it was.
    pub fn execute(&mut self, data: &DataValue, options: ExecuteOptions) -> Result<Execution> {
        let plan = std::mem::take(self);
        if !data.is_container() {
            return Err(PathError::UnsupportedRootShape {
                found: data.kind().to_string(),
            });
        }

        let mut root = Node::from(data);
        let mut diagnostics = Vec::new();

        if !plan.select.is_empty() {
            debug!(paths = plan.select.len(), "select pass");
            root = select(&root, &plan.select);
        }
        if !plan.delete.is_empty() {
            debug!(paths = plan.delete.len(), "delete pass");
            delete(&mut root, &plan.delete);
        }
        if !plan.moves.is_empty() {
            debug!(paths = plan.moves.len(), "move pass");
            relocate(&mut root, &plan.moves, true, &mut diagnostics);
        }
        if !plan.maps.is_empty() {
            debug!(paths = plan.maps.len(), "map pass");
            relocate(&mut root, &plan.maps, false, &mut diagnostics);
        }

        Ok(Execution {
            data: root.reshape(options.preserve_indices),
            diagnostics,
        })
    }
}

fn select(input: &Node, paths: &[CompiledPath]) -> Node {
    let mut result = input.empty_like();
    for path in paths {
        for found in path.find(input) {
            copy_chain(&mut result, input, &found.keys);
        }
    }
    result
}

/// Copies the value at `keys` into `dest`, creating empty stand-ins for
/// each ancestor that `dest` does not have yet.
fn copy_chain(dest: &mut Node, src: &Node, keys: &[PathKey]) {
    let Some((last, parents)) = keys.split_last() else {
        *dest = src.clone();
        return;
    };

    let mut dest = dest;
    let mut src = src;
    for key in parents {
        let Some(next) = src.child(key) else {
            return;
        };
        dest = dest.child_or_insert_with(key, || next.empty_like());
        src = next;
    }
    if let Some(leaf) = src.child(last) {
        dest.set_child(last, leaf.clone());
    }
}

fn delete(root: &mut Node, paths: &[CompiledPath]) {
    for path in paths {
        let found: Vec<Vec<PathKey>> = path.find(&*root).map(|m| m.keys).collect();
        for keys in &found {
            root.remove_path(keys);
        }
    }
}

/// Destination -> sources already written there during one pass.
type Assigned = HashMap<Vec<PathKey>, Vec<Vec<PathKey>>>;

fn relocate(
    root: &mut Node,
    mapping: &[(CompiledPath, Template)],
    remove_source: bool,
    diagnostics: &mut Vec<PathError>,
) {
    let mut assigned = Assigned::new();

    for (path, template) in mapping {
        let mut pending = Vec::new();
        for found in path.find(&*root) {
            let dest: Vec<PathKey> = template
                .expand(&found, diagnostics)
                .iter()
                .map(|segment| key_for(segment))
                .collect();
            if dest.is_empty() {
                warn!(
                    path = path.source(),
                    template = template.source(),
                    "empty destination, match skipped"
                );
                continue;
            }
            let Some(value) = root.lookup(&found.keys) else {
                continue;
            };
            let value = value.clone();
            pending.push((found.keys, dest, value));
        }

        if remove_source {
            for (source, _, _) in &pending {
                root.remove_path(source);
            }
        }
        for (source, dest, value) in pending {
            assign(root, &dest, source, value, &mut assigned);
        }
    }
}

/// Force-assigns `value` at `dest`, creating or reshaping containers on the
/// way. A second distinct source for the same destination turns it into a
/// sequence of every value written there.
fn assign(
    root: &mut Node,
    dest: &[PathKey],
    source: Vec<PathKey>,
    value: Node,
    assigned: &mut Assigned,
) {
    let Some((last, parents)) = dest.split_last() else {
        return;
    };
    let sources = assigned.entry(dest.to_vec()).or_default();
    if sources.contains(&source) {
        return;
    }
    sources.push(source);
    let writes = sources.len();

    let mut node = root;
    for (i, key) in parents.iter().enumerate() {
        let next = &dest[i + 1];
        node = node.child_or_insert_with(key, || Node::container_for(next));
    }
    let slot = node.child_or_insert_with(last, Node::null);

    if writes == 1 {
        *slot = value;
        return;
    }
    if writes > 2 {
        if let Node::Seq(items) = slot {
            items.push(value);
            return;
        }
    }
    let first = std::mem::replace(slot, Node::null());
    *slot = Node::Seq(vec![first, value]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parser::parse_json;

    fn json(s: &str) -> DataValue {
        parse_json(s).unwrap()
    }

    fn run(plan: &TransactionPlan, data: &str) -> DataValue {
        plan.clone()
            .execute(&json(data), ExecuteOptions::default())
            .unwrap()
            .data
    }

    #[test]
    fn test_empty_plan_returns_input() {
        let plan = TransactionPlan::new();
        assert!(plan.is_empty());
        let data = r#"{"a": [1, 2, {"b": null}]}"#;
        assert_eq!(run(&plan, data), json(data));
    }

    #[test]
    fn test_scalar_root_is_rejected() {
        let mut plan = TransactionPlan::new();
        let err = plan
            .execute(&DataValue::from(3i64), ExecuteOptions::default())
            .unwrap_err();
        assert_eq!(
            err,
            PathError::UnsupportedRootShape {
                found: "number".to_string()
            }
        );
    }

    #[test]
    fn test_select_keeps_ancestors() {
        let mut plan = TransactionPlan::new();
        plan.select("a/b").unwrap();
        assert_eq!(
            run(&plan, r#"{"a": {"b": 1, "c": 2}, "d": 3}"#),
            json(r#"{"a": {"b": 1}}"#)
        );
    }

    #[test]
    fn test_select_compacts_sequences() {
        let mut plan = TransactionPlan::new();
        plan.select("items/*/id").unwrap();
        let data = r#"{"items": [{"id": 1, "x": 0}, {"id": 2, "x": 0}], "total": 2}"#;
        assert_eq!(run(&plan, data), json(r#"{"items": [{"id": 1}, {"id": 2}]}"#));
    }

    #[test]
    fn test_select_with_preserved_indices() {
        let mut plan = TransactionPlan::new();
        plan.select("items/2").unwrap();
        let out = plan
            .execute(
                &json(r#"{"items": ["a", "b", "c"]}"#),
                ExecuteOptions {
                    preserve_indices: true,
                },
            )
            .unwrap();
        assert_eq!(out.data, json(r#"{"items": {"2": "c"}}"#));
    }

    #[test]
    fn test_select_nothing_gives_empty_container() {
        let mut plan = TransactionPlan::new();
        plan.select("missing").unwrap();
        assert_eq!(run(&plan, r#"{"a": 1}"#), json("{}"));
        assert_eq!(run(&plan, "[1, 2]"), json("[]"));
    }

    #[test]
    fn test_select_root() {
        let mut plan = TransactionPlan::new();
        plan.select("").unwrap();
        assert_eq!(run(&plan, r#"{"a": [1]}"#), json(r#"{"a": [1]}"#));
    }

    #[test]
    fn test_delete_from_sequence() {
        let mut plan = TransactionPlan::new();
        plan.delete("subs/1").unwrap();
        assert_eq!(run(&plan, r#"{"subs": ["a", "b"]}"#), json(r#"{"subs": ["a"]}"#));
    }

    #[test]
    fn test_delete_many_indices_in_one_path() {
        let mut plan = TransactionPlan::new();
        plan.delete("*=x").unwrap();
        assert_eq!(run(&plan, r#"["x", "a", "x", "b", "x"]"#), json(r#"["a", "b"]"#));
    }

    #[test]
    fn test_delete_twice_is_same_as_once() {
        let data = r#"{"a": [1, 2, 3], "b": {"c": 1}}"#;
        let mut once = TransactionPlan::new();
        once.delete("a/0").unwrap().delete("b/c").unwrap();
        let mut twice = once.clone();
        twice.delete("a/0").unwrap().delete("b/c").unwrap();
        assert_eq!(run(&once, data), run(&twice, data));
    }

    #[test]
    fn test_delete_leaves_untouched_sequences_alone() {
        let mut plan = TransactionPlan::new();
        plan.delete("a/0").unwrap();
        let out = plan
            .execute(
                &json(r#"{"a": [1, 2], "b": [3, 4]}"#),
                ExecuteOptions {
                    preserve_indices: true,
                },
            )
            .unwrap();
        assert_eq!(out.data, json(r#"{"a": {"1": 2}, "b": [3, 4]}"#));
    }

    #[test]
    fn test_select_then_delete() {
        let mut plan = TransactionPlan::new();
        plan.select("user").unwrap().delete("user/password").unwrap();
        assert_eq!(
            run(&plan, r#"{"user": {"name": "a", "password": "b"}, "ts": 1}"#),
            json(r#"{"user": {"name": "a"}}"#)
        );
    }

    #[test]
    fn test_move_with_captures() {
        let mut plan = TransactionPlan::new();
        plan.move_to("key*/key??", "mapped/%1-%3").unwrap();
        let out = run(&plan, r#"{"key1": {"key1a": "x", "key1b": "y"}, "other": 0}"#);
        assert_eq!(
            out,
            json(r#"{"key1": {}, "other": 0, "mapped": {"1-a": "x", "1-b": "y"}}"#)
        );
    }

    #[test]
    fn test_map_keeps_source() {
        let mut plan = TransactionPlan::new();
        plan.map("a/b", "copy").unwrap();
        assert_eq!(
            run(&plan, r#"{"a": {"b": [1]}}"#),
            json(r#"{"a": {"b": [1]}, "copy": [1]}"#)
        );
    }

    #[test]
    fn test_map_into_index_destination() {
        let mut plan = TransactionPlan::new();
        plan.map("name", "names/0").unwrap();
        assert_eq!(
            run(&plan, r#"{"name": "x"}"#),
            json(r#"{"name": "x", "names": ["x"]}"#)
        );
    }

    #[test]
    fn test_move_splat() {
        let mut plan = TransactionPlan::new();
        plan.move_to("**/secret", "hidden/%%").unwrap();
        let out = run(&plan, r#"{"a": {"b": {"secret": 1}}}"#);
        assert_eq!(out, json(r#"{"a": {"b": {}}, "hidden": {"a": {"b": 1}}}"#));
    }

    #[test]
    fn test_converging_sources_append() {
        let mut plan = TransactionPlan::new();
        plan.map("users/*/name", "names").unwrap();
        let out = run(&plan, r#"{"users": [{"name": "a"}, {"name": "b"}, {"name": "c"}]}"#);
        assert_eq!(
            out.get(&"names".into()),
            Some(&json(r#"["c", "b", "a"]"#))
        );
    }

    #[test]
    fn test_same_source_is_assigned_once() {
        let mut plan = TransactionPlan::new();
        plan.map("users/*/*/..", "copy").unwrap();
        let out = run(&plan, r#"{"users": [{"name": "a", "age": 3}]}"#);
        assert_eq!(
            out.get(&"copy".into()),
            Some(&json(r#"{"name": "a", "age": 3}"#))
        );
    }

    #[test]
    fn test_missing_capture_is_diagnostic() {
        let mut plan = TransactionPlan::new();
        plan.map("a", "out/%2").unwrap();
        let out = plan
            .execute(&json(r#"{"a": 1}"#), ExecuteOptions::default())
            .unwrap();
        assert_eq!(out.data, json(r#"{"a": 1, "out": {"": 1}}"#));
        assert_eq!(out.diagnostics.len(), 1);
        assert!(out.diagnostics[0].is_diagnostic());
    }

    #[test]
    fn test_malformed_path_is_rejected_at_build() {
        let mut plan = TransactionPlan::new();
        assert!(plan.select("a=b=c").is_err());
        assert!(plan.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut plan = TransactionPlan::new();
        plan.select("a").unwrap().map("a", "b").unwrap();
        assert!(!plan.is_empty());
        plan.clear();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_execute_consumes_plan() {
        let mut plan = TransactionPlan::new();
        plan.delete("a").unwrap();
        let first = plan
            .execute(&json(r#"{"a": 1, "b": 2}"#), ExecuteOptions::default())
            .unwrap();
        assert_eq!(first.data, json(r#"{"b": 2}"#));
        assert!(plan.is_empty());

        let again = plan
            .execute(&json(r#"{"a": 1, "b": 2}"#), ExecuteOptions::default())
            .unwrap();
        assert_eq!(again.data, json(r#"{"a": 1, "b": 2}"#));
    }

    #[test]
    fn test_failed_execute_still_clears_plan() {
        let mut plan = TransactionPlan::new();
        plan.select("a").unwrap();
        assert!(plan.execute(&DataValue::from("x"), ExecuteOptions::default()).is_err());
        assert!(plan.is_empty());
    }
}
