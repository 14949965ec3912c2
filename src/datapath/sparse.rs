//! Working tree for transactions.
//!
//! A transaction rebuilds the input as a `Node` tree. It is the same shape as
//! `DataValue` with one extra variant: `Sparse`, a sequence that only some
//! indices have been written to or removed from. Sparse sequences keep their
//! original positions while a pass runs, so later matches in the same pass
//! still address the right elements. `reshape` turns the tree back into a
//! `DataValue` once every pass is done.

use crate::document::node::parse_index;
use crate::document::{DataValue, PathKey, Scalar, Tree};
use indexmap::IndexMap;
use std::collections::BTreeMap;

/// A sequence addressed by original index.
///
/// `len` is the length of the sequence it was built from, raised by writes
/// past the end. Removals never lower it, so negative indices keep
/// resolving to the same positions for the whole transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseSeq {
    items: BTreeMap<usize, Node>,
    len: usize,
}

impl SparseSeq {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty sequence standing in for one of `len` elements.
    pub fn with_len(len: usize) -> Self {
        SparseSeq {
            items: BTreeMap::new(),
            len,
        }
    }

    pub fn get(&self, idx: usize) -> Option<&Node> {
        self.items.get(&idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Node> {
        self.items.get_mut(&idx)
    }

    pub fn insert(&mut self, idx: usize, node: Node) -> Option<Node> {
        self.len = self.len.max(idx + 1);
        self.items.insert(idx, node)
    }

    pub fn remove(&mut self, idx: usize) -> Option<Node> {
        self.items.remove(&idx)
    }

    /// Returns the element at `idx`, inserting one from `make` when absent.
    pub fn entry_or_insert_with(&mut self, idx: usize, make: impl FnOnce() -> Node) -> &mut Node {
        self.len = self.len.max(idx + 1);
        self.items.entry(idx).or_insert_with(make)
    }

    /// Length of the original sequence, counting removed positions.
    pub fn span(&self) -> usize {
        self.len
    }

    /// Populated positions from the highest index down.
    pub fn iter_rev(&self) -> impl Iterator<Item = (usize, &Node)> {
        self.items.iter().rev().map(|(idx, node)| (*idx, node))
    }

    /// Compacts into a sequence ordered by index, or keeps the index map
    /// when `preserve_indices` is set.
    pub fn reshape(self, preserve_indices: bool) -> DataValue {
        if preserve_indices {
            DataValue::Map(
                self.items
                    .into_iter()
                    .map(|(idx, node)| (idx.to_string(), node.reshape(preserve_indices)))
                    .collect(),
            )
        } else {
            DataValue::Seq(
                self.items
                    .into_values()
                    .map(|node| node.reshape(preserve_indices))
                    .collect(),
            )
        }
    }

    fn into_named(self) -> IndexMap<String, Node> {
        self.items
            .into_iter()
            .map(|(idx, node)| (idx.to_string(), node))
            .collect()
    }
}

impl From<Vec<Node>> for SparseSeq {
    fn from(items: Vec<Node>) -> Self {
        SparseSeq {
            len: items.len(),
            items: items.into_iter().enumerate().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Map(IndexMap<String, Node>),
    Seq(Vec<Node>),
    Sparse(SparseSeq),
    Scalar(Scalar),
}

impl Node {
    pub fn null() -> Self {
        Node::Scalar(Scalar::Null)
    }

    /// An empty container standing in for `self` in a partial copy.
    /// Sequences become sparse since only some of their indices get filled.
    pub fn empty_like(&self) -> Self {
        match self {
            Node::Map(_) => Node::Map(IndexMap::new()),
            Node::Seq(items) => Node::Sparse(SparseSeq::with_len(items.len())),
            Node::Sparse(sparse) => Node::Sparse(SparseSeq::with_len(sparse.span())),
            Node::Scalar(s) => Node::Scalar(s.clone()),
        }
    }

    /// An empty container able to hold `key`.
    pub fn container_for(key: &PathKey) -> Self {
        match key {
            PathKey::Index(_) => Node::Sparse(SparseSeq::new()),
            PathKey::Name(_) => Node::Map(IndexMap::new()),
        }
    }

    pub fn child_mut(&mut self, key: &PathKey) -> Option<&mut Node> {
        match self {
            Node::Map(map) => map.get_mut(key.to_string().as_str()),
            Node::Seq(items) => key.as_index().and_then(|idx| items.get_mut(idx)),
            Node::Sparse(sparse) => key.as_index().and_then(|idx| sparse.get_mut(idx)),
            Node::Scalar(_) => None,
        }
    }

    pub fn lookup_mut(&mut self, keys: &[PathKey]) -> Option<&mut Node> {
        keys.iter().try_fold(self, |node, key| node.child_mut(key))
    }

    /// Converts `self` so that it can hold `key` as a direct child.
    ///
    /// Scalars are replaced by an empty container. A sequence becomes sparse
    /// for an index key, or a map keyed by index strings for a name key.
    fn prepare_for(&mut self, key: &PathKey) {
        let index = key.as_index();
        let taken = std::mem::replace(self, Node::null());
        *self = match (taken, index) {
            (Node::Scalar(_), _) => Node::container_for(key),
            (Node::Seq(items), Some(_)) => Node::Sparse(SparseSeq::from(items)),
            (Node::Seq(items), None) => Node::Map(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(idx, node)| (idx.to_string(), node))
                    .collect(),
            ),
            (Node::Sparse(sparse), None) => Node::Map(sparse.into_named()),
            (other, _) => other,
        };
    }

    /// Returns the child at `key`, creating it with `make` when absent and
    /// reshaping `self` as needed to hold it.
    pub fn child_or_insert_with(
        &mut self,
        key: &PathKey,
        make: impl FnOnce() -> Node,
    ) -> &mut Node {
        self.prepare_for(key);
        match self {
            Node::Map(map) => map.entry(key.to_string()).or_insert_with(make),
            Node::Sparse(sparse) => {
                let idx = key.as_index().unwrap_or_default();
                sparse.entry_or_insert_with(idx, make)
            }
            node @ (Node::Seq(_) | Node::Scalar(_)) => {
                *node = Node::container_for(key);
                node.child_or_insert_with(key, make)
            }
        }
    }

    /// Writes `node` at `key`, replacing any existing child.
    pub fn set_child(&mut self, key: &PathKey, node: Node) {
        *self.child_or_insert_with(key, Node::null) = node;
    }

    /// Removes the value at `keys`. Sequences along the way are not shifted:
    /// the sequence holding the removed element turns sparse first.
    /// Removing the root is a no-op.
    pub fn remove_path(&mut self, keys: &[PathKey]) -> Option<Node> {
        let (last, parents) = keys.split_last()?;
        let parent = self.lookup_mut(parents)?;
        if let Node::Seq(items) = parent {
            last.as_index().filter(|idx| *idx < items.len())?;
            *parent = Node::Sparse(SparseSeq::from(std::mem::take(items)));
        }
        match parent {
            Node::Map(map) => map.shift_remove(last.to_string().as_str()),
            Node::Sparse(sparse) => last.as_index().and_then(|idx| sparse.remove(idx)),
            Node::Seq(_) | Node::Scalar(_) => None,
        }
    }

    /// Converts back to a `DataValue`, compacting sparse sequences unless
    /// `preserve_indices` is set.
    pub fn reshape(self, preserve_indices: bool) -> DataValue {
        match self {
            Node::Map(map) => DataValue::Map(
                map.into_iter()
                    .map(|(key, node)| (key, node.reshape(preserve_indices)))
                    .collect(),
            ),
            Node::Seq(items) => DataValue::Seq(
                items
                    .into_iter()
                    .map(|node| node.reshape(preserve_indices))
                    .collect(),
            ),
            Node::Sparse(sparse) => sparse.reshape(preserve_indices),
            Node::Scalar(s) => DataValue::Scalar(s),
        }
    }
}

impl From<&DataValue> for Node {
    fn from(value: &DataValue) -> Self {
        match value {
            DataValue::Map(map) => Node::Map(
                map.iter()
                    .map(|(key, child)| (key.clone(), Node::from(child)))
                    .collect(),
            ),
            DataValue::Seq(items) => Node::Seq(items.iter().map(Node::from).collect()),
            DataValue::Scalar(s) => Node::Scalar(s.clone()),
        }
    }
}

impl From<DataValue> for Node {
    fn from(value: DataValue) -> Self {
        Node::from(&value)
    }
}

/// Parses a destination segment: decimal strings address indices.
pub fn key_for(segment: &str) -> PathKey {
    match parse_index(segment) {
        Some(idx) => PathKey::Index(idx),
        None => PathKey::Name(segment.to_string()),
    }
}

impl Tree for Node {
    fn children(&self) -> Vec<(PathKey, &Self)> {
        match self {
            Node::Map(map) => map
                .iter()
                .map(|(key, child)| (PathKey::Name(key.clone()), child))
                .collect(),
            Node::Seq(items) => items
                .iter()
                .enumerate()
                .rev()
                .map(|(idx, child)| (PathKey::Index(idx), child))
                .collect(),
            Node::Sparse(sparse) => sparse
                .iter_rev()
                .map(|(idx, child)| (PathKey::Index(idx), child))
                .collect(),
            Node::Scalar(_) => vec![],
        }
    }

    fn child(&self, key: &PathKey) -> Option<&Self> {
        match self {
            Node::Map(map) => map.get(key.to_string().as_str()),
            Node::Seq(items) => key.as_index().and_then(|idx| items.get(idx)),
            Node::Sparse(sparse) => key.as_index().and_then(|idx| sparse.get(idx)),
            Node::Scalar(_) => None,
        }
    }

    fn is_container(&self) -> bool {
        !matches!(self, Node::Scalar(_))
    }

    fn seq_len(&self) -> Option<usize> {
        match self {
            Node::Seq(items) => Some(items.len()),
            Node::Sparse(sparse) => Some(sparse.span()),
            _ => None,
        }
    }

    fn text(&self) -> String {
        match self {
            Node::Scalar(s) => s.to_string(),
            container => container.clone().reshape(false).to_string(),
        }
    }
}
