//! Read-only navigation over nested data.
//!
//! The path engine walks trees through the `Tree` trait rather than a concrete
//! type, so the same matcher runs over caller-owned `DataValue`s and over the
//! partially rebuilt trees a transaction produces between passes.

use super::node::{DataValue, PathKey};

/// A node in a nested map/sequence tree.
pub trait Tree {
    /// Returns the direct children in traversal order.
    ///
    /// Sequences (and anything index-addressed) must yield their children
    /// from the last index to the first, so callers that remove matched
    /// indices never disturb positions they have not visited yet.
    fn children(&self) -> Vec<(PathKey, &Self)>;

    /// Looks up a direct child.
    fn child(&self, key: &PathKey) -> Option<&Self>;

    /// Returns `true` if the node can hold children.
    fn is_container(&self) -> bool;

    /// Number of positions if this node is a sequence, used to resolve
    /// negative range bounds.
    fn seq_len(&self) -> Option<usize>;

    /// The string form the matchers compare and capture.
    fn text(&self) -> String;

    /// Follows `keys` from this node.
    fn lookup(&self, keys: &[PathKey]) -> Option<&Self> {
        keys.iter().try_fold(self, |node, key| node.child(key))
    }
}

impl Tree for DataValue {
    fn children(&self) -> Vec<(PathKey, &Self)> {
        match self {
            DataValue::Map(map) => map
                .iter()
                .map(|(key, child)| (PathKey::Name(key.clone()), child))
                .collect(),
            DataValue::Seq(items) => items
                .iter()
                .enumerate()
                .rev()
                .map(|(idx, child)| (PathKey::Index(idx), child))
                .collect(),
            DataValue::Scalar(_) => vec![],
        }
    }

    fn child(&self, key: &PathKey) -> Option<&Self> {
        self.get(key)
    }

    fn is_container(&self) -> bool {
        DataValue::is_container(self)
    }

    fn seq_len(&self) -> Option<usize> {
        self.as_seq().map(<[DataValue]>::len)
    }

    fn text(&self) -> String {
        self.to_string()
    }
}
