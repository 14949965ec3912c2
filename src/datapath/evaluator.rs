//! Traversal engine: walks a tree against a `CompiledPath`.
//!
//! Matching is lazy. `Matches` keeps an explicit work stack of frontier
//! entries, so each completed `PathMatch` is handed out as soon as it is found
//! and nothing is materialised beyond the current frontier.

use super::ast::{CompiledPath, PathSegment};
use crate::document::{PathKey, Tree};

/// A location found by a path, with everything captured on the way there.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathMatch {
    /// Root-to-leaf address.
    pub keys: Vec<PathKey>,
    /// Sub-matches from every segment, left to right.
    pub captures: Vec<String>,
    /// Keys walked by each recursive-descent step, tagged with the index of
    /// the recursive segment that walked them.
    pub splats: Vec<(usize, Vec<PathKey>)>,
}

impl PathMatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `%N` capture (1-indexed).
    pub fn capture(&self, n: usize) -> Option<&str> {
        n.checked_sub(1)
            .and_then(|i| self.captures.get(i))
            .map(String::as_str)
    }
}

enum Step<'a, T: ?Sized> {
    /// `node` is reached by `found` and must be tested against `segment`.
    Visit {
        node: &'a T,
        found: PathMatch,
        segment: usize,
    },
    /// Recursive segment: test the children of `node`, then keep descending.
    Descend {
        node: &'a T,
        found: PathMatch,
        segment: usize,
        walked: Vec<PathKey>,
    },
}

/// Lazy, single-pass iterator over the matches of a path.
pub struct Matches<'a, T: Tree + ?Sized> {
    root: &'a T,
    segments: &'a [PathSegment],
    stack: Vec<Step<'a, T>>,
}

impl<'a, T: Tree + ?Sized> Matches<'a, T> {
    pub fn new(path: &'a CompiledPath, root: &'a T) -> Self {
        Self {
            root,
            segments: path.segments(),
            stack: vec![Step::Visit {
                node: root,
                found: PathMatch::new(),
                segment: 0,
            }],
        }
    }

    /// Tests the children of `node` against `segment` and queues the hits.
    fn expand(
        &mut self,
        node: &'a T,
        found: &PathMatch,
        segment: usize,
        walked: Option<&[PathKey]>,
    ) {
        let seg = &self.segments[segment];
        let seq_len = node.seq_len();
        let mut hits = Vec::new();

        for (key, child) in node.children() {
            let Some(mut captures) = seg.key.match_key(&key, seq_len) else {
                continue;
            };
            if let Some(value) = &seg.value {
                match value.match_value(child) {
                    Some(more) => captures.extend(more),
                    None => continue,
                }
            }

            let mut next = found.clone();
            if let Some(walked) = walked {
                next.keys.extend(walked.iter().cloned());
                next.splats.push((segment, walked.to_vec()));
            }
            next.keys.push(key);
            next.captures.extend(captures);
            hits.push(Step::Visit {
                node: child,
                found: next,
                segment: segment + 1,
            });
        }

        // Popped in the order `children()` produced them.
        self.stack.extend(hits.into_iter().rev());
    }

    fn descend(&mut self, node: &'a T, found: PathMatch, segment: usize, walked: Vec<PathKey>) {
        self.expand(node, &found, segment, Some(&walked));

        let deeper: Vec<Step<'a, T>> = node
            .children()
            .into_iter()
            .filter(|(_, child)| child.is_container())
            .map(|(key, child)| {
                let mut walked = walked.clone();
                walked.push(key);
                Step::Descend {
                    node: child,
                    found: found.clone(),
                    segment,
                    walked,
                }
            })
            .collect();
        // Deeper levels are searched before this level's hits are followed.
        self.stack.extend(deeper.into_iter().rev());
    }
}

impl<'a, T: Tree + ?Sized> Iterator for Matches<'a, T> {
    type Item = PathMatch;

    fn next(&mut self) -> Option<PathMatch> {
        let segments = self.segments;
        while let Some(step) = self.stack.pop() {
            match step {
                Step::Visit {
                    node,
                    found,
                    segment,
                } => {
                    let Some(seg) = segments.get(segment) else {
                        return Some(found);
                    };
                    if seg.is_parent() {
                        let mut found = found;
                        if found.keys.pop().is_none() {
                            continue;
                        }
                        // The parent may have been reached recursively, so
                        // resolve it from the root rather than a saved frame.
                        if let Some(parent) = self.root.lookup(&found.keys) {
                            self.stack.push(Step::Visit {
                                node: parent,
                                found,
                                segment: segment + 1,
                            });
                        }
                    } else if seg.recursive {
                        self.stack.push(Step::Descend {
                            node,
                            found,
                            segment,
                            walked: Vec::new(),
                        });
                    } else {
                        self.expand(node, &found, segment, None);
                    }
                }
                Step::Descend {
                    node,
                    found,
                    segment,
                    walked,
                } => self.descend(node, found, segment, walked),
            }
        }
        None
    }
}

/// Runs `path` against `data`.
///
/// Sequences are visited from their last index to their first; map order is
/// whatever the map iterates in.
pub fn find<'a, T: Tree + ?Sized>(path: &'a CompiledPath, data: &'a T) -> Matches<'a, T> {
    Matches::new(path, data)
}

impl CompiledPath {
    /// Runs this path against `data`. See [`find`].
    pub fn find<'a, T: Tree + ?Sized>(&'a self, data: &'a T) -> Matches<'a, T> {
        Matches::new(self, data)
    }
}
