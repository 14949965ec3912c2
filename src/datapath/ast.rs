//! Compiled forms of path-language expressions.

use regex::Regex;

/// Regex options given by a trailing `//flags` suffix.
///
/// The flags apply to every pattern compiled from the same path and are
/// passed down explicitly; nothing is kept in global state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegexFlags {
    /// `i`
    pub case_insensitive: bool,
    /// `m`: `.` also matches newlines
    pub multiline: bool,
    /// `x`: whitespace in the pattern is ignored
    pub extended: bool,
    /// `n`: accepted for compatibility, patterns are always UTF-8
    pub fixed_encoding: bool,
}

impl RegexFlags {
    /// Parses a flag suffix such as `"im"`. Returns `None` on unknown letters.
    pub fn parse(letters: &str) -> Option<Self> {
        let mut flags = RegexFlags::default();
        for ch in letters.chars() {
            match ch {
                'i' => flags.case_insensitive = true,
                'm' => flags.multiline = true,
                'x' => flags.extended = true,
                'n' => flags.fixed_encoding = true,
                _ => return None,
            }
        }
        Some(flags)
    }

    pub fn is_empty(&self) -> bool {
        *self == RegexFlags::default()
    }
}

/// Matches one key or value.
#[derive(Debug, Clone)]
pub enum NodeMatcher {
    /// Exact string comparison against the candidate's string form.
    Literal(String),
    /// Anchored regex; `groups` is the number of capturing groups.
    Pattern { regex: Regex, groups: usize },
    /// Integer range over the candidate's integer form.
    Range {
        start: i64,
        end: i64,
        inclusive: bool,
    },
    /// Matches anything and captures the candidate.
    Any,
    /// Not a matcher: moves the current match up one level.
    Parent,
}

impl PartialEq for NodeMatcher {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NodeMatcher::Literal(a), NodeMatcher::Literal(b)) => a == b,
            (
                NodeMatcher::Pattern { regex: a, groups: ga },
                NodeMatcher::Pattern { regex: b, groups: gb },
            ) => a.as_str() == b.as_str() && ga == gb,
            (
                NodeMatcher::Range {
                    start: s1,
                    end: e1,
                    inclusive: i1,
                },
                NodeMatcher::Range {
                    start: s2,
                    end: e2,
                    inclusive: i2,
                },
            ) => s1 == s2 && e1 == e2 && i1 == i2,
            (NodeMatcher::Any, NodeMatcher::Any) => true,
            (NodeMatcher::Parent, NodeMatcher::Parent) => true,
            _ => false,
        }
    }
}

/// One `/`-delimited unit of a path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSegment {
    /// Tested against each child's key.
    pub key: NodeMatcher,
    /// Tested against each child's value, if present (`key=value`).
    pub value: Option<NodeMatcher>,
    /// Search every level below the current one (`**`).
    pub recursive: bool,
}

impl PathSegment {
    pub fn new(key: NodeMatcher, value: Option<NodeMatcher>, recursive: bool) -> Self {
        Self {
            key,
            value,
            recursive,
        }
    }

    /// The `..` navigation segment.
    pub fn parent() -> Self {
        Self::new(NodeMatcher::Parent, None, false)
    }

    pub fn is_parent(&self) -> bool {
        matches!(self.key, NodeMatcher::Parent)
    }
}

/// A compiled path. Holds no data references, so it can be cached and
/// shared across threads.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPath {
    source: String,
    segments: Vec<PathSegment>,
    flags: RegexFlags,
}

impl CompiledPath {
    pub fn new(source: impl Into<String>, segments: Vec<PathSegment>, flags: RegexFlags) -> Self {
        Self {
            source: source.into(),
            segments,
            flags,
        }
    }

    /// The path string this was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn flags(&self) -> RegexFlags {
        self.flags
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_parse() {
        let flags = RegexFlags::parse("imxn").unwrap();
        assert!(flags.case_insensitive);
        assert!(flags.multiline);
        assert!(flags.extended);
        assert!(flags.fixed_encoding);
        assert!(RegexFlags::parse("q").is_none());
        assert!(RegexFlags::parse("").unwrap().is_empty());
    }

    #[test]
    fn test_parent_segment() {
        let seg = PathSegment::parent();
        assert!(seg.is_parent());
        assert!(!seg.recursive);
        assert!(!PathSegment::new(NodeMatcher::Any, None, true).is_parent());
    }

    #[test]
    fn test_compiled_path_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CompiledPath>();
    }
}
