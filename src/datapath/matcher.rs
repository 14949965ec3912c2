//! Segment pattern compiler and key/value matching.
//!
//! A segment part such as `key*`, `1..3`, `a|b` or `foo\*bar` compiles to a
//! `NodeMatcher`. Matching returns the captured sub-strings on success, which
//! accumulate into a `PathMatch` and later feed `%N` template references.

use super::ast::{NodeMatcher, RegexFlags};
use super::error::{PathError, Result};
use crate::document::{PathKey, Tree};
use regex::RegexBuilder;

/// Escape character shared by the path and template languages.
pub const ESCAPE: char = '\\';

impl NodeMatcher {
    /// Compiles one segment part (already split from its siblings).
    ///
    /// Rules, in order: wildcards-only → `Any`; `N..M` / `N...M` / `N,M` →
    /// `Range`; unescaped `* ? | ( )` or any regex flag → `Pattern`;
    /// everything else → `Literal` with escapes stripped.
    pub fn compile(part: &str, flags: RegexFlags) -> Result<Self> {
        if part.chars().all(|c| c == '*' || c == '?') {
            return Ok(NodeMatcher::Any);
        }
        if let Some(range) = parse_range(part) {
            return Ok(range);
        }
        if !flags.is_empty() || has_special(part) {
            return compile_pattern(part, flags);
        }
        unescape(part).map(NodeMatcher::Literal)
    }

    /// Tests a child's key. `seq_len` is the parent's length when the parent
    /// is a sequence.
    pub fn match_key(&self, key: &PathKey, seq_len: Option<usize>) -> Option<Vec<String>> {
        match self {
            NodeMatcher::Range { .. } => {
                let n = match key {
                    PathKey::Index(idx) => i64::try_from(*idx).ok()?,
                    PathKey::Name(name) => parse_int(name)?,
                };
                self.range_contains(n, seq_len).then(|| vec![n.to_string()])
            }
            _ => self.match_text(&key.to_string()),
        }
    }

    /// Tests a child's value. Only `Any` matches a container.
    pub fn match_value<T: Tree + ?Sized>(&self, value: &T) -> Option<Vec<String>> {
        match self {
            NodeMatcher::Any => Some(vec![value.text()]),
            _ if value.is_container() => None,
            _ => self.match_text(&value.text()),
        }
    }

    fn match_text(&self, text: &str) -> Option<Vec<String>> {
        match self {
            NodeMatcher::Literal(lit) => (lit == text).then(Vec::new),
            NodeMatcher::Pattern { regex, groups } => {
                let caps = regex.captures(text)?;
                if *groups == 0 {
                    return Some(vec![caps[0].to_string()]);
                }
                Some(
                    (1..=*groups)
                        .map(|i| caps.get(i).map_or_else(String::new, |m| m.as_str().to_string()))
                        .collect(),
                )
            }
            NodeMatcher::Range { .. } => parse_int(text)
                .filter(|n| self.range_contains(*n, None))
                .map(|n| vec![n.to_string()]),
            NodeMatcher::Any => Some(vec![text.to_string()]),
            NodeMatcher::Parent => None,
        }
    }

    /// Negative bounds count back from the end when the candidate sits in a
    /// sequence of known length.
    fn range_contains(&self, n: i64, seq_len: Option<usize>) -> bool {
        let NodeMatcher::Range {
            start,
            end,
            inclusive,
        } = self
        else {
            return false;
        };
        let resolve = |bound: i64| match seq_len {
            Some(len) if bound < 0 => bound + i64::try_from(len).unwrap_or(i64::MAX),
            _ => bound,
        };
        let (lo, hi) = (resolve(*start), resolve(*end));
        if *inclusive {
            lo <= n && n <= hi
        } else {
            lo <= n && n < hi
        }
    }
}

/// Parses `-?\d+` strictly.
fn parse_int(s: &str) -> Option<i64> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn parse_range(part: &str) -> Option<NodeMatcher> {
    if let Some((start, len)) = part.split_once(',') {
        let start = parse_int(start)?;
        let end = start.checked_add(parse_int(len)?)?;
        return Some(NodeMatcher::Range {
            start,
            end,
            inclusive: true,
        });
    }
    let (start, end, inclusive) = match part.split_once("...") {
        Some((start, end)) => (start, end, false),
        None => {
            let (start, end) = part.split_once("..")?;
            (start, end, true)
        }
    };
    Some(NodeMatcher::Range {
        start: parse_int(start)?,
        end: parse_int(end)?,
        inclusive,
    })
}

/// Whether `part` holds an unescaped wildcard or regex metacharacter.
fn has_special(part: &str) -> bool {
    let mut escaped = false;
    for ch in part.chars() {
        if escaped {
            escaped = false;
        } else if ch == ESCAPE {
            escaped = true;
        } else if matches!(ch, '*' | '?' | '|' | '(' | ')') {
            return true;
        }
    }
    false
}

fn unescape(part: &str) -> Result<String> {
    let mut out = String::with_capacity(part.len());
    let mut chars = part.chars();
    while let Some(ch) = chars.next() {
        if ch == ESCAPE {
            match chars.next() {
                Some(lit) => out.push(lit),
                None => return Err(PathError::malformed(part, "\\", "unterminated escape")),
            }
        } else {
            out.push(ch);
        }
    }
    Ok(out)
}

fn compile_pattern(part: &str, flags: RegexFlags) -> Result<NodeMatcher> {
    let mut body = String::new();
    let mut chars = part.chars();
    let mut buf = [0u8; 4];
    while let Some(ch) = chars.next() {
        match ch {
            ESCAPE => match chars.next() {
                Some(lit) => body.push_str(&regex::escape(lit.encode_utf8(&mut buf))),
                None => return Err(PathError::malformed(part, "\\", "unterminated escape")),
            },
            '*' => body.push_str("(.*)"),
            '?' => body.push_str("(.)"),
            '|' | '(' | ')' => body.push(ch),
            other => body.push_str(&regex::escape(other.encode_utf8(&mut buf))),
        }
    }

    let regex = RegexBuilder::new(&format!(r"\A(?:{})\z", body))
        .case_insensitive(flags.case_insensitive)
        .dot_matches_new_line(flags.multiline)
        .ignore_whitespace(flags.extended)
        .build()
        .map_err(|e| PathError::malformed(part, part, &format!("invalid pattern ({})", e)))?;
    let groups = regex.captures_len() - 1;
    Ok(NodeMatcher::Pattern { regex, groups })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DataValue;

    fn compile(part: &str) -> NodeMatcher {
        NodeMatcher::compile(part, RegexFlags::default()).unwrap()
    }

    fn key(name: &str) -> PathKey {
        PathKey::from(name)
    }

    #[test]
    fn test_compile_any() {
        assert_eq!(compile(""), NodeMatcher::Any);
        assert_eq!(compile("*"), NodeMatcher::Any);
        assert_eq!(compile("**?*"), NodeMatcher::Any);
    }

    #[test]
    fn test_compile_ranges() {
        assert_eq!(
            compile("1..3"),
            NodeMatcher::Range {
                start: 1,
                end: 3,
                inclusive: true
            }
        );
        assert_eq!(
            compile("-3...-1"),
            NodeMatcher::Range {
                start: -3,
                end: -1,
                inclusive: false
            }
        );
        assert_eq!(
            compile("2,3"),
            NodeMatcher::Range {
                start: 2,
                end: 5,
                inclusive: true
            }
        );
    }

    #[test]
    fn test_compile_literal_strips_escapes() {
        assert_eq!(compile("name"), NodeMatcher::Literal("name".to_string()));
        assert_eq!(
            compile(r"foo\*bar"),
            NodeMatcher::Literal("foo*bar".to_string())
        );
        assert_eq!(compile(r"a\=b"), NodeMatcher::Literal("a=b".to_string()));
    }

    #[test]
    fn test_compile_flags_force_pattern() {
        let flags = RegexFlags::parse("i").unwrap();
        let matcher = NodeMatcher::compile("Name", flags).unwrap();
        assert!(matches!(matcher, NodeMatcher::Pattern { groups: 0, .. }));
        assert_eq!(matcher.match_key(&key("NAME"), None), Some(vec!["NAME".to_string()]));
    }

    #[test]
    fn test_compile_unbalanced_group_is_malformed() {
        let err = NodeMatcher::compile("a(b", RegexFlags::default()).unwrap_err();
        assert!(matches!(err, PathError::MalformedPath { .. }));
    }

    #[test]
    fn test_compile_trailing_escape_is_malformed() {
        let err = NodeMatcher::compile("ab\\", RegexFlags::default()).unwrap_err();
        assert!(matches!(err, PathError::MalformedPath { .. }));
    }

    #[test]
    fn test_literal_match() {
        let m = compile("name");
        assert_eq!(m.match_key(&key("name"), None), Some(vec![]));
        assert_eq!(m.match_key(&key("Name"), None), None);
        assert_eq!(compile("1").match_key(&PathKey::Index(1), None), Some(vec![]));
    }

    #[test]
    fn test_wildcard_captures() {
        let m = compile("key??");
        assert_eq!(
            m.match_key(&key("key1a"), None),
            Some(vec!["1".to_string(), "a".to_string()])
        );
        assert_eq!(m.match_key(&key("key1"), None), None);

        let star = compile("user_*");
        assert_eq!(
            star.match_key(&key("user_id"), None),
            Some(vec!["id".to_string()])
        );
        assert_eq!(star.match_key(&key("user_"), None), Some(vec![String::new()]));
    }

    #[test]
    fn test_pattern_is_anchored() {
        let m = compile("a*");
        assert!(m.match_key(&key("ba"), None).is_none());
    }

    #[test]
    fn test_alternation_captures_whole_match() {
        let m = compile("id|name");
        assert_eq!(m.match_key(&key("name"), None), Some(vec!["name".to_string()]));
        assert_eq!(m.match_key(&key("ids"), None), None);
    }

    #[test]
    fn test_explicit_group_and_wildcard() {
        let m = compile("(get|set)_*");
        assert_eq!(
            m.match_key(&key("set_value"), None),
            Some(vec!["set".to_string(), "value".to_string()])
        );
    }

    #[test]
    fn test_escaped_wildcard_inside_pattern() {
        let m = compile(r"a\*b*");
        assert_eq!(m.match_key(&key("a*bc"), None), Some(vec!["c".to_string()]));
        assert_eq!(m.match_key(&key("axbc"), None), None);
    }

    #[test]
    fn test_range_match_on_keys() {
        let m = compile("1..2");
        assert_eq!(m.match_key(&PathKey::Index(1), None), Some(vec!["1".to_string()]));
        assert_eq!(m.match_key(&PathKey::Index(3), None), None);
        assert_eq!(m.match_key(&key("2"), None), Some(vec!["2".to_string()]));
        assert_eq!(m.match_key(&key("two"), None), None);
    }

    #[test]
    fn test_exclusive_range() {
        let m = compile("0...2");
        assert!(m.match_key(&PathKey::Index(1), None).is_some());
        assert!(m.match_key(&PathKey::Index(2), None).is_none());
    }

    #[test]
    fn test_negative_range_resolves_against_sequence_length() {
        let m = compile("-2..-1");
        assert!(m.match_key(&PathKey::Index(2), Some(4)).is_some());
        assert!(m.match_key(&PathKey::Index(3), Some(4)).is_some());
        assert!(m.match_key(&PathKey::Index(1), Some(4)).is_none());
    }

    #[test]
    fn test_value_matching_refuses_containers() {
        let seq = DataValue::Seq(vec![2i64.into()]);
        assert!(compile("2").match_value(&seq).is_none());
        assert!(compile("*2*").match_value(&seq).is_none());
        assert_eq!(NodeMatcher::Any.match_value(&seq), Some(vec!["[2]".to_string()]));
    }

    #[test]
    fn test_value_matching_scalars() {
        let value = DataValue::from(2i64);
        assert_eq!(compile("2").match_value(&value), Some(vec![]));
        assert_eq!(compile("1..5").match_value(&value), Some(vec!["2".to_string()]));
        assert_eq!(
            compile("Bob*").match_value(&DataValue::from("Bobby")),
            Some(vec!["by".to_string()])
        );
    }
}
