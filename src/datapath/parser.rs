//! Path string compiler.
//!
//! Splits a full path such as `users/**/email=*@example.com//i` into
//! `PathSegment`s, honouring `\` escapes, the `**` recursion marker, the `..`
//! parent marker and a trailing `//flags` suffix.

use super::ast::{CompiledPath, NodeMatcher, PathSegment, RegexFlags};
use super::error::{PathError, Result};
use super::matcher::ESCAPE;
use tracing::debug;

/// Segment separator.
pub const SEPARATOR: char = '/';
/// Separates a segment's key part from its value part.
pub const VALUE_SEPARATOR: char = '=';
/// Marks the next segment as recursive.
pub const RECURSIVE: &str = "**";
/// Moves the match up one level.
pub const PARENT: &str = "..";

/// One input character and whether it was escaped.
#[derive(Debug, Clone, Copy)]
struct Token {
    ch: char,
    escaped: bool,
}

impl Token {
    fn is(&self, ch: char) -> bool {
        !self.escaped && self.ch == ch
    }
}

/// Compiler for path-language strings.
pub struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
}

impl<'a> Parser<'a> {
    /// Tokenizes `path`, failing on an unterminated escape.
    pub fn new(path: &'a str) -> Result<Self> {
        let mut tokens = Vec::with_capacity(path.len());
        let mut chars = path.chars();
        while let Some(ch) = chars.next() {
            if ch == ESCAPE {
                match chars.next() {
                    Some(lit) => tokens.push(Token {
                        ch: lit,
                        escaped: true,
                    }),
                    None => {
                        return Err(PathError::malformed(path, "\\", "unterminated escape"));
                    }
                }
            } else {
                tokens.push(Token { ch, escaped: false });
            }
        }
        Ok(Self {
            input: path,
            tokens,
        })
    }

    /// Compiles a path string.
    pub fn parse(path: &str) -> Result<CompiledPath> {
        Parser::new(path)?.parse_path()
    }

    fn parse_path(&self) -> Result<CompiledPath> {
        let (body, flags) = self.split_flags();
        let body = trim_separators(body);

        let mut segments = Vec::new();
        let mut recursive = false;

        if !body.is_empty() {
            for raw in body.split(|t| t.is(SEPARATOR)) {
                if is_reserved(raw, RECURSIVE) {
                    recursive = true;
                    continue;
                }
                if is_reserved(raw, PARENT) {
                    // `**/..` has no meaning; drop both.
                    if !recursive {
                        segments.push(PathSegment::parent());
                    }
                    recursive = false;
                    continue;
                }
                segments.push(self.parse_segment(raw, flags, recursive)?);
                recursive = false;
            }
        }

        // A trailing `**` selects everything below.
        if recursive {
            segments.push(PathSegment::new(NodeMatcher::Any, None, true));
        }

        debug!(path = self.input, segments = segments.len(), "compiled path");
        Ok(CompiledPath::new(self.input, segments, flags))
    }

    /// Strips a trailing `//flags` suffix when every letter after the last
    /// unescaped `//` is a known flag.
    fn split_flags(&self) -> (&[Token], RegexFlags) {
        let tokens = &self.tokens[..];
        let Some(pos) = (0..tokens.len().saturating_sub(1))
            .rev()
            .find(|&i| tokens[i].is(SEPARATOR) && tokens[i + 1].is(SEPARATOR))
        else {
            return (tokens, RegexFlags::default());
        };

        let suffix = &tokens[pos + 2..];
        if suffix.is_empty() || suffix.iter().any(|t| t.escaped) {
            return (tokens, RegexFlags::default());
        }
        let letters: String = suffix.iter().map(|t| t.ch).collect();
        match RegexFlags::parse(&letters) {
            Some(flags) => (&tokens[..pos], flags),
            None => (tokens, RegexFlags::default()),
        }
    }

    fn parse_segment(
        &self,
        raw: &[Token],
        flags: RegexFlags,
        recursive: bool,
    ) -> Result<PathSegment> {
        let mut parts = raw.split(|t| t.is(VALUE_SEPARATOR));
        let key_part = parts.next().unwrap_or_default();
        let value_part = parts.next();
        if parts.next().is_some() {
            return Err(PathError::malformed(
                self.input,
                &render(raw),
                "dangling '='",
            ));
        }

        // `**=value`: any key at any depth whose value matches.
        let (key, recursive) = if value_part.is_some() && is_reserved(key_part, RECURSIVE) {
            (NodeMatcher::Any, true)
        } else {
            (self.compile_part(key_part, flags)?, recursive)
        };
        let value = value_part
            .map(|part| self.compile_part(part, flags))
            .transpose()?;

        Ok(PathSegment::new(key, value, recursive))
    }

    fn compile_part(&self, part: &[Token], flags: RegexFlags) -> Result<NodeMatcher> {
        NodeMatcher::compile(&render(part), flags).map_err(|e| e.in_path(self.input))
    }
}

/// Re-escapes tokens so the pattern compiler sees the original escapes.
fn render(tokens: &[Token]) -> String {
    let mut out = String::with_capacity(tokens.len());
    for t in tokens {
        if t.escaped {
            out.push(ESCAPE);
        }
        out.push(t.ch);
    }
    out
}

fn is_reserved(tokens: &[Token], word: &str) -> bool {
    tokens.len() == word.chars().count()
        && tokens
            .iter()
            .zip(word.chars())
            .all(|(t, ch)| t.is(ch))
}

/// Drops one leading and one trailing separator.
fn trim_separators(tokens: &[Token]) -> &[Token] {
    let tokens = match tokens.first() {
        Some(t) if t.is(SEPARATOR) => &tokens[1..],
        _ => tokens,
    };
    match tokens.last() {
        Some(t) if t.is(SEPARATOR) => &tokens[..tokens.len() - 1],
        _ => tokens,
    }
}
