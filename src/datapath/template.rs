//! Destination templates for move and map.
//!
//! A template such as `mapped/%1-%3` or `flat/%%` is expanded once per match
//! into a list of destination keys:
//!
//! - `/` starts a new destination segment
//! - `%N` inserts capture `N` (1-indexed, by absolute position)
//! - `%%` inserts the keys walked by the most recent unconsumed recursive
//!   descent, one segment per key
//! - `\` makes the next character literal
//!
//! References that cannot be resolved expand to nothing and are reported as
//! diagnostics; the expansion itself never fails.

use super::error::PathError;
use super::evaluator::PathMatch;
use super::matcher::ESCAPE;
use super::parser::SEPARATOR;
use tracing::warn;

/// Introduces a capture or splat reference.
pub const PLACEHOLDER: char = '%';

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Text(String),
    Capture(usize),
    Splat,
    Separator,
}

/// A parsed destination template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    pieces: Vec<Piece>,
}

impl Template {
    /// Parses a template. Every string is a valid template.
    pub fn parse(template: &str) -> Self {
        let mut pieces = Vec::new();
        let mut text = String::new();
        let mut chars = template.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                ESCAPE => text.push(chars.next().unwrap_or(ESCAPE)),
                SEPARATOR => {
                    flush(&mut pieces, &mut text);
                    pieces.push(Piece::Separator);
                }
                PLACEHOLDER => match chars.peek() {
                    Some(&PLACEHOLDER) => {
                        chars.next();
                        flush(&mut pieces, &mut text);
                        pieces.push(Piece::Splat);
                    }
                    Some(c) if c.is_ascii_digit() => {
                        let mut digits = String::new();
                        while let Some(&d) = chars.peek() {
                            if !d.is_ascii_digit() {
                                break;
                            }
                            digits.push(d);
                            chars.next();
                        }
                        flush(&mut pieces, &mut text);
                        pieces.push(Piece::Capture(digits.parse().unwrap_or(usize::MAX)));
                    }
                    _ => text.push(PLACEHOLDER),
                },
                other => text.push(other),
            }
        }
        flush(&mut pieces, &mut text);

        if pieces.first() == Some(&Piece::Separator) {
            pieces.remove(0);
        }
        if pieces.last() == Some(&Piece::Separator) {
            pieces.pop();
        }

        Self {
            source: template.to_string(),
            pieces,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Expands the template for one match. Returns no segments for an empty
    /// template. Unresolvable references are pushed onto `diagnostics`.
    pub fn expand(&self, found: &PathMatch, diagnostics: &mut Vec<PathError>) -> Vec<String> {
        if self.pieces.is_empty() {
            return Vec::new();
        }

        let mut segments = Vec::new();
        let mut current = String::new();
        // Set when the current segment so far comes only from an empty splat.
        let mut vacant = false;
        let mut splats = found.splats.iter().rev().map(|(_, keys)| keys);

        for piece in &self.pieces {
            match piece {
                Piece::Text(text) => current.push_str(text),
                Piece::Separator => {
                    if !(vacant && current.is_empty()) {
                        segments.push(std::mem::take(&mut current));
                    }
                    vacant = false;
                }
                Piece::Capture(n) => match found.capture(*n) {
                    Some(capture) => current.push_str(capture),
                    None => self.degrade(
                        PathError::TemplateCaptureOutOfRange {
                            template: self.source.clone(),
                            index: *n,
                            available: found.captures.len(),
                        },
                        diagnostics,
                    ),
                },
                Piece::Splat => match splats.next() {
                    Some(keys) if keys.is_empty() => vacant = true,
                    Some(keys) => {
                        for (i, key) in keys.iter().enumerate() {
                            // The first key fills the current segment if it is still empty.
                            if i > 0 || !current.is_empty() {
                                segments.push(std::mem::take(&mut current));
                            }
                            current.push_str(&key.to_string());
                        }
                    }
                    None => self.degrade(
                        PathError::UnknownSplat {
                            template: self.source.clone(),
                        },
                        diagnostics,
                    ),
                },
            }
        }
        if !(vacant && current.is_empty()) {
            segments.push(current);
        }
        segments
    }

    fn degrade(&self, err: PathError, diagnostics: &mut Vec<PathError>) {
        warn!(error = %err, "template reference expanded to an empty literal");
        diagnostics.push(err);
    }
}

fn flush(pieces: &mut Vec<Piece>, text: &mut String) {
    if !text.is_empty() {
        pieces.push(Piece::Text(std::mem::take(text)));
    }
}
