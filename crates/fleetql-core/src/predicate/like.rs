//! Wildcard patterns written with `*`.
//!
//! `*` matches any run of characters, `\*` is a literal asterisk and a
//! backslash before anything else is a plain backslash. `%` and `_` in user
//! input are plain characters and are escaped when the pattern is rendered as
//! SQL `LIKE`.

use serde::Serialize;
use std::fmt;

const WILDCARD: char = '*';
const ESCAPE: char = '\\';

/// One piece of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    /// Text that must appear verbatim.
    Literal(String),
    /// Any run of characters, possibly empty.
    Any,
}

/// A compiled `*` wildcard pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LikePattern {
    segments: Vec<Segment>,
}

impl LikePattern {
    /// Returns true if `text` contains an unescaped `*`.
    ///
    /// Uses the same escape rule as [`parse`](Self::parse): a backslash only
    /// escapes a directly following `*`, so `\\*` is a backslash and a literal
    /// asterisk.
    #[must_use]
    pub fn has_wildcard(text: &str) -> bool {
        Self::parse(text).segments.contains(&Segment::Any)
    }

    /// Replaces `\*` with `*` in a value that is not a pattern.
    #[must_use]
    pub fn unescape(text: &str) -> String {
        text.replace("\\*", "*")
    }

    /// Compiles `text` into segments. Adjacent wildcards collapse.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                ESCAPE if chars.peek() == Some(&WILDCARD) => {
                    literal.push(WILDCARD);
                    chars.next();
                }
                WILDCARD => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    if segments.last() != Some(&Segment::Any) {
                        segments.push(Segment::Any);
                    }
                }
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self { segments }
    }

    /// Compiled segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Lowercases every literal segment.
    #[must_use]
    pub fn to_lowercase(&self) -> Self {
        Self {
            segments: self
                .segments
                .iter()
                .map(|s| match s {
                    Segment::Literal(text) => Segment::Literal(text.to_lowercase()),
                    Segment::Any => Segment::Any,
                })
                .collect(),
        }
    }

    /// Matches `candidate` against the pattern.
    #[must_use]
    pub fn matches(&self, candidate: &str, ignore_case: bool) -> bool {
        if ignore_case {
            let pattern = self.to_lowercase();
            return pattern.matches_exact(&candidate.to_lowercase());
        }
        self.matches_exact(candidate)
    }

    fn matches_exact(&self, candidate: &str) -> bool {
        let mut rest = candidate;
        let mut anchored = true;
        let last = self.segments.len().saturating_sub(1);

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Any => anchored = false,
                Segment::Literal(text) if i == last && !anchored => {
                    return rest.ends_with(text.as_str());
                }
                Segment::Literal(text) if anchored => match rest.strip_prefix(text.as_str()) {
                    Some(remaining) => rest = remaining,
                    None => return false,
                },
                Segment::Literal(text) => match rest.find(text.as_str()) {
                    Some(at) => rest = &rest[at + text.len()..],
                    None => return false,
                },
            }
        }

        !anchored || rest.is_empty()
    }

    /// Renders the pattern for SQL `LIKE ... ESCAPE '\'`.
    #[must_use]
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Any => out.push('%'),
                Segment::Literal(text) => {
                    for c in text.chars() {
                        if matches!(c, '%' | '_' | ESCAPE) {
                            out.push(ESCAPE);
                        }
                        out.push(c);
                    }
                }
            }
        }
        out
    }
}

impl fmt::Display for LikePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Any => f.write_str("*")?,
                Segment::Literal(text) => f.write_str(&text.replace('*', "\\*"))?,
            }
        }
        Ok(())
    }
}
