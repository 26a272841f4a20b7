//! Allow-list matching.
//!
//! # Responsibilities
//! - Normalize loosely-typed config (one string or a list) into patterns
//! - Decide whether a candidate string is permitted
//! - Produce a rejection that names the candidate and the list
//!
//! # Design Decisions
//! - Exact entries compare the whole string (case-sensitive)
//! - Entries ending in `*` match any candidate starting with the rest
//! - First matching entry wins; order only affects short-circuiting

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Trailing marker that turns an entry into a prefix pattern.
pub const WILDCARD: char = '*';

/// A single allow-list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// Candidate must equal this string.
    Exact(String),
    /// Candidate must start with this string.
    Prefix(String),
}

impl Pattern {
    /// Parse a raw config entry. Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.strip_suffix(WILDCARD) {
            Some(prefix) => Pattern::Prefix(prefix.to_string()),
            None => Pattern::Exact(raw.to_string()),
        }
    }

    /// Returns true if the candidate satisfies this pattern.
    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            Pattern::Exact(expected) => candidate == expected,
            Pattern::Prefix(prefix) => candidate.starts_with(prefix.as_str()),
        }
    }

    /// A `*` anywhere but the end is never expanded and is almost always a typo.
    pub fn has_misplaced_wildcard(&self) -> bool {
        match self {
            Pattern::Exact(s) | Pattern::Prefix(s) => s.contains(WILDCARD),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Exact(s) => write!(f, "{}", s),
            Pattern::Prefix(s) => write!(f, "{}{}", s, WILDCARD),
        }
    }
}

/// Returns true if `candidate` is permitted by `patterns`.
///
/// An empty pattern set permits everything.
pub fn is_permitted(candidate: &str, patterns: &[Pattern]) -> bool {
    patterns.is_empty() || patterns.iter().any(|p| p.matches(candidate))
}

/// Rejection produced when a candidate matches no entry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("'{candidate}' is not in allow list [{allowed}]")]
pub struct NotAllowed {
    /// The rejected value.
    pub candidate: String,
    /// The configured entries, comma separated.
    pub allowed: String,
}

/// Shape accepted in config files: a single string or an array of strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAllowList {
    One(String),
    Many(Vec<String>),
}

/// Normalized set of allow-list patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "RawAllowList", into = "Vec<String>")]
pub struct AllowList {
    patterns: Vec<Pattern>,
}

impl AllowList {
    /// Build from raw entries. Blank entries are dropped.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = entries
            .into_iter()
            .filter(|e| !e.as_ref().trim().is_empty())
            .map(|e| Pattern::parse(e.as_ref()))
            .collect();
        Self { patterns }
    }

    /// Parse a comma separated list, as found in environment variables.
    pub fn from_delimited(value: &str) -> Self {
        Self::new(value.split(','))
    }

    /// No entries configured: everything is permitted.
    pub fn is_open(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Check a candidate, returning a descriptive rejection on failure.
    pub fn check(&self, candidate: &str) -> Result<(), NotAllowed> {
        if is_permitted(candidate, &self.patterns) {
            return Ok(());
        }
        Err(NotAllowed {
            candidate: candidate.to_string(),
            allowed: self.to_string(),
        })
    }
}

impl fmt::Display for AllowList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, pattern) in self.patterns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", pattern)?;
        }
        Ok(())
    }
}

impl From<RawAllowList> for AllowList {
    fn from(raw: RawAllowList) -> Self {
        match raw {
            RawAllowList::One(value) => Self::from_delimited(&value),
            RawAllowList::Many(values) => Self::new(values),
        }
    }
}

impl From<AllowList> for Vec<String> {
    fn from(list: AllowList) -> Self {
        list.patterns.iter().map(ToString::to_string).collect()
    }
}
