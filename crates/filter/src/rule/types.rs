//! Rule data types

use std::fmt;

use regex::bytes::Regex;

/// Rule category.
///
/// Categories are evaluated in the order of [`MatchKind::ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    /// Whole line equals the pattern
    Exact,
    /// Line starts with the pattern
    Prefix,
    /// Line ends with the pattern
    Suffix,
    /// Pattern occurs anywhere in the line
    Contains,
    /// Regular expression matches anywhere in the line
    Regex,
}

impl MatchKind {
    /// Fixed evaluation order.
    pub const ORDER: [MatchKind; 5] = [
        MatchKind::Exact,
        MatchKind::Prefix,
        MatchKind::Suffix,
        MatchKind::Contains,
        MatchKind::Regex,
    ];

    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Prefix => "prefix",
            Self::Suffix => "suffix",
            Self::Contains => "contains",
            Self::Regex => "regex",
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a rule looks for.
///
/// Matching works on raw bytes so that lines which are not valid UTF-8 can
/// still be evaluated when repair is disabled.
#[derive(Debug, Clone)]
pub enum Pattern {
    Exact(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
    Regex(Regex),
}

impl Pattern {
    /// Compiles a regular-expression pattern.
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self::Regex)
    }

    /// Category of this pattern.
    pub fn kind(&self) -> MatchKind {
        match self {
            Self::Exact(_) => MatchKind::Exact,
            Self::Prefix(_) => MatchKind::Prefix,
            Self::Suffix(_) => MatchKind::Suffix,
            Self::Contains(_) => MatchKind::Contains,
            Self::Regex(_) => MatchKind::Regex,
        }
    }

    /// Source text of the pattern.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Exact(s) | Self::Prefix(s) | Self::Suffix(s) | Self::Contains(s) => s,
            Self::Regex(re) => re.as_str(),
        }
    }

    /// Whether the pattern fires for `line`.
    pub fn is_match(&self, line: &[u8]) -> bool {
        match self {
            Self::Exact(s) => line == s.as_bytes(),
            Self::Prefix(s) => line.starts_with(s.as_bytes()),
            Self::Suffix(s) => line.ends_with(s.as_bytes()),
            Self::Contains(s) => contains(line, s.as_bytes()),
            Self::Regex(re) => re.is_match(line),
        }
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// A single filter rule.
///
/// An empty `command` means the line is removed and nothing else happens.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Environment variable that defined the rule
    pub name: String,
    /// Match pattern
    pub pattern: Pattern,
    /// Shell command run on match (may be empty)
    pub command: String,
}

impl Rule {
    pub fn new(name: impl Into<String>, pattern: Pattern, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern,
            command: command.into(),
        }
    }

    /// Category of this rule.
    pub fn kind(&self) -> MatchKind {
        self.pattern.kind()
    }

    /// Whether a match runs a hook.
    pub fn has_command(&self) -> bool {
        !self.command.is_empty()
    }

    /// Whether the rule fires for `line`.
    pub fn fires(&self, line: &[u8]) -> bool {
        self.pattern.is_match(line)
    }
}
