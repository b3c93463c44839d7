//! Rule set -- environment-defined line filters
//!
//! Rules are read once at startup from environment variables whose names
//! start with one of five configurable prefixes:
//!
//! ```text
//! VALHEIM_LOG_FILTER_MATCH_<NAME>=<exact line>
//! VALHEIM_LOG_FILTER_STARTSWITH_<NAME>=<prefix>
//! VALHEIM_LOG_FILTER_ENDSWITH_<NAME>=<suffix>
//! VALHEIM_LOG_FILTER_CONTAINS_<NAME>=<substring>
//! VALHEIM_LOG_FILTER_REGEXP_<NAME>=<regular expression>
//! ON_<full variable name>=<shell command>
//! ```
//!
//! # Architecture
//! - [`RuleSet`]: immutable-after-startup collection, grouped by category
//! - [`loader`]: environment classification and validation
//! - [`matcher`]: first-match evaluation producing an [`Action`]
//! - [`types`]: rule data structures

pub mod loader;
pub mod matcher;
pub mod types;

pub use loader::{RuleLoader, parse_flag};
pub use matcher::{Action, evaluate};
pub use types::{MatchKind, Pattern, Rule};

/// Every filter rule plus the two boolean options.
///
/// Rules keep their load order inside each category. Categories are always
/// evaluated in [`MatchKind::ORDER`], regardless of load order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    exact: Vec<Rule>,
    prefix: Vec<Rule>,
    suffix: Vec<Rule>,
    contains: Vec<Rule>,
    regex: Vec<Rule>,
    filter_empty: bool,
    filter_invalid_encoding: bool,
}

impl RuleSet {
    /// Creates an empty rule set with both options off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule to the end of its category.
    pub fn push(&mut self, rule: Rule) {
        self.bucket_mut(rule.kind()).push(rule);
    }

    /// Rules of one category, in load order.
    pub fn rules(&self, kind: MatchKind) -> &[Rule] {
        match kind {
            MatchKind::Exact => &self.exact,
            MatchKind::Prefix => &self.prefix,
            MatchKind::Suffix => &self.suffix,
            MatchKind::Contains => &self.contains,
            MatchKind::Regex => &self.regex,
        }
    }

    fn bucket_mut(&mut self, kind: MatchKind) -> &mut Vec<Rule> {
        match kind {
            MatchKind::Exact => &mut self.exact,
            MatchKind::Prefix => &mut self.prefix,
            MatchKind::Suffix => &mut self.suffix,
            MatchKind::Contains => &mut self.contains,
            MatchKind::Regex => &mut self.regex,
        }
    }

    /// All rules in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        MatchKind::ORDER
            .iter()
            .flat_map(move |kind| self.rules(*kind).iter())
    }

    /// The first rule that fires for `line`, if any.
    pub fn first_match(&self, line: &[u8]) -> Option<&Rule> {
        self.iter().find(|rule| rule.fires(line))
    }

    /// Total number of rules.
    pub fn len(&self) -> usize {
        MatchKind::ORDER.iter().map(|k| self.rules(*k).len()).sum()
    }

    /// Whether no rule is defined.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether empty lines are dropped.
    pub fn filter_empty(&self) -> bool {
        self.filter_empty
    }

    pub fn set_filter_empty(&mut self, enabled: bool) {
        self.filter_empty = enabled;
    }

    /// Whether invalid UTF-8 is removed from lines.
    pub fn filter_invalid_encoding(&self) -> bool {
        self.filter_invalid_encoding
    }

    pub fn set_filter_invalid_encoding(&mut self, enabled: bool) {
        self.filter_invalid_encoding = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str, pattern: Pattern) -> Rule {
        Rule::new(name, pattern, "")
    }

    #[test]
    fn empty_set_matches_nothing() {
        let set = RuleSet::new();
        assert!(set.is_empty());
        assert!(set.first_match(b"anything").is_none());
        assert!(!set.filter_empty());
        assert!(!set.filter_invalid_encoding());
    }

    #[test]
    fn push_groups_by_category() {
        let mut set = RuleSet::new();
        set.push(rule("R", Pattern::regex("x").unwrap()));
        set.push(rule("C1", Pattern::Contains("a".to_owned())));
        set.push(rule("E", Pattern::Exact("a".to_owned())));
        set.push(rule("C2", Pattern::Contains("b".to_owned())));

        assert_eq!(set.len(), 4);
        assert_eq!(set.rules(MatchKind::Contains).len(), 2);
        assert_eq!(set.rules(MatchKind::Contains)[0].name, "C1");
        assert_eq!(set.rules(MatchKind::Contains)[1].name, "C2");
        assert!(set.rules(MatchKind::Prefix).is_empty());
    }

    #[test]
    fn iter_follows_category_order_not_load_order() {
        let mut set = RuleSet::new();
        set.push(rule("R", Pattern::regex("x").unwrap()));
        set.push(rule("S", Pattern::Suffix("x".to_owned())));
        set.push(rule("E", Pattern::Exact("x".to_owned())));
        set.push(rule("P", Pattern::Prefix("x".to_owned())));
        set.push(rule("C", Pattern::Contains("x".to_owned())));

        let names: Vec<_> = set.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["E", "P", "S", "C", "R"]);
    }

    #[test]
    fn first_match_prefers_earlier_category() {
        let mut set = RuleSet::new();
        set.push(rule("CONTAINS_B", Pattern::Contains("b".to_owned())));
        set.push(rule("PREFIX_AB", Pattern::Prefix("ab".to_owned())));

        let hit = set.first_match(b"abc").unwrap();
        assert_eq!(hit.name, "PREFIX_AB");
    }

    #[test]
    fn flags_round_trip() {
        let mut set = RuleSet::new();
        set.set_filter_empty(true);
        set.set_filter_invalid_encoding(true);
        assert!(set.filter_empty());
        assert!(set.filter_invalid_encoding());
    }
}
