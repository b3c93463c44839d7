//! Rule loader -- builds a [`RuleSet`] from `(name, value)` entries.
//!
//! Names are classified against [`NameConfig`] in this order: match,
//! starts-with, ends-with, contains, regexp prefixes, then the exact
//! empty-line and UTF-8 flag names. The first prefix that matches wins, so
//! a name that happens to start with two configured prefixes is only
//! classified once.
//!
//! Entries are consumed in the order the source yields them. For the
//! process environment that order is platform dependent; rules of the same
//! category may therefore be evaluated in a different order across runs.

use logfilter_core::config::NameConfig;
use tracing::{debug, info, warn};

use crate::error::FilterError;

use super::RuleSet;
use super::types::{MatchKind, Pattern, Rule};

/// Parses a boolean toggle value.
///
/// Only the literal `"true"` enables a toggle. Everything else, including
/// `"TRUE"`, `"1"` and `"false"`, disables it without a warning.
pub fn parse_flag(value: &str) -> bool {
    value == "true"
}

/// Classifies configuration entries into a [`RuleSet`].
pub struct RuleLoader<'a> {
    names: &'a NameConfig,
}

impl<'a> RuleLoader<'a> {
    pub fn new(names: &'a NameConfig) -> Self {
        Self { names }
    }

    /// Builds the rule set from the current process environment.
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped with a
    /// warning. Hook commands are looked up as `<command_prefix><name>`.
    ///
    /// # Errors
    /// Returns [`FilterError::RuleValidation`] when a regexp rule does not
    /// compile.
    pub fn load_env(&self) -> Result<RuleSet, FilterError> {
        let entries = std::env::vars_os().filter_map(|(key, value)| {
            match (key.into_string(), value.into_string()) {
                (Ok(key), Ok(value)) => Some((key, value)),
                (Ok(key), Err(_)) => {
                    warn!(name = %key, "environment value is not valid UTF-8, skipping");
                    None
                }
                (Err(key), _) => {
                    warn!(name = ?key, "environment name is not valid UTF-8, skipping");
                    None
                }
            }
        });

        self.load_entries(entries, |name| std::env::var(name).ok())
    }

    /// Builds the rule set from arbitrary entries.
    ///
    /// `lookup` resolves companion hook variables by full name. An unset or
    /// empty companion means the rule only removes lines.
    pub fn load_entries<I, K, V, F>(&self, entries: I, lookup: F) -> Result<RuleSet, FilterError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
        F: Fn(&str) -> Option<String>,
    {
        let mut set = RuleSet::new();

        for (name, value) in entries {
            let (name, value) = (name.as_ref(), value.as_ref());
            if value.is_empty() {
                continue;
            }

            if let Some(kind) = self.classify(name) {
                let hook_name = format!("{}{name}", self.names.command_prefix);
                let command = lookup(hook_name.as_str()).unwrap_or_default();
                let rule = build_rule(kind, name, value, command)?;
                if rule.has_command() {
                    debug!(
                        rule = %rule.name,
                        category = %kind,
                        pattern = value,
                        command = %rule.command,
                        "on matching lines running hook"
                    );
                } else {
                    debug!(rule = %rule.name, category = %kind, pattern = value, "removing matching lines");
                }
                set.push(rule);
            } else if name == self.names.empty_flag {
                set.set_filter_empty(parse_flag(value));
                debug!(enabled = set.filter_empty(), "removing empty lines");
            } else if name == self.names.utf8_flag {
                set.set_filter_invalid_encoding(parse_flag(value));
                debug!(
                    enabled = set.filter_invalid_encoding(),
                    "removing invalid UTF-8 sequences"
                );
            }
        }

        info!(
            rules = set.len(),
            filter_empty = set.filter_empty(),
            filter_invalid_encoding = set.filter_invalid_encoding(),
            "rule set loaded"
        );

        Ok(set)
    }

    fn classify(&self, name: &str) -> Option<MatchKind> {
        let names = self.names;
        [
            (names.match_prefix.as_str(), MatchKind::Exact),
            (names.starts_with_prefix.as_str(), MatchKind::Prefix),
            (names.ends_with_prefix.as_str(), MatchKind::Suffix),
            (names.contains_prefix.as_str(), MatchKind::Contains),
            (names.regexp_prefix.as_str(), MatchKind::Regex),
        ]
        .into_iter()
        .find(|(prefix, _)| name.starts_with(prefix))
        .map(|(_, kind)| kind)
    }
}

fn build_rule(kind: MatchKind, name: &str, value: &str, command: String) -> Result<Rule, FilterError> {
    let pattern = match kind {
        MatchKind::Exact => Pattern::Exact(value.to_owned()),
        MatchKind::Prefix => Pattern::Prefix(value.to_owned()),
        MatchKind::Suffix => Pattern::Suffix(value.to_owned()),
        MatchKind::Contains => Pattern::Contains(value.to_owned()),
        MatchKind::Regex => Pattern::regex(value).map_err(|e| FilterError::RuleValidation {
            rule: name.to_owned(),
            reason: format!("invalid regex '{value}': {e}"),
        })?,
    };
    Ok(Rule::new(name, pattern, command))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(entries: &[(&str, &str)], hooks: &[(&str, &str)]) -> Result<RuleSet, FilterError> {
        let names = NameConfig::default();
        let hooks: HashMap<String, String> = hooks
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        RuleLoader::new(&names).load_entries(entries.iter().copied(), |k| hooks.get(k).cloned())
    }

    #[test]
    fn classifies_each_prefix() {
        let set = load(
            &[
                ("VALHEIM_LOG_FILTER_MATCH_A", "exact line"),
                ("VALHEIM_LOG_FILTER_STARTSWITH_B", "(Filename:"),
                ("VALHEIM_LOG_FILTER_ENDSWITH_C", "Line: 35)"),
                ("VALHEIM_LOG_FILTER_CONTAINS_D", "ZDOID"),
                ("VALHEIM_LOG_FILTER_REGEXP_E", "player[0-9]+"),
                ("UNRELATED", "value"),
            ],
            &[],
        )
        .unwrap();

        assert_eq!(set.len(), 5);
        for kind in MatchKind::ORDER {
            assert_eq!(set.rules(kind).len(), 1, "category {kind}");
        }
        assert_eq!(set.rules(MatchKind::Contains)[0].pattern.as_str(), "ZDOID");
    }

    #[test]
    fn bare_prefix_is_a_rule() {
        let set = load(&[("VALHEIM_LOG_FILTER_CONTAINS", "x")], &[]).unwrap();
        assert_eq!(set.rules(MatchKind::Contains).len(), 1);
    }

    #[test]
    fn empty_values_are_skipped() {
        let set = load(
            &[
                ("VALHEIM_LOG_FILTER_MATCH_A", ""),
                ("VALHEIM_LOG_FILTER_EMPTY", ""),
            ],
            &[],
        )
        .unwrap();
        assert!(set.is_empty());
        assert!(!set.filter_empty());
    }

    #[test]
    fn hook_is_attached_by_companion_name() {
        let set = load(
            &[("VALHEIM_LOG_FILTER_CONTAINS_Connected", "Got character ZDOID")],
            &[("ON_VALHEIM_LOG_FILTER_CONTAINS_Connected", "notify.sh")],
        )
        .unwrap();

        let rule = &set.rules(MatchKind::Contains)[0];
        assert_eq!(rule.name, "VALHEIM_LOG_FILTER_CONTAINS_Connected");
        assert_eq!(rule.command, "notify.sh");
    }

    #[test]
    fn empty_companion_means_silent_removal() {
        let set = load(
            &[("VALHEIM_LOG_FILTER_MATCH_A", "x")],
            &[("ON_VALHEIM_LOG_FILTER_MATCH_A", "")],
        )
        .unwrap();
        assert!(!set.rules(MatchKind::Exact)[0].has_command());
    }

    #[test]
    fn flags_accept_only_literal_true() {
        for (value, expected) in [
            ("true", true),
            ("false", false),
            ("TRUE", false),
            ("1", false),
            ("yes", false),
        ] {
            let set = load(
                &[
                    ("VALHEIM_LOG_FILTER_EMPTY", value),
                    ("VALHEIM_LOG_FILTER_UTF8", value),
                ],
                &[],
            )
            .unwrap();
            assert_eq!(set.filter_empty(), expected, "value {value:?}");
            assert_eq!(set.filter_invalid_encoding(), expected, "value {value:?}");
        }
    }

    #[test]
    fn later_flag_entry_overrides_earlier() {
        let set = load(
            &[
                ("VALHEIM_LOG_FILTER_EMPTY", "true"),
                ("VALHEIM_LOG_FILTER_EMPTY", "nope"),
            ],
            &[],
        )
        .unwrap();
        assert!(!set.filter_empty());
    }

    #[test]
    fn flag_names_must_match_exactly() {
        let set = load(&[("VALHEIM_LOG_FILTER_EMPTY_X", "true")], &[]).unwrap();
        assert!(!set.filter_empty());
        assert!(set.is_empty());
    }

    #[test]
    fn invalid_regex_is_fatal() {
        let err = load(&[("VALHEIM_LOG_FILTER_REGEXP_BAD", "[unclosed")], &[]).unwrap_err();
        match err {
            FilterError::RuleValidation { rule, .. } => {
                assert_eq!(rule, "VALHEIM_LOG_FILTER_REGEXP_BAD");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn entry_order_is_preserved_within_category() {
        let set = load(
            &[
                ("VALHEIM_LOG_FILTER_CONTAINS_2", "second"),
                ("VALHEIM_LOG_FILTER_CONTAINS_1", "first"),
            ],
            &[],
        )
        .unwrap();
        let names: Vec<_> = set
            .rules(MatchKind::Contains)
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(
            names,
            ["VALHEIM_LOG_FILTER_CONTAINS_2", "VALHEIM_LOG_FILTER_CONTAINS_1"]
        );
    }

    #[test]
    fn custom_names_are_honoured() {
        let names = NameConfig {
            contains_prefix: "DROP_".to_owned(),
            empty_flag: "NO_BLANKS".to_owned(),
            command_prefix: "HOOK_".to_owned(),
            ..NameConfig::default()
        };
        let set = RuleLoader::new(&names)
            .load_entries([("DROP_x", "noise"), ("NO_BLANKS", "true")], |k| {
                (k == "HOOK_DROP_x").then(|| "logger".to_owned())
            })
            .unwrap();

        assert!(set.filter_empty());
        assert_eq!(set.rules(MatchKind::Contains)[0].command, "logger");
    }

    #[test]
    fn overlapping_prefixes_classify_once() {
        // Match prefix is checked before contains, so this becomes an exact rule.
        let names = NameConfig {
            match_prefix: "F_".to_owned(),
            contains_prefix: "F_C".to_owned(),
            ..NameConfig::default()
        };
        let set = RuleLoader::new(&names)
            .load_entries([("F_CX", "v")], |_| None)
            .unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.rules(MatchKind::Exact).len(), 1);
    }

    #[test]
    fn parse_flag_literal() {
        assert!(parse_flag("true"));
        assert!(!parse_flag("True"));
        assert!(!parse_flag(""));
    }
}
