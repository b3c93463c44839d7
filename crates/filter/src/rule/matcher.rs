//! First-match rule evaluation.

use logfilter_core::metrics as m;
use tracing::trace;

use super::RuleSet;

/// Outcome of evaluating one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'a> {
    /// No rule fired; forward the line.
    Keep,
    /// A rule without a command fired.
    DropSilently,
    /// A rule with a command fired; the line is dropped and the command run.
    DropAndRun(&'a str),
}

impl Action<'_> {
    /// Whether the line is written to the output.
    pub fn forwards(&self) -> bool {
        matches!(self, Self::Keep)
    }
}

/// Evaluates `line` against `rules`.
///
/// Categories are walked in fixed order and rules in load order. The first
/// rule that fires decides the outcome; nothing after it is checked.
pub fn evaluate<'a>(line: &[u8], rules: &'a RuleSet) -> Action<'a> {
    let Some(rule) = rules.first_match(line) else {
        trace!("line matched no rule");
        return Action::Keep;
    };

    let category = rule.kind().as_str();
    metrics::counter!(m::RULE_MATCHES_TOTAL, m::LABEL_CATEGORY => category).increment(1);
    trace!(rule = %rule.name, category, "line matched rule");

    if rule.has_command() {
        Action::DropAndRun(&rule.command)
    } else {
        Action::DropSilently
    }
}
