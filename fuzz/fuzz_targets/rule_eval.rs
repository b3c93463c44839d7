#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use logfilter_filter::rule::{Action, Pattern, Rule, RuleSet, evaluate};

/// Structured fuzzer input
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    rules: Vec<FuzzRule>,
    line: Vec<u8>,
}

#[derive(Arbitrary, Debug)]
struct FuzzRule {
    kind: FuzzKind,
    pattern: String,
    command: String,
}

#[derive(Arbitrary, Debug)]
enum FuzzKind {
    Exact,
    Prefix,
    Suffix,
    Contains,
    Regex,
}

impl FuzzRule {
    fn build(self, idx: usize) -> Option<Rule> {
        let pattern = match self.kind {
            FuzzKind::Exact => Pattern::Exact(self.pattern),
            FuzzKind::Prefix => Pattern::Prefix(self.pattern),
            FuzzKind::Suffix => Pattern::Suffix(self.pattern),
            FuzzKind::Contains => Pattern::Contains(self.pattern),
            // Invalid or oversized expressions are rejected at load time.
            FuzzKind::Regex => Pattern::regex(&self.pattern).ok()?,
        };
        Some(Rule::new(format!("FUZZ_{idx}"), pattern, self.command))
    }
}

fuzz_target!(|input: FuzzInput| {
    let mut set = RuleSet::new();
    for (idx, rule) in input.rules.into_iter().take(16).enumerate() {
        if let Some(rule) = rule.build(idx) {
            set.push(rule);
        }
    }

    let action = evaluate(&input.line, &set);

    // The outcome must agree with the first rule that fires.
    match set.first_match(&input.line) {
        None => assert_eq!(action, Action::Keep),
        Some(rule) if rule.command.is_empty() => assert_eq!(action, Action::DropSilently),
        Some(rule) => assert_eq!(action, Action::DropAndRun(rule.command.as_str())),
    }
});
