//! Metric names.
//!
//! All counters are defined here and recorded with `metrics::counter!()`
//! by the filter crate. No exporter is installed by the binary; an
//! embedder that sets a global recorder gets the values for free.
//!
//! # Naming
//!
//! - prefix: `logfilter_`
//! - suffix: `_total` for counters
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(logfilter_core::metrics::LINES_READ_TOTAL).increment(1);
//! ```

/// Drop reason label key (`empty`, `rule`, `hook`)
pub const LABEL_REASON: &str = "reason";

/// Rule category label key (`exact`, `prefix`, `suffix`, `contains`, `regex`)
pub const LABEL_CATEGORY: &str = "category";

/// Lines read from input (counter)
pub const LINES_READ_TOTAL: &str = "logfilter_lines_read_total";

/// Lines written to output (counter)
pub const LINES_FORWARDED_TOTAL: &str = "logfilter_lines_forwarded_total";

/// Lines dropped (counter, label: reason)
pub const LINES_DROPPED_TOTAL: &str = "logfilter_lines_dropped_total";

/// Rule matches (counter, label: category)
pub const RULE_MATCHES_TOTAL: &str = "logfilter_rule_matches_total";

/// Lines that had invalid UTF-8 removed (counter)
pub const LINES_REPAIRED_TOTAL: &str = "logfilter_lines_repaired_total";

/// Hooks started (counter)
pub const HOOKS_LAUNCHED_TOTAL: &str = "logfilter_hooks_launched_total";

/// Hooks that failed to spawn or to receive their input (counter)
pub const HOOK_FAILURES_TOTAL: &str = "logfilter_hook_failures_total";
