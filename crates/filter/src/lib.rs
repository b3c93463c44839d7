//! Line filtering for Valheim dedicated-server logs.
//!
//! # Modules
//!
//! - [`rule`]: rule model, environment loader and first-match evaluation
//! - [`sanitize`]: empty-line removal and invalid UTF-8 repair
//! - [`hook`]: fire-and-forget shell hooks for matched lines
//! - [`driver`]: the stream loop tying the above together
//! - [`error`]: domain error type
//!
//! # Architecture
//!
//! ```text
//! stdin -> LineFilter -> sanitize -> evaluate -> stdout
//!                                       |
//!                                  HookLauncher -> sh -c <command>
//! ```

pub mod driver;
pub mod error;
pub mod hook;
pub mod rule;
pub mod sanitize;

// --- re-exports ---

pub use driver::{DriverState, FilterStats, LineFilter, LineFilterBuilder, LineOutcome};
pub use error::FilterError;
pub use hook::HookLauncher;
pub use rule::{Action, MatchKind, Pattern, Rule, RuleLoader, RuleSet, evaluate};
pub use sanitize::sanitize;
