//! Shared building blocks for valheim-logfilter.
//!
//! - [`config`]: layered configuration (defaults, TOML, env, CLI)
//! - [`error`]: top-level error types
//! - [`metrics`]: metric name constants

pub mod config;
pub mod error;
pub mod metrics;

// --- re-exports ---

pub use config::{GeneralConfig, HookConfig, LogFilterConfig, NameConfig, StreamConfig};
pub use error::{ConfigError, LogFilterError};
