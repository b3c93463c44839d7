//! Filter error types
//!
//! [`FilterError`] covers rule construction, stream I/O and hook execution.
//! `From<FilterError> for LogFilterError` lets the binary propagate it with `?`.

use logfilter_core::error::{ConfigError, LogFilterError};

/// Filter domain error
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// A rule could not be built (e.g. the regex does not compile)
    #[error("rule validation error: rule '{rule}': {reason}")]
    RuleValidation {
        /// Environment variable that defined the rule
        rule: String,
        /// Why it was rejected
        reason: String,
    },

    /// Driver setting out of range
    #[error("config error: {field}: {reason}")]
    Config {
        /// Setting name
        field: String,
        /// Why it was rejected
        reason: String,
    },

    /// An input line exceeded the configured limit
    #[error("line too long: more than {max} bytes")]
    LineTooLong {
        /// Configured limit in bytes
        max: usize,
    },

    /// The hook process could not be started
    #[error("hook spawn failed for '{command}': {reason}")]
    HookSpawn {
        /// Shell command
        command: String,
        /// OS error
        reason: String,
    },

    /// The matched line could not be delivered to the hook's stdin
    #[error("hook input failed for '{command}': {reason}")]
    HookInput {
        /// Shell command
        command: String,
        /// I/O error
        reason: String,
    },

    /// The driver already reached end of stream
    #[error("line filter already closed")]
    Closed,

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<FilterError> for LogFilterError {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::RuleValidation { .. } => LogFilterError::Rule(err.to_string()),
            FilterError::Config { field, reason } => {
                LogFilterError::Config(ConfigError::InvalidValue { field, reason })
            }
            FilterError::Io(e) => LogFilterError::Io(e),
            other => LogFilterError::Stream(other.to_string()),
        }
    }
}
