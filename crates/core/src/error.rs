//! Error types shared by every valheim-logfilter crate.

/// Top-level error type.
///
/// Domain crates define their own error enums and convert into this one
/// so the binary can map any failure to an exit code.
#[derive(Debug, thiserror::Error)]
pub enum LogFilterError {
    /// Configuration error (fatal at startup)
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Rule set could not be built
    #[error("rule error: {0}")]
    Rule(String),

    /// Stream processing failed
    #[error("stream error: {0}")]
    Stream(String),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LogFilterError {
    /// Whether this error happened while building configuration or rules,
    /// i.e. before any line was processed.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Rule(_))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file does not exist
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// Config file could not be parsed
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// A field holds an unusable value
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}
