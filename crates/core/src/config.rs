//! Configuration management: `logfilter.toml` parsing and runtime settings.
//!
//! [`LogFilterConfig`] holds everything the binary needs before the first
//! line is read. The filter rules themselves are *not* part of this file;
//! they are discovered from the process environment using the variable
//! names configured in [`NameConfig`].
//!
//! # Load order
//! 1. CLI flags (highest)
//! 2. Environment variables (`LOGFILTER_HOOK_SHELL=/bin/bash` style)
//! 3. Config file (`logfilter.toml`, optional)
//! 4. Defaults (`Default` impls)
//!
//! # Example
//! ```no_run
//! # async fn example() -> Result<(), logfilter_core::error::LogFilterError> {
//! use logfilter_core::config::LogFilterConfig;
//!
//! // file + env overrides
//! let config = LogFilterConfig::load("logfilter.toml").await?;
//!
//! // straight from a TOML string
//! let config = LogFilterConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LogFilterError};

/// Default prefix of exact-match rule variables.
pub const DEFAULT_MATCH_PREFIX: &str = "VALHEIM_LOG_FILTER_MATCH";
/// Default prefix of starts-with rule variables.
pub const DEFAULT_STARTS_WITH_PREFIX: &str = "VALHEIM_LOG_FILTER_STARTSWITH";
/// Default prefix of ends-with rule variables.
pub const DEFAULT_ENDS_WITH_PREFIX: &str = "VALHEIM_LOG_FILTER_ENDSWITH";
/// Default prefix of contains rule variables.
pub const DEFAULT_CONTAINS_PREFIX: &str = "VALHEIM_LOG_FILTER_CONTAINS";
/// Default prefix of regular-expression rule variables.
pub const DEFAULT_REGEXP_PREFIX: &str = "VALHEIM_LOG_FILTER_REGEXP";
/// Default name of the empty-line toggle.
pub const DEFAULT_EMPTY_FLAG: &str = "VALHEIM_LOG_FILTER_EMPTY";
/// Default name of the invalid-UTF-8 toggle.
pub const DEFAULT_UTF8_FLAG: &str = "VALHEIM_LOG_FILTER_UTF8";
/// Prefix prepended to a rule variable name to find its hook command.
pub const DEFAULT_COMMAND_PREFIX: &str = "ON_";
/// Default shell hook commands run under.
pub const DEFAULT_SHELL: &str = "/bin/sh";
/// Default longest accepted line in bytes (64KB).
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogFilterConfig {
    /// Diagnostics
    #[serde(default)]
    pub general: GeneralConfig,
    /// Environment variable naming conventions
    #[serde(default)]
    pub names: NameConfig,
    /// Hook execution
    #[serde(default)]
    pub hook: HookConfig,
    /// Input stream limits
    #[serde(default)]
    pub stream: StreamConfig,
}

impl LogFilterConfig {
    /// Loads a TOML file, applies environment overrides and validates.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LogFilterError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Loads a TOML file without environment overrides.
    ///
    /// Not validated: higher layers may still replace bad values, so callers
    /// run [`validate`](Self::validate) once every layer is applied.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LogFilterError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogFilterError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogFilterError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// Parses a TOML string. Missing sections and fields keep their defaults.
    pub fn parse(toml_str: &str) -> Result<Self, LogFilterError> {
        toml::from_str(toml_str).map_err(|e| {
            LogFilterError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// Applies `LOGFILTER_{SECTION}_{FIELD}` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGFILTER_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGFILTER_GENERAL_LOG_FORMAT");

        // Names
        override_string(&mut self.names.match_prefix, "LOGFILTER_NAMES_MATCH_PREFIX");
        override_string(
            &mut self.names.starts_with_prefix,
            "LOGFILTER_NAMES_STARTS_WITH_PREFIX",
        );
        override_string(
            &mut self.names.ends_with_prefix,
            "LOGFILTER_NAMES_ENDS_WITH_PREFIX",
        );
        override_string(
            &mut self.names.contains_prefix,
            "LOGFILTER_NAMES_CONTAINS_PREFIX",
        );
        override_string(&mut self.names.regexp_prefix, "LOGFILTER_NAMES_REGEXP_PREFIX");
        override_string(&mut self.names.empty_flag, "LOGFILTER_NAMES_EMPTY_FLAG");
        override_string(&mut self.names.utf8_flag, "LOGFILTER_NAMES_UTF8_FLAG");
        override_string(
            &mut self.names.command_prefix,
            "LOGFILTER_NAMES_COMMAND_PREFIX",
        );

        // Hook
        override_string(&mut self.hook.shell, "LOGFILTER_HOOK_SHELL");

        // Stream
        override_usize(
            &mut self.stream.max_line_length,
            "LOGFILTER_STREAM_MAX_LINE_LENGTH",
        );
    }

    /// Validates all values. Every variable name must be non-empty.
    pub fn validate(&self) -> Result<(), LogFilterError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        for (field, value) in self.names.fields() {
            if value.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("names.{field}"),
                    reason: "variable name must not be empty".to_owned(),
                }
                .into());
            }
        }

        if self.hook.shell.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "hook.shell".to_owned(),
                reason: "shell must not be empty".to_owned(),
            }
            .into());
        }

        if self.stream.max_line_length == 0 {
            return Err(ConfigError::InvalidValue {
                field: "stream.max_line_length".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// Diagnostics settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log format (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// Environment variable naming conventions.
///
/// The five `*_prefix` fields classify rule variables by name prefix; the
/// two flag fields are matched by exact name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameConfig {
    /// Exact-match rules
    pub match_prefix: String,
    /// Starts-with rules
    pub starts_with_prefix: String,
    /// Ends-with rules
    pub ends_with_prefix: String,
    /// Contains rules
    pub contains_prefix: String,
    /// Regular-expression rules
    pub regexp_prefix: String,
    /// Empty-line toggle
    pub empty_flag: String,
    /// Invalid UTF-8 toggle
    pub utf8_flag: String,
    /// Prepended to a rule variable name to look up its hook command
    pub command_prefix: String,
}

impl NameConfig {
    /// `(field name, value)` pairs, used for validation and reporting.
    pub fn fields(&self) -> [(&'static str, &str); 8] {
        [
            ("match_prefix", &self.match_prefix),
            ("starts_with_prefix", &self.starts_with_prefix),
            ("ends_with_prefix", &self.ends_with_prefix),
            ("contains_prefix", &self.contains_prefix),
            ("regexp_prefix", &self.regexp_prefix),
            ("empty_flag", &self.empty_flag),
            ("utf8_flag", &self.utf8_flag),
            ("command_prefix", &self.command_prefix),
        ]
    }
}

impl Default for NameConfig {
    fn default() -> Self {
        Self {
            match_prefix: DEFAULT_MATCH_PREFIX.to_owned(),
            starts_with_prefix: DEFAULT_STARTS_WITH_PREFIX.to_owned(),
            ends_with_prefix: DEFAULT_ENDS_WITH_PREFIX.to_owned(),
            contains_prefix: DEFAULT_CONTAINS_PREFIX.to_owned(),
            regexp_prefix: DEFAULT_REGEXP_PREFIX.to_owned(),
            empty_flag: DEFAULT_EMPTY_FLAG.to_owned(),
            utf8_flag: DEFAULT_UTF8_FLAG.to_owned(),
            command_prefix: DEFAULT_COMMAND_PREFIX.to_owned(),
        }
    }
}

/// Hook execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HookConfig {
    /// Shell used as `<shell> -c <command>`
    pub shell: String,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            shell: DEFAULT_SHELL.to_owned(),
        }
    }
}

/// Input stream settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Longest accepted line in bytes, newline excluded
    pub max_line_length: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

// --- env override helpers ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let config = LogFilterConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.names.match_prefix, "VALHEIM_LOG_FILTER_MATCH");
        assert_eq!(config.names.utf8_flag, "VALHEIM_LOG_FILTER_UTF8");
        assert_eq!(config.names.command_prefix, "ON_");
        assert_eq!(config.hook.shell, "/bin/sh");
        assert_eq!(config.stream.max_line_length, 65536);
    }

    #[test]
    fn default_config_passes_validation() {
        LogFilterConfig::default().validate().unwrap();
    }

    #[test]
    fn parse_empty_toml_uses_defaults() {
        let config = LogFilterConfig::parse("").unwrap();
        assert_eq!(config.names, NameConfig::default());
    }

    #[test]
    fn parse_partial_toml_merges_with_defaults() {
        let toml = r#"
[general]
log_level = "debug"

[names]
match_prefix = "MY_MATCH"
"#;
        let config = LogFilterConfig::parse(toml).unwrap();
        assert_eq!(config.general.log_level, "debug");
        // untouched fields keep defaults
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.names.match_prefix, "MY_MATCH");
        assert_eq!(config.names.regexp_prefix, DEFAULT_REGEXP_PREFIX);
    }

    #[test]
    fn parse_invalid_toml_returns_error() {
        let err = LogFilterConfig::parse("invalid = [[[toml").unwrap_err();
        assert!(matches!(
            err,
            LogFilterError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = LogFilterConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let mut config = LogFilterConfig::default();
        config.general.log_format = "xml".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_format"));
    }

    #[test]
    fn validate_rejects_each_empty_name() {
        let blank: [fn(&mut NameConfig); 8] = [
            |n| n.match_prefix.clear(),
            |n| n.starts_with_prefix.clear(),
            |n| n.ends_with_prefix.clear(),
            |n| n.contains_prefix.clear(),
            |n| n.regexp_prefix.clear(),
            |n| n.empty_flag.clear(),
            |n| n.utf8_flag.clear(),
            |n| n.command_prefix.clear(),
        ];
        for clear in blank {
            let mut config = LogFilterConfig::default();
            clear(&mut config.names);
            let err = config.validate().unwrap_err();
            assert!(err.is_config());
            assert!(err.to_string().contains("names."));
        }
    }

    #[test]
    fn validate_rejects_empty_shell() {
        let mut config = LogFilterConfig::default();
        config.hook.shell = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("hook.shell"));
    }

    #[test]
    fn validate_rejects_zero_max_line_length() {
        let mut config = LogFilterConfig::default();
        config.stream.max_line_length = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_line_length"));
    }

    #[test]
    #[serial_test::serial]
    fn env_override_string() {
        let mut val = "original".to_owned();
        // SAFETY: serialized test, no other thread touches the environment.
        unsafe { std::env::set_var("TEST_LOGFILTER_STR", "overridden") };
        override_string(&mut val, "TEST_LOGFILTER_STR");
        assert_eq!(val, "overridden");
        unsafe { std::env::remove_var("TEST_LOGFILTER_STR") };
    }

    #[test]
    #[serial_test::serial]
    fn env_override_usize_invalid_keeps_original() {
        let mut val = 10usize;
        // SAFETY: serialized test, no other thread touches the environment.
        unsafe { std::env::set_var("TEST_LOGFILTER_USIZE_BAD", "lots") };
        override_usize(&mut val, "TEST_LOGFILTER_USIZE_BAD");
        assert_eq!(val, 10);
        unsafe { std::env::remove_var("TEST_LOGFILTER_USIZE_BAD") };
    }

    #[test]
    fn env_override_missing_var_keeps_original() {
        let mut val = "original".to_owned();
        override_string(&mut val, "TEST_LOGFILTER_NONEXISTENT_12345");
        assert_eq!(val, "original");
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = LogFilterConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = LogFilterConfig::parse(&toml_str).unwrap();
        assert_eq!(config.names, parsed.names);
        assert_eq!(config.hook.shell, parsed.hook.shell);
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let err = LogFilterConfig::from_file("/nonexistent/path/logfilter.toml")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LogFilterError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
