//! CLI argument definitions for valheim-logfilter.
//!
//! Uses `clap` v4 derive macros. Every flag is optional so that values
//! from the config file and `LOGFILTER_*` environment variables apply
//! unless a flag is given.

use std::path::PathBuf;

use clap::Parser;

use logfilter_core::config::LogFilterConfig;

/// Valheim dedicated-server log filter.
///
/// Reads server log lines on stdin and writes the ones no rule removes to
/// stdout. Rules come from environment variables such as
/// `VALHEIM_LOG_FILTER_CONTAINS_<name>=<text>`; a companion
/// `ON_<variable>=<command>` runs a shell command with the matched line on
/// its stdin instead of silently dropping it.
#[derive(Parser, Debug, Default)]
#[command(name = "valheim-logfilter")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Prefix of exact-match rule variables.
    #[arg(long, value_name = "PREFIX")]
    pub env_match: Option<String>,

    /// Prefix of starts-with rule variables.
    #[arg(long, value_name = "PREFIX")]
    pub env_startswith: Option<String>,

    /// Prefix of ends-with rule variables.
    #[arg(long, value_name = "PREFIX")]
    pub env_endswith: Option<String>,

    /// Prefix of contains rule variables.
    #[arg(long, value_name = "PREFIX")]
    pub env_contains: Option<String>,

    /// Prefix of regular-expression rule variables.
    #[arg(long, value_name = "PREFIX")]
    pub env_regexp: Option<String>,

    /// Name of the empty-line filter toggle.
    #[arg(long, value_name = "NAME")]
    pub env_empty: Option<String>,

    /// Name of the invalid UTF-8 filter toggle.
    #[arg(long, value_name = "NAME")]
    pub env_utf8: Option<String>,

    /// Path to an optional logfilter.toml configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// `RUST_LOG` still takes precedence when set.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    #[arg(long)]
    pub log_format: Option<String>,

    /// Shell used to run hook commands.
    #[arg(long)]
    pub shell: Option<String>,

    /// Longest accepted input line in bytes.
    #[arg(long, value_name = "BYTES")]
    pub max_line_length: Option<usize>,

    /// Build the rule set, print a summary and exit without reading stdin.
    #[arg(long)]
    pub validate: bool,
}

impl Cli {
    /// Applies the flags that were given on top of `config`.
    pub fn apply_overrides(&self, config: &mut LogFilterConfig) {
        let names = &mut config.names;
        for (flag, target) in [
            (&self.env_match, &mut names.match_prefix),
            (&self.env_startswith, &mut names.starts_with_prefix),
            (&self.env_endswith, &mut names.ends_with_prefix),
            (&self.env_contains, &mut names.contains_prefix),
            (&self.env_regexp, &mut names.regexp_prefix),
            (&self.env_empty, &mut names.empty_flag),
            (&self.env_utf8, &mut names.utf8_flag),
        ] {
            if let Some(value) = flag {
                target.clone_from(value);
            }
        }

        if let Some(level) = &self.log_level {
            config.general.log_level.clone_from(level);
        }
        if let Some(format) = &self.log_format {
            config.general.log_format.clone_from(format);
        }
        if let Some(shell) = &self.shell {
            config.hook.shell.clone_from(shell);
        }
        if let Some(max) = self.max_line_length {
            config.stream.max_line_length = max;
        }
    }
}
