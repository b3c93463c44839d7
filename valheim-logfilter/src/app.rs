//! Startup wiring: config -> tracing -> rule set -> stream driver.

use anyhow::Result;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::info;

use logfilter_core::config::LogFilterConfig;
use logfilter_core::error::LogFilterError;
use logfilter_filter::{LineFilterBuilder, MatchKind, RuleLoader, RuleSet};

use crate::cli::Cli;
use crate::logging;

/// Builds the effective configuration.
///
/// Layers, lowest first: defaults, the `--config` file, `LOGFILTER_*`
/// environment variables, CLI flags.
pub async fn load_config(cli: &Cli) -> Result<LogFilterConfig, LogFilterError> {
    let mut config = match &cli.config {
        Some(path) => LogFilterConfig::from_file(path).await?,
        None => LogFilterConfig::default(),
    };
    config.apply_env_overrides();
    cli.apply_overrides(&mut config);
    config.validate()?;
    Ok(config)
}

/// Reads the rule set from the process environment.
pub fn load_rules(config: &LogFilterConfig) -> Result<RuleSet, LogFilterError> {
    Ok(RuleLoader::new(&config.names).load_env()?)
}

/// One-line summary printed by `--validate`.
pub fn summary(rules: &RuleSet) -> String {
    let counts: Vec<String> = MatchKind::ORDER
        .iter()
        .map(|kind| format!("{kind}={}", rules.rules(*kind).len()))
        .collect();
    format!(
        "configuration OK: {} rules ({}), filter_empty={}, filter_utf8={}",
        rules.len(),
        counts.join(" "),
        rules.filter_empty(),
        rules.filter_invalid_encoding()
    )
}

/// Runs the filter until stdin ends or a shutdown signal arrives.
pub async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli).await?;
    logging::init_tracing(&config.general)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        shell = %config.hook.shell,
        "valheim-logfilter starting"
    );

    let rules = load_rules(&config)?;

    if cli.validate {
        println!("{}", summary(&rules));
        return Ok(());
    }

    let cancel = CancellationToken::new();
    spawn_shutdown_listener(cancel.clone())?;

    let mut filter = LineFilterBuilder::new()
        .rule_set(rules)
        .config(&config)
        .cancel_token(cancel.clone())
        .build()
        .map_err(LogFilterError::from)?;

    let result = filter
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
        .map_err(LogFilterError::from);

    // Stops the signal listener.
    cancel.cancel();
    result?;

    info!("valheim-logfilter shut down");
    Ok(())
}

/// Cancels `cancel` on SIGTERM or SIGINT.
///
/// # Errors
///
/// Returns an error if signal handlers cannot be installed.
#[cfg(unix)]
fn spawn_shutdown_listener(cancel: CancellationToken) -> Result<(), LogFilterError> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::spawn(async move {
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
            _ = cancel.cancelled() => return,
        };
        info!(signal = name, "shutdown signal received");
        cancel.cancel();
    });

    Ok(())
}

#[cfg(not(unix))]
fn spawn_shutdown_listener(cancel: CancellationToken) -> Result<(), LogFilterError> {
    tokio::spawn(async move {
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                if res.is_ok() {
                    info!(signal = "ctrl-c", "shutdown signal received");
                    cancel.cancel();
                }
            }
            _ = cancel.cancelled() => {}
        }
    });
    Ok(())
}
