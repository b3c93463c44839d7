//! Stream driver -- the read/sanitize/evaluate/write loop.
//!
//! [`LineFilter`] reads newline-delimited lines from any [`AsyncBufRead`],
//! runs each through [`sanitize`] and [`evaluate`], writes kept lines to an
//! [`AsyncWrite`] and launches hooks for matched lines.
//!
//! # Flow
//! ```text
//! reader -> read_line -> sanitize -> evaluate -> Keep         -> writer
//!                                             -> DropSilently
//!                                             -> DropAndRun   -> HookLauncher
//! ```
//!
//! The loop ends on end of stream, on a read error (logged, not returned),
//! or when the cancellation token fires. Write errors are returned.

use std::sync::Arc;

use logfilter_core::config::{DEFAULT_MAX_LINE_LENGTH, LogFilterConfig};
use logfilter_core::metrics as m;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use crate::error::FilterError;
use crate::hook::HookLauncher;
use crate::rule::{Action, RuleSet, evaluate};
use crate::sanitize::sanitize;

/// Driver lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Built, not yet run
    Ready,
    /// Inside [`LineFilter::run`]
    Reading,
    /// Input consumed or cancelled; cannot run again
    Closed,
}

/// What happened to a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// Written to the output
    Forwarded,
    /// Removed by the empty-line option
    DroppedEmpty,
    /// Removed by a rule without a command
    DroppedByRule,
    /// Removed by a rule with a command; the hook was launched
    HookLaunched,
}

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub lines_read: u64,
    pub lines_forwarded: u64,
    pub dropped_empty: u64,
    pub dropped_by_rule: u64,
    pub lines_repaired: u64,
    pub hooks_launched: u64,
    pub read_errors: u64,
}

impl FilterStats {
    /// Lines that were not forwarded.
    pub fn dropped(&self) -> u64 {
        self.dropped_empty + self.dropped_by_rule + self.hooks_launched
    }
}

/// Line filter over an async byte stream.
///
/// # Example
/// ```ignore
/// let mut filter = LineFilterBuilder::new()
///     .rule_set(rules)
///     .config(&config)
///     .build()?;
///
/// let stats = filter
///     .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
///     .await?;
/// ```
pub struct LineFilter {
    rules: Arc<RuleSet>,
    launcher: HookLauncher,
    max_line_length: usize,
    cancel: CancellationToken,
    state: DriverState,
    stats: FilterStats,
}

impl LineFilter {
    /// Current lifecycle state.
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Counters collected so far.
    pub fn stats(&self) -> FilterStats {
        self.stats
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Token that stops [`run`](Self::run) at the next line boundary.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Processes `reader` until end of stream, a read error or cancellation.
    ///
    /// # Errors
    /// - [`FilterError::Closed`] if the driver already ran
    /// - [`FilterError::Io`] if writing to `writer` fails
    pub async fn run<R, W>(&mut self, mut reader: R, mut writer: W) -> Result<FilterStats, FilterError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        if self.state == DriverState::Closed {
            return Err(FilterError::Closed);
        }
        self.state = DriverState::Reading;

        info!(
            rules = self.rules.len(),
            max_line_length = self.max_line_length,
            "line filter started"
        );

        let cancel = self.cancel.clone();
        let mut buf = Vec::new();
        let result = loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    debug!("line filter received shutdown signal");
                    break Ok(());
                }
                read = read_line(&mut reader, &mut buf, self.max_line_length) => {
                    match read {
                        Ok(true) => {
                            let line = std::mem::take(&mut buf);
                            if let Err(e) = self.process_line(line, &mut writer).await {
                                break Err(e);
                            }
                        }
                        Ok(false) => {
                            debug!("end of input");
                            break Ok(());
                        }
                        Err(e) => {
                            self.stats.read_errors += 1;
                            error!(error = %e, "input read failed, stopping");
                            break Ok(());
                        }
                    }
                }
            }
        };

        self.state = DriverState::Closed;
        result?;
        writer.flush().await?;

        let stats = self.stats;
        info!(
            lines_read = stats.lines_read,
            forwarded = stats.lines_forwarded,
            dropped = stats.dropped(),
            hooks = stats.hooks_launched,
            "line filter stopped"
        );
        Ok(stats)
    }

    /// Runs one line through sanitize and evaluate, writing it if kept.
    ///
    /// `line` must not contain the trailing newline.
    pub async fn process_line<W>(&mut self, line: Vec<u8>, writer: &mut W) -> Result<LineOutcome, FilterError>
    where
        W: AsyncWrite + Unpin,
    {
        self.stats.lines_read += 1;
        metrics::counter!(m::LINES_READ_TOTAL).increment(1);
        trace!(line = %String::from_utf8_lossy(&line), "processing line");

        let original_len = line.len();
        let Some(line) = sanitize(
            line,
            self.rules.filter_empty(),
            self.rules.filter_invalid_encoding(),
        ) else {
            self.stats.dropped_empty += 1;
            return Ok(LineOutcome::DroppedEmpty);
        };
        if line.len() != original_len {
            self.stats.lines_repaired += 1;
        }

        match evaluate(&line, &self.rules) {
            Action::Keep => {
                writer.write_all(&line).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
                self.stats.lines_forwarded += 1;
                metrics::counter!(m::LINES_FORWARDED_TOTAL).increment(1);
                Ok(LineOutcome::Forwarded)
            }
            Action::DropSilently => {
                self.stats.dropped_by_rule += 1;
                metrics::counter!(m::LINES_DROPPED_TOTAL, m::LABEL_REASON => "rule").increment(1);
                Ok(LineOutcome::DroppedByRule)
            }
            Action::DropAndRun(command) => {
                // Detached; the driver never waits on hooks.
                let _ = self.launcher.launch(command, &line);
                self.stats.hooks_launched += 1;
                metrics::counter!(m::LINES_DROPPED_TOTAL, m::LABEL_REASON => "hook").increment(1);
                Ok(LineOutcome::HookLaunched)
            }
        }
    }
}

/// Reads one line into `buf` without its `\n` or a preceding `\r`.
///
/// Returns `Ok(false)` at end of stream. A final line without a newline is
/// still returned. Lines whose content exceeds `max` bytes fail with
/// [`FilterError::LineTooLong`]; the `\r\n` terminator does not count.
async fn read_line<R>(reader: &mut R, buf: &mut Vec<u8>, max: usize) -> Result<bool, FilterError>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    // Room for the content plus `\r\n`.
    let limit = (max as u64).saturating_add(2);
    let n = (&mut *reader).take(limit).read_until(b'\n', buf).await?;
    if n == 0 {
        return Ok(false);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
    } else if n as u64 == limit {
        return Err(FilterError::LineTooLong { max });
    }

    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    if buf.len() > max {
        return Err(FilterError::LineTooLong { max });
    }
    Ok(true)
}

/// Builder for [`LineFilter`].
pub struct LineFilterBuilder {
    rules: Arc<RuleSet>,
    launcher: HookLauncher,
    max_line_length: usize,
    cancel: Option<CancellationToken>,
}

impl LineFilterBuilder {
    pub fn new() -> Self {
        Self {
            rules: Arc::new(RuleSet::new()),
            launcher: HookLauncher::default(),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            cancel: None,
        }
    }

    /// Sets the rules to evaluate.
    pub fn rule_set(self, rules: RuleSet) -> Self {
        self.shared_rule_set(Arc::new(rules))
    }

    /// Sets rules that are also held elsewhere.
    pub fn shared_rule_set(mut self, rules: Arc<RuleSet>) -> Self {
        self.rules = rules;
        self
    }

    pub fn launcher(mut self, launcher: HookLauncher) -> Self {
        self.launcher = launcher;
        self
    }

    /// Sets the longest accepted line, newline excluded.
    pub fn max_line_length(mut self, max: usize) -> Self {
        self.max_line_length = max;
        self
    }

    /// Uses an external cancellation token (e.g. one tied to signals).
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Takes the hook shell and line limit from `config`.
    pub fn config(self, config: &LogFilterConfig) -> Self {
        self.launcher(HookLauncher::from_config(&config.hook))
            .max_line_length(config.stream.max_line_length)
    }

    /// Builds the driver.
    ///
    /// # Errors
    /// [`FilterError::Config`] when the line limit or the shell is unusable.
    pub fn build(self) -> Result<LineFilter, FilterError> {
        if self.max_line_length == 0 {
            return Err(FilterError::Config {
                field: "max_line_length".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        if self.launcher.shell().is_empty() {
            return Err(FilterError::Config {
                field: "shell".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        Ok(LineFilter {
            rules: self.rules,
            launcher: self.launcher,
            max_line_length: self.max_line_length,
            cancel: self.cancel.unwrap_or_default(),
            state: DriverState::Ready,
            stats: FilterStats::default(),
        })
    }
}

impl Default for LineFilterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
