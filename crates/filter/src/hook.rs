//! Hook launcher: fire-and-forget shell commands for matched lines.
//!
//! Each hook runs as `<shell> -c <command>` in its own tokio task. The
//! matched line plus a newline is written to the child's stdin, stdin is
//! closed, and the task reaps the child. The child's stdout and stderr are
//! inherited from this process.
//!
//! Hooks are never cancelled or awaited by the stream driver. When the
//! process exits, hooks still in flight are abandoned.

use std::process::{ExitStatus, Stdio};

use logfilter_core::config::{DEFAULT_SHELL, HookConfig};
use logfilter_core::metrics as m;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::FilterError;

/// Starts hook commands.
#[derive(Debug, Clone)]
pub struct HookLauncher {
    shell: String,
}

impl HookLauncher {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    pub fn from_config(config: &HookConfig) -> Self {
        Self::new(config.shell.clone())
    }

    /// Shell binary this launcher runs commands with.
    pub fn shell(&self) -> &str {
        &self.shell
    }

    /// Launches `command` with `line` on its stdin and returns immediately.
    ///
    /// Failures are logged and counted inside the task. The returned handle
    /// may be dropped; it exists so callers that do care can await the
    /// exit status.
    pub fn launch(&self, command: &str, line: &[u8]) -> JoinHandle<Result<ExitStatus, FilterError>> {
        let shell = self.shell.clone();
        let command = command.to_owned();
        let mut input = Vec::with_capacity(line.len() + 1);
        input.extend_from_slice(line);
        input.push(b'\n');

        metrics::counter!(m::HOOKS_LAUNCHED_TOTAL).increment(1);
        info!(
            command = %command,
            line = %String::from_utf8_lossy(line),
            "running hook"
        );

        tokio::spawn(async move {
            let result = run_hook(&shell, &command, &input).await;
            if let Err(e) = &result {
                metrics::counter!(m::HOOK_FAILURES_TOTAL).increment(1);
                error!(command = %command, error = %e, "hook failed");
            }
            result
        })
    }
}

impl Default for HookLauncher {
    fn default() -> Self {
        Self::new(DEFAULT_SHELL)
    }
}

async fn run_hook(shell: &str, command: &str, input: &[u8]) -> Result<ExitStatus, FilterError> {
    let mut child = Command::new(shell)
        .arg("-c")
        .arg(command)
        .stdin(Stdio::piped())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| FilterError::HookSpawn {
            command: command.to_owned(),
            reason: e.to_string(),
        })?;

    // The child may exit without reading; reap it even if the write fails.
    let written = match child.stdin.take() {
        Some(mut stdin) => {
            let res = stdin.write_all(input).await;
            drop(stdin);
            res.map_err(|e| FilterError::HookInput {
                command: command.to_owned(),
                reason: e.to_string(),
            })
        }
        None => Err(FilterError::HookInput {
            command: command.to_owned(),
            reason: "stdin not captured".to_owned(),
        }),
    };

    let status = child.wait().await?;
    debug!(command, %status, "hook exited");

    written.map(|()| status)
}
