use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use valheim_logfilter::app;
use valheim_logfilter::cli::Cli;
use valheim_logfilter::error::{EXIT_FAILURE, EXIT_SUCCESS, exit_code};

/// How long shutdown waits on blocking I/O threads (a pending stdin read).
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

fn main() -> ExitCode {
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to start tokio runtime: {e}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let result = runtime.block_on(app::run(cli));
    runtime.shutdown_timeout(SHUTDOWN_GRACE);

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            tracing::error!(error = %e, "valheim-logfilter failed");
            eprintln!("error: {e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}
