//! Exit code mapping.

use logfilter_core::error::LogFilterError;

/// Normal termination, including after a logged read error.
pub const EXIT_SUCCESS: u8 = 0;
/// Runtime failure (e.g. stdout closed).
pub const EXIT_FAILURE: u8 = 1;
/// Configuration or rule error, detected before any line is read.
pub const EXIT_CONFIG: u8 = 2;

/// Map an error to a process exit code.
///
/// | Code | Meaning                         |
/// |------|---------------------------------|
/// | 0    | Success                         |
/// | 1    | General / runtime error         |
/// | 2    | Configuration or rule error     |
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<LogFilterError>() {
        Some(e) if e.is_config() => EXIT_CONFIG,
        _ => EXIT_FAILURE,
    }
}
