//! Line sanitizer: empty-line removal and invalid UTF-8 repair.
//!
//! Runs before rule evaluation. A line dropped here never reaches the rule
//! set, so no hook can fire for it.

use logfilter_core::metrics as m;
use tracing::trace;

/// Applies the two stream-safety options to `line`.
///
/// Returns `None` when the line must be dropped. The empty check runs on the
/// line as read, so a line that only becomes empty after repair is still
/// forwarded as a blank line.
pub fn sanitize(line: Vec<u8>, filter_empty: bool, filter_invalid_encoding: bool) -> Option<Vec<u8>> {
    if filter_empty && line.is_empty() {
        trace!("skipping empty line");
        metrics::counter!(m::LINES_DROPPED_TOTAL, m::LABEL_REASON => "empty").increment(1);
        return None;
    }

    if filter_invalid_encoding && std::str::from_utf8(&line).is_err() {
        trace!("removing invalid UTF-8 sequences");
        metrics::counter!(m::LINES_REPAIRED_TOTAL).increment(1);
        return Some(strip_invalid_utf8(&line));
    }

    Some(line)
}

/// Removes every undecodable byte run, keeping valid characters in order.
///
/// Nothing is substituted for the removed bytes.
pub fn strip_invalid_utf8(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.extend_from_slice(chunk.valid().as_bytes());
    }
    out
}
