//! Packet-capture style dumps of wire traffic.
//!
//! Each line shows a five digit hex offset, sixteen hex byte groups split
//! into two halves of eight, and an ASCII column:
//!
//! ```text
//! 00000   17 00 80 16 03 13 01 ff  00 00 ff 56 44 50 0d 0a    ...........VDP..
//! 00010   41 47 4f 4e                                         AGON
//! ```

use std::fmt::Write as _;
use tracing::{debug, error, info, trace, warn};

/// Bytes rendered per dump line.
pub const LINE_WIDTH: usize = 16;

/// Diagnostic severity, ordered from least to most chatty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error = 1,
    Warning = 2,
    Info = 3,
    Verbose = 4,
    Noise = 5,
}

impl Severity {
    /// Payloads are dumped at verbose and noisier levels, and always on error.
    pub fn dumps_payload(self) -> bool {
        self >= Severity::Verbose || self == Severity::Error
    }

    /// Emit `message` through `tracing` at the matching level.
    pub fn log(self, message: &str) {
        match self {
            Severity::Error => error!(target: "vdp_bridge::dump", "{message}"),
            Severity::Warning => warn!(target: "vdp_bridge::dump", "{message}"),
            Severity::Info => info!(target: "vdp_bridge::dump", "{message}"),
            Severity::Verbose => debug!(target: "vdp_bridge::dump", "{message}"),
            Severity::Noise => trace!(target: "vdp_bridge::dump", "{message}"),
        }
    }
}

/// Render one dump line for `chunk` (at most [`LINE_WIDTH`] bytes).
pub fn format_line(chunk: &[u8], offset: usize) -> String {
    let len = chunk.len().min(LINE_WIDTH);
    let mut line = String::with_capacity(80);
    let _ = write!(line, "{offset:05x}   ");

    for (i, byte) in chunk[..len].iter().enumerate() {
        let _ = write!(line, "{byte:02x} ");
        if i == 7 {
            line.push(' ');
        }
    }
    // Keep the ASCII column aligned when the mid-line gap was never emitted.
    if len < 8 {
        line.push(' ');
    }
    for _ in len..LINE_WIDTH {
        line.push_str("   ");
    }
    line.push_str("   ");

    line.extend(chunk[..len].iter().map(|&b| printable(b)));
    line
}

/// Render a whole payload, one string per line. Empty input yields no lines.
pub fn format_payload(payload: &[u8]) -> Vec<String> {
    payload
        .chunks(LINE_WIDTH)
        .enumerate()
        .map(|(i, chunk)| format_line(chunk, i * LINE_WIDTH))
        .collect()
}

/// Log `payload` as a hex dump if `severity` warrants it.
///
/// `source` names the caller so dumps can be matched to the code path that
/// produced them.
pub fn dump_payload(source: &str, payload: &[u8], severity: Severity) {
    if !severity.dumps_payload() {
        return;
    }

    severity.log(&format!("dump from {source}: {} byte(s)", payload.len()));
    if payload.is_empty() {
        severity.log("no data");
        return;
    }
    for line in format_payload(payload) {
        severity.log(&line);
    }
}

fn printable(b: u8) -> char {
    if (0x20..=0x7e).contains(&b) {
        b as char
    } else {
        '.'
    }
}
