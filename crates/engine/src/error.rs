//! Simulator error definitions.
//!
//! One error enum covers every fallible path in the engine: trace file I/O,
//! malformed trace lines, and invalid run configuration. Invariant
//! violations inside the policies are programming errors and panic with a
//! diagnostic instead of flowing through this type.

use std::fmt;
use std::io;

/// Errors surfaced while loading configuration or replaying a trace.
#[derive(Debug)]
pub enum SimError {
    /// Underlying file or stream failure while reading a trace.
    Io(io::Error),

    /// A trace line that does not match its declared format.
    ///
    /// Carries the 1-based line number and a short reason.
    Trace { line: u64, reason: String },

    /// A configuration that cannot produce a runnable simulation.
    Config(String),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Io(err) => write!(f, "trace i/o error: {err}"),
            SimError::Trace { line, reason } => {
                write!(f, "malformed trace line {line}: {reason}")
            }
            SimError::Config(reason) => write!(f, "invalid configuration: {reason}"),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for SimError {
    fn from(err: io::Error) -> Self {
        SimError::Io(err)
    }
}
