//! Trace file parsing.
//!
//! Turns an on-disk trace into a lazy, ordered stream of
//! [`AccessEvent`]s. Three text formats are supported, one per submodule;
//! every format is whitespace-split and carries a hit and a miss penalty
//! per line. Lines are parsed on demand so traces never need to fit in
//! memory, and a malformed line surfaces as an error tagged with its line
//! number.

/// `<op> <hex_addr> <instr_gap> <hit> <miss>` address traces.
pub mod address;

/// `<name> <hit> <miss>` DNS resolver traces.
pub mod dns;

/// `<id> <hit> <miss>` storage latency traces.
pub mod latency;

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::SimError;
use crate::event::AccessEvent;

/// The supported trace file formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceFormat {
    /// DNS resolver logs; the key is a 64-bit hash of the queried name.
    Dns,
    /// Storage traces keyed by a decimal identifier.
    Latency,
    /// Memory address traces with per-access penalties.
    AddressPenalties,
}

impl FromStr for TraceFormat {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dns" => Ok(TraceFormat::Dns),
            "latency" => Ok(TraceFormat::Latency),
            "address-penalties" => Ok(TraceFormat::AddressPenalties),
            other => Err(SimError::Config(format!(
                "unknown trace format {other:?} (expected dns, latency, or address-penalties)"
            ))),
        }
    }
}

/// A trace file plus the format to parse it with.
pub struct TraceReader {
    path: PathBuf,
    format: TraceFormat,
}

impl TraceReader {
    pub fn new(path: impl Into<PathBuf>, format: TraceFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    /// The trace file's location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens the file and returns the lazy event stream.
    pub fn events(&self) -> Result<TraceEvents, SimError> {
        let file = File::open(&self.path)?;
        Ok(TraceEvents {
            lines: BufReader::new(file).lines(),
            format: self.format,
            line_no: 0,
        })
    }
}

/// Iterator over the events of one trace file.
///
/// Blank lines are skipped; any other line that fails to parse ends the
/// stream with an error naming the offending line.
pub struct TraceEvents {
    lines: Lines<BufReader<File>>,
    format: TraceFormat,
    line_no: u64,
}

impl Iterator for TraceEvents {
    type Item = Result<AccessEvent, SimError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => return Some(Err(SimError::Io(err))),
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            let parsed = match self.format {
                TraceFormat::Dns => dns::parse_line(&line),
                TraceFormat::Latency => latency::parse_line(&line),
                TraceFormat::AddressPenalties => address::parse_line(&line),
            };
            return Some(parsed.map_err(|reason| SimError::Trace {
                line: self.line_no,
                reason,
            }));
        }
    }
}

/// Parses one penalty field, rejecting empty and non-numeric text.
pub(crate) fn parse_penalty(field: Option<&str>, what: &str) -> Result<f64, String> {
    let text = field.ok_or_else(|| format!("missing {what}"))?;
    text.parse::<f64>()
        .map_err(|_| format!("bad {what} {text:?}"))
}
