//! DNS resolver trace lines: `<name> <hit_penalty> <miss_penalty>`.
//!
//! Names are folded to 64-bit keys with a stable non-cryptographic hash,
//! so repeated lookups of the same name collapse onto one cache entry.

use std::hash::Hasher;

use rustc_hash::FxHasher;

use crate::event::AccessEvent;

use super::parse_penalty;

/// Hashes a queried name to its 64-bit cache key.
pub fn key_for(name: &str) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(name.as_bytes());
    hasher.finish()
}

pub(crate) fn parse_line(line: &str) -> Result<AccessEvent, String> {
    let mut fields = line.split_whitespace();
    let name = fields.next().ok_or("missing name")?;
    let hit = parse_penalty(fields.next(), "hit penalty")?;
    let miss = parse_penalty(fields.next(), "miss penalty")?;
    Ok(AccessEvent::new(key_for(name), hit, miss))
}
