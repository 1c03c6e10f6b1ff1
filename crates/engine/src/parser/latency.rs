//! Storage latency trace lines: `<id> <hit_penalty> <miss_penalty>`.
//!
//! Identifiers are decimal. Ids wider than 64 bits are folded by XORing
//! the high and low halves, which keeps distinct ids well separated
//! without caring about their original width.

use crate::event::AccessEvent;

use super::parse_penalty;

/// Parses a decimal id, folding oversized values to 64 bits.
pub fn key_for(id: &str) -> Result<u64, String> {
    if let Ok(key) = id.parse::<u64>() {
        return Ok(key);
    }
    let wide = id
        .parse::<u128>()
        .map_err(|_| format!("bad id {id:?}"))?;
    Ok(((wide >> 64) as u64) ^ (wide as u64))
}

pub(crate) fn parse_line(line: &str) -> Result<AccessEvent, String> {
    let mut fields = line.split_whitespace();
    let id = fields.next().ok_or("missing id")?;
    let hit = parse_penalty(fields.next(), "hit penalty")?;
    let miss = parse_penalty(fields.next(), "miss penalty")?;
    Ok(AccessEvent::new(key_for(id)?, hit, miss))
}
