//! Address trace lines with penalties:
//! `<op> <hex_addr> <instr_gap> <hit_penalty> <miss_penalty>`.
//!
//! The key is the accessed address. The operation marker and instruction
//! gap are carried by the trace for other tools and ignored here.

use crate::event::AccessEvent;

use super::parse_penalty;

/// Parses a hex address field, with or without a `0x` prefix.
pub fn key_for(addr: &str) -> Result<u64, String> {
    let digits = addr
        .strip_prefix("0x")
        .or_else(|| addr.strip_prefix("0X"))
        .unwrap_or(addr);
    u64::from_str_radix(digits, 16).map_err(|_| format!("bad address {addr:?}"))
}

pub(crate) fn parse_line(line: &str) -> Result<AccessEvent, String> {
    let mut fields = line.split_whitespace();
    let _op = fields.next().ok_or("missing op")?;
    let addr = fields.next().ok_or("missing address")?;
    let _instr_gap = fields.next().ok_or("missing instruction gap")?;
    let hit = parse_penalty(fields.next(), "hit penalty")?;
    let miss = parse_penalty(fields.next(), "miss penalty")?;
    Ok(AccessEvent::new(key_for(addr)?, hit, miss))
}
