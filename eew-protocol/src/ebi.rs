use chrono::NaiveTime;
use serde::Serialize;

use crate::error::{ProtocolError, Result};

/// Tokens per EBI group: location, seismic range, arrival, condition.
const GROUP_LEN: usize = 4;

/// One per-area intensity forecast from the extended-info tail.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EbiRecord {
    /// 3-digit area code, absent when malformed.
    pub location_code: Option<String>,
    /// Forecast intensity range, 0-2 entries (`//` sub-values contribute
    /// nothing; a leading-zero digit pair contributes its second digit).
    pub seismic: Vec<String>,
    /// The 6-digit arrival token exactly as transmitted.
    pub arrival_raw: Option<String>,
    /// Arrival token parsed as `HHMMSS`; pairing with a date is left to
    /// the caller.
    pub arrival: Option<NaiveTime>,
    /// Raw condition value; absent when transmitted as `//`.
    pub condition: Option<u32>,
    /// Derived from the condition's second character: `0` false, `1`
    /// true, anything else unset.
    pub reached: Option<bool>,
}

/// Parse the EBI tail (everything after the `EBI` literal).
///
/// The whole tail is rejected when the token count is not a multiple of
/// four; a malformed group inside a well-shaped tail is dropped
/// individually without aborting the remaining groups.
pub fn parse(tail: &str) -> Result<Vec<EbiRecord>> {
    let tokens: Vec<&str> = tail.split_whitespace().collect();
    if tokens.len() % GROUP_LEN != 0 {
        return Err(ProtocolError::EbiFormat {
            tokens: tokens.len(),
        });
    }
    Ok(tokens
        .chunks(GROUP_LEN)
        .filter_map(build_record)
        .collect())
}

fn build_record(group: &[&str]) -> Option<EbiRecord> {
    let location_code = match group[0] {
        c if c.len() == 3 && c.bytes().all(|b| b.is_ascii_digit()) => Some(c.to_owned()),
        _ => None,
    };

    let seismic = parse_seismic(group[1]);

    let (arrival_raw, arrival) = if group[2].len() == 6
        && group[2].bytes().all(|b| b.is_ascii_digit())
    {
        (
            Some(group[2].to_owned()),
            NaiveTime::parse_from_str(group[2], "%H%M%S").ok(),
        )
    } else {
        (None, None)
    };

    let (condition, reached) = match group[3] {
        "//" => (None, None),
        token => {
            // Non-numeric condition drops the whole group.
            let value = token.parse::<u32>().ok()?;
            let reached = match token.as_bytes().get(1) {
                Some(b'0') => Some(false),
                Some(b'1') => Some(true),
                _ => None,
            };
            (Some(value), reached)
        }
    };

    Some(EbiRecord {
        location_code,
        seismic,
        arrival_raw,
        arrival,
        condition,
        reached,
    })
}

/// `S<2><2>`: two sub-values of digits, `+`, `-`, or `/`.
fn parse_seismic(token: &str) -> Vec<String> {
    let bytes = token.as_bytes();
    let mut out = Vec::new();
    let valid = |b: u8| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'/');
    if bytes.len() < 5 || bytes[0] != b'S' || !bytes[1..5].iter().all(|&b| valid(b)) {
        return out;
    }
    for part in [&token[1..3], &token[3..5]] {
        let pb = part.as_bytes();
        if pb[0] == b'0' && pb[1].is_ascii_digit() {
            out.push(part[1..].to_owned());
        } else if part != "//" {
            out.push(part.to_owned());
        }
    }
    out
}
