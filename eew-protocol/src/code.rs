use chrono::NaiveDateTime;
use serde::Serialize;

use crate::bulletin::TIMESTAMP_FORMAT;
use crate::ebi::{self, EbiRecord};

/// Message type whose bulletins never carry a max seismic intensity
/// (forecast-only transmissions).
pub const FORECAST_ONLY_TYPE: &str = "35";

/// A coded string splits into at most this many tokens; the last one keeps
/// its embedded spaces and holds the extended-info (EBI) tail verbatim.
const MAX_TOKENS: usize = 15;

const EBI_LITERAL: &str = "EBI";

/// Tagged token positions: `{token index, expected tag literal, field}`.
///
/// A tag or pattern mismatch leaves the field absent; it is never an error.
const TAGGED_FIELDS: &[(usize, &str, TagField)] = &[
    (1, "ND", TagField::Id),
    (2, "NCN", TagField::Condition),
    (11, "RK", TagField::Accuracy),
    (12, "RT", TagField::Area),
    (13, "RC", TagField::ChangeRatio),
];

#[derive(Copy, Clone, Debug)]
enum TagField {
    Id,
    Condition,
    Accuracy,
    Area,
    ChangeRatio,
}

/// Structured record parsed from one coded bulletin.
///
/// Fresh per bulletin, never mutated after construction. Every optional
/// field is absent rather than erroneous on a malformed token.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AlertRecord {
    pub message_type: String,
    /// Event identifier from the `ND` tag.
    pub id: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
    pub is_first: bool,
    pub is_last: bool,
    /// Report sequence within the event, from the `NCN` tag.
    pub alert_seq: Option<u32>,
    /// 3-digit epicenter area code.
    pub location_code: Option<String>,
    /// Latitude/longitude as one-decimal strings; all-or-nothing.
    pub geo: Option<(String, String)>,
    pub depth_km: Option<u32>,
    /// One-decimal string, e.g. `"6.9"`.
    pub magnitude: Option<String>,
    pub max_seismic: Option<String>,
    /// `RT` flag, valid only as 0 or 1.
    pub area: Option<u8>,
    /// `RK` accuracy code.
    pub accuracy: Option<String>,
    /// `RC` change-ratio code.
    pub change_ratio: Option<String>,
    pub ebi: Vec<EbiRecord>,
}

impl AlertRecord {
    /// Parse the coded string of a bulletin with the given message type.
    ///
    /// An ill-formed EBI tail leaves `ebi` empty; the rest of the record
    /// is unaffected.
    pub fn parse(message_type: &str, codestr: &str) -> Self {
        let tokens: Vec<&str> = codestr.splitn(MAX_TOKENS, ' ').collect();

        let mut id = None;
        let mut condition: Option<char> = None;
        let mut alert_seq = None;
        let mut accuracy = None;
        let mut area = None;
        let mut change_ratio = None;

        for &(index, tag, field) in TAGGED_FIELDS {
            let Some(value) = tagged_value(&tokens, index, tag) else {
                continue;
            };
            match field {
                TagField::Id => {
                    if value.bytes().all(|b| b.is_ascii_digit()) {
                        id = Some(value.to_owned());
                    }
                }
                TagField::Condition => {
                    let mut chars = value.chars();
                    if let Some(first) = chars.next().filter(char::is_ascii_digit) {
                        condition = Some(first);
                    }
                    alert_seq = value.get(1..).and_then(|rest| rest.parse().ok());
                }
                TagField::Accuracy => accuracy = Some(value.to_owned()),
                TagField::Area => {
                    area = match value.as_bytes().first() {
                        Some(b'0') => Some(0),
                        Some(b'1') => Some(1),
                        _ => None,
                    };
                }
                TagField::ChangeRatio => change_ratio = Some(value.to_owned()),
            }
        }

        let is_last = condition == Some('9');
        let is_first = !is_last && alert_seq == Some(1);

        let timestamp = tokens
            .first()
            .and_then(|t| NaiveDateTime::parse_from_str(t, TIMESTAMP_FORMAT).ok());

        let location_code = tokens
            .get(5)
            .filter(|t| t.len() == 3 && t.bytes().all(|b| b.is_ascii_digit()))
            .map(|t| (*t).to_owned());

        let geo = match (
            tokens.get(6).and_then(|t| coordinate(t)),
            tokens.get(7).and_then(|t| coordinate(t)),
        ) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        };

        let depth_km = tokens
            .get(8)
            .filter(|t| !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|t| t.parse().ok());

        let magnitude = tokens
            .get(9)
            .filter(|t| !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|t| t.parse::<u64>().ok())
            .map(|v| format!("{}.{}", v / 10, v % 10));

        let max_seismic = if message_type == FORECAST_ONLY_TYPE {
            None
        } else {
            tokens.get(10).and_then(|t| max_seismic_value(t))
        };

        let ebi = tokens
            .get(14)
            .and_then(|t| ebi_tail(t))
            .map(|tail| ebi::parse(tail).unwrap_or_default())
            .unwrap_or_default();

        Self {
            message_type: message_type.to_owned(),
            id,
            timestamp,
            is_first,
            is_last,
            alert_seq,
            location_code,
            geo,
            depth_km,
            magnitude,
            max_seismic,
            area,
            accuracy,
            change_ratio,
            ebi,
        }
    }
}

/// Split a `LETTERS+DIGITS/SLASHES` token and return its value when the
/// tag matches the expected literal.
fn tagged_value<'a>(tokens: &[&'a str], index: usize, tag: &str) -> Option<&'a str> {
    let token = tokens.get(index)?;
    let split = token.find(|c: char| !c.is_ascii_uppercase())?;
    let (prefix, value) = token.split_at(split);
    if prefix != tag
        || value.is_empty()
        || !value.bytes().all(|b| b.is_ascii_digit() || b == b'/')
    {
        return None;
    }
    Some(value)
}

/// `[NS|EW]<digits>` scaled by ten to a one-decimal string; south and
/// west are negated.
fn coordinate(token: &str) -> Option<String> {
    let (hemisphere, digits) = token.split_at_checked(1)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u64 = digits.parse().ok()?;
    let sign = match hemisphere {
        "N" | "E" => "",
        "S" | "W" => "-",
        _ => return None,
    };
    Some(format!("{sign}{}.{}", value / 10, value % 10))
}

fn max_seismic_value(token: &str) -> Option<String> {
    if token == "//" {
        return None;
    }
    let bytes = token.as_bytes();
    if bytes.len() >= 2 && bytes[0] == b'0' && matches!(bytes[1], b'1' | b'2' | b'3' | b'4' | b'7')
    {
        Some(token[1..2].to_owned())
    } else {
        Some(token.to_owned())
    }
}

/// Token 15 must begin with the `EBI` literal; returns the remainder.
fn ebi_tail(token: &str) -> Option<&str> {
    let rest = token.strip_prefix(EBI_LITERAL)?;
    let rest = rest.strip_prefix(' ')?;
    Some(rest.trim_start())
}
