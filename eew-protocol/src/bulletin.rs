use chrono::NaiveDateTime;

use crate::error::{ProtocolError, Result};
use crate::text;

/// Magic type-marker lines (fixed Shift-JIS byte literals).
pub const CODED_MARKER: &[u8] = b"\xc5\xb3\xb7\xd4\xbd\xc43 \xb7\xbc\xd6\xb3";
pub const TEXT_MARKER: &[u8] = b"\xc5\xb3\xb7\xd4\xbd\xc44 \xb7\xbc\xd6\xb3";
pub const TEST_MARKER: &[u8] = b"\xc5\xb3\xb7\xd4\xbd\xc4\xc3\xbd\xc41 \xb7\xbc\xd6\xb3";
pub const TEST2_MARKER: &[u8] = b"\xc5\xb3\xb7\xd4\xbd\xc4\xc3\xbd\xc491 \xb7\xbc\xd6\xb3";

/// Timestamp format of the basic-info line and coded-string token 0.
pub const TIMESTAMP_FORMAT: &str = "%y%m%d%H%M%S";

/// Message type meaning "cancel previous alert".
const CANCEL_TYPE: &str = "39";
/// Message type meaning "test transmission".
const TEST_TYPE: &str = "38";
/// Message types carrying a real alert.
const ALERT_TYPES: [&str; 3] = ["35", "36", "37"];

/// Bulletin classification by type-marker line.
///
/// `Unknown` is a valid outcome, not an error: callers log the raw bytes
/// (see [`hex_dump`]) and move on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BulletinKind {
    /// Coded bulletin: space-delimited tagged fields for machine parsing.
    Coded,
    /// Pre-decoded human-readable text bulletin.
    Text,
    /// Test transmission (either marker variant).
    Test,
    /// Marker matched none of the known literals.
    Unknown,
}

impl BulletinKind {
    /// Classify a type-marker line by exact byte comparison, in one pass.
    pub fn classify(type_line: &[u8]) -> Self {
        match type_line {
            l if l == CODED_MARKER => Self::Coded,
            l if l == TEXT_MARKER => Self::Text,
            l if l == TEST_MARKER || l == TEST2_MARKER => Self::Test,
            _ => Self::Unknown,
        }
    }
}

/// The five whitespace-separated tokens of the basic-info line.
#[derive(Clone, Debug, PartialEq)]
pub struct BasicInfo {
    pub message_type: String,
    pub origin: String,
    /// `00` = live event, anything else = drill/test transmission.
    pub drill: String,
    pub timestamp: NaiveDateTime,
    pub character: String,
}

impl BasicInfo {
    fn parse(line: &[u8]) -> Result<Self> {
        let line = std::str::from_utf8(line)
            .map_err(|_| ProtocolError::InvalidBasicLine(line.escape_ascii().to_string()))?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 5 {
            return Err(ProtocolError::InvalidBasicLine(line.to_owned()));
        }
        let timestamp = NaiveDateTime::parse_from_str(tokens[3], TIMESTAMP_FORMAT)
            .map_err(|_| ProtocolError::InvalidTimestamp(tokens[3].to_owned()))?;
        Ok(Self {
            message_type: tokens[0].to_owned(),
            origin: tokens[1].to_owned(),
            drill: tokens[2].to_owned(),
            timestamp,
            character: tokens[4].to_owned(),
        })
    }
}

/// One decoded application-level bulletin, immutable after [`parse`].
///
/// Line layout of the payload: line 0 header echo, line 1 type marker,
/// line 3 basic-info line, lines 4.. body.
///
/// [`parse`]: Bulletin::parse
#[derive(Clone, Debug)]
pub struct Bulletin {
    raw: Vec<u8>,
    kind: BulletinKind,
    header_line: Vec<u8>,
    type_line: Vec<u8>,
    basic: BasicInfo,
    body: Vec<Vec<u8>>,
}

impl Bulletin {
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let lines = split_lines(raw);
        if lines.len() < 4 {
            return Err(ProtocolError::TruncatedBulletin {
                lines: lines.len(),
            });
        }
        let kind = BulletinKind::classify(lines[1]);
        let basic = BasicInfo::parse(lines[3])?;
        Ok(Self {
            raw: raw.to_vec(),
            kind,
            header_line: lines[0].to_vec(),
            type_line: lines[1].to_vec(),
            basic,
            body: lines[4..].iter().map(|l| l.to_vec()).collect(),
        })
    }

    pub fn kind(&self) -> BulletinKind {
        self.kind
    }

    pub fn basic(&self) -> &BasicInfo {
        &self.basic
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn header_line(&self) -> &[u8] {
        &self.header_line
    }

    pub fn type_line(&self) -> &[u8] {
        &self.type_line
    }

    pub fn body_lines(&self) -> &[Vec<u8>] {
        &self.body
    }

    /// True for a live event, false for a drill/test transmission.
    pub fn is_live(&self) -> bool {
        self.basic.drill == "00"
    }

    pub fn is_alert_type(&self) -> bool {
        ALERT_TYPES.contains(&self.basic.message_type.as_str())
    }

    pub fn is_test_type(&self) -> bool {
        self.basic.message_type == TEST_TYPE
    }

    pub fn is_cancel(&self) -> bool {
        self.basic.message_type == CANCEL_TYPE
    }

    /// For a coded bulletin: body lines except the trailing two terminator
    /// lines, joined with single spaces. Empty for other kinds.
    pub fn coded_message(&self) -> String {
        if self.kind != BulletinKind::Coded {
            return String::new();
        }
        let end = self.body.len().saturating_sub(2);
        self.body[..end]
            .iter()
            .map(|l| String::from_utf8_lossy(l))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// For a text/test bulletin: body lines except the first and trailing
    /// two, decoded from the legacy encoding and NFKC-normalized.
    pub fn text_message(&self) -> String {
        if !matches!(self.kind, BulletinKind::Text | BulletinKind::Test) {
            return String::new();
        }
        let end = self.body.len().saturating_sub(2);
        if end <= 1 {
            return String::new();
        }
        let mut buf = String::new();
        for line in &self.body[1..end] {
            buf.push_str(&text::decode_legacy(line));
            buf.push('\n');
        }
        text::nfkc(&buf)
    }

    /// [`text_message`](Self::text_message) with internal spacing stripped.
    pub fn printable_text(&self) -> String {
        self.text_message().replace(' ', "")
    }
}

/// Split at newline boundaries, tolerating `\r\n` and a trailing newline.
fn split_lines(raw: &[u8]) -> Vec<&[u8]> {
    let mut lines: Vec<&[u8]> = raw
        .split(|&b| b == b'\n')
        .map(|l| l.strip_suffix(b"\r").unwrap_or(l))
        .collect();
    if raw.ends_with(b"\n") {
        lines.pop();
    }
    lines
}

/// Hex + printable-gutter dump for diagnostics on unknown bulletins.
pub fn hex_dump(data: &[u8]) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    for chunk in data.chunks(16) {
        for b in chunk {
            let _ = write!(out, "{b:02x} ");
        }
        for _ in chunk.len()..16 {
            out.push_str("   ");
        }
        out.push('|');
        for &b in chunk {
            out.push(if (0x20..0x7f).contains(&b) {
                b as char
            } else {
                '.'
            });
        }
        out.push_str("|\n");
    }
    out
}
