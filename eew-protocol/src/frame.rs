use std::fmt;

use crate::error::{ProtocolError, Result};

/// Wire header: 8 ASCII decimal digits (body length) + 2-byte type tag.
pub const HEADER_LEN: usize = 10;
pub const LENGTH_LEN: usize = 8;
/// Maximum body length representable in the 8-digit length field.
pub const MAX_BODY_LEN: usize = 99_999_999;
/// A checkpoint reply echoes at most this many bytes of the triggering body.
pub const COOKIE_LEN: usize = 30;

pub const LIVENESS_BODY: &[u8] = b"chk";
pub const LIVENESS_REPLY: &[u8] = b"CHK";
pub const CHECKPOINT_ACK: &[u8] = b"ACK";

/// Two-byte frame type tag.
///
/// Tags are opaque beyond the predicate set below; the case of the first
/// byte is significant (`AN` and `aN` are both alert tags, but only `aN`
/// requires a checkpoint acknowledgement).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FrameTag([u8; 2]);

impl FrameTag {
    pub const fn new(bytes: [u8; 2]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 2] {
        &self.0
    }

    /// Control frame (`EN` or `eN`): liveness probes arrive under these tags.
    pub fn is_control(self) -> bool {
        self.0 == *b"EN" || self.0 == *b"eN"
    }

    /// Alert frame (`AN` or `aN`): the only frames surfaced to the caller.
    pub fn is_alert(self) -> bool {
        self.0 == *b"AN" || self.0 == *b"aN"
    }

    /// Frames tagged `aN` or `eN` must be acknowledged with a checkpoint
    /// reply carrying the session cookie.
    pub fn needs_checkpoint(self) -> bool {
        self.0 == *b"aN" || self.0 == *b"eN"
    }
}

impl fmt::Display for FrameTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.escape_ascii())
    }
}

/// Parsed 10-byte frame header.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    pub length: usize,
    pub tag: FrameTag,
}

impl FrameHeader {
    /// Parse a header from exactly [`HEADER_LEN`] bytes.
    ///
    /// The first 8 bytes must all be ASCII digits; the remaining 2 bytes
    /// become the tag unchecked (unknown tags are valid headers).
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() != HEADER_LEN {
            return Err(ProtocolError::HeaderLengthMismatch {
                expected: HEADER_LEN,
                actual: data.len(),
            });
        }
        let digits = &data[..LENGTH_LEN];
        if !digits.iter().all(u8::is_ascii_digit) {
            return Err(ProtocolError::NonNumericLength(
                digits.escape_ascii().to_string(),
            ));
        }
        // 8 decimal digits cannot overflow usize.
        let length = digits
            .iter()
            .fold(0usize, |acc, &b| acc * 10 + usize::from(b - b'0'));
        Ok(Self {
            length,
            tag: FrameTag::new([data[LENGTH_LEN], data[LENGTH_LEN + 1]]),
        })
    }

    pub fn to_bytes(self) -> [u8; HEADER_LEN] {
        encode_header(self.length, self.tag)
    }
}

/// Build a 10-byte header: zero-padded 8-digit length + 2-byte tag.
///
/// Fails if `length` does not fit the 8-digit field.
pub fn build_header(length: usize, tag: FrameTag) -> Result<[u8; HEADER_LEN]> {
    if length > MAX_BODY_LEN {
        return Err(ProtocolError::BodyTooLong(length));
    }
    Ok(encode_header(length, tag))
}

fn encode_header(length: usize, tag: FrameTag) -> [u8; HEADER_LEN] {
    debug_assert!(length <= MAX_BODY_LEN);
    let mut out = [0u8; HEADER_LEN];
    let digits = format!("{length:08}");
    out[..LENGTH_LEN].copy_from_slice(digits.as_bytes());
    out[LENGTH_LEN..].copy_from_slice(tag.as_bytes());
    out
}

/// One complete wire frame (header + body).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub header: FrameHeader,
    pub body: Vec<u8>,
}

impl Frame {
    /// Assemble a frame, enforcing that the body matches the declared length.
    pub fn new(header: FrameHeader, body: Vec<u8>) -> Result<Self> {
        if body.len() != header.length {
            return Err(ProtocolError::BodyLengthMismatch {
                declared: header.length,
                actual: body.len(),
            });
        }
        Ok(Self { header, body })
    }

    /// In-band liveness probe: control tag with the literal body `chk`.
    pub fn is_liveness_probe(&self) -> bool {
        self.header.tag.is_control() && self.body == LIVENESS_BODY
    }

    /// Wire bytes of the liveness reply: header(len=3, same tag) + `CHK`.
    pub fn liveness_reply(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + LIVENESS_REPLY.len());
        out.extend_from_slice(&encode_header(LIVENESS_REPLY.len(), self.header.tag));
        out.extend_from_slice(LIVENESS_REPLY);
        out
    }

    /// Wire bytes of the checkpoint reply: header + `ACK` + up to the first
    /// [`COOKIE_LEN`] bytes of this frame's body (the session cookie).
    pub fn checkpoint_reply(&self) -> Vec<u8> {
        let cookie = &self.body[..self.body.len().min(COOKIE_LEN)];
        let len = CHECKPOINT_ACK.len() + cookie.len();
        let mut out = Vec::with_capacity(HEADER_LEN + len);
        out.extend_from_slice(&encode_header(len, self.header.tag));
        out.extend_from_slice(CHECKPOINT_ACK);
        out.extend_from_slice(cookie);
        out
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}
