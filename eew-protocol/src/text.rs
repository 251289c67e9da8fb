//! Legacy text decoding, isolated so the rest of the pipeline stays
//! encoding-agnostic.

use unicode_normalization::UnicodeNormalization;

/// Decode a line of legacy Shift-JIS text.
///
/// Invalid sequences are replaced rather than rejected: diagnostic text in
/// a damaged bulletin is still worth surfacing.
pub fn decode_legacy(bytes: &[u8]) -> String {
    let (decoded, _, _) = encoding_rs::SHIFT_JIS.decode(bytes);
    decoded.into_owned()
}

/// Normalize to composed form (NFKC). Half-width katakana in the feed
/// becomes regular full-width text.
pub fn nfkc(s: &str) -> String {
    s.nfkc().collect()
}
