//! Seam for the optional location-name database.
//!
//! Real databases (JSON files, services) live outside this crate; hosts
//! implement [`LocationLookup`] and hand it to their formatter.

/// Requested name locale. `Any` returns whatever representation the
/// implementation considers canonical.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Locale {
    Any,
    Ja,
    En,
    Fr,
    Kr,
}

/// Maps a 3-digit location code to a display name.
pub trait LocationLookup {
    /// Returns the name for `code`, or `None` when the code is malformed
    /// or unknown.
    fn lookup(&self, code: &str, locale: Locale) -> Option<String>;
}

/// Database-less fallback: validates the code and echoes it back.
#[derive(Copy, Clone, Debug, Default)]
pub struct CodeOnly;

impl LocationLookup for CodeOnly {
    fn lookup(&self, code: &str, _locale: Locale) -> Option<String> {
        if code.len() == 3 && code.bytes().all(|b| b.is_ascii_digit()) {
            Some(code.to_owned())
        } else {
            None
        }
    }
}
