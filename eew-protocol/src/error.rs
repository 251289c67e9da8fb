#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("header length mismatch: expected {expected}, actual {actual}")]
    HeaderLengthMismatch { expected: usize, actual: usize },

    #[error("non-numeric frame length: {0:?}")]
    NonNumericLength(String),

    #[error("body length exceeds 8 digits: {0}")]
    BodyTooLong(usize),

    #[error("body length mismatch: declared {declared}, actual {actual}")]
    BodyLengthMismatch { declared: usize, actual: usize },

    #[error("truncated bulletin: {lines} line(s), need at least 4")]
    TruncatedBulletin { lines: usize },

    #[error("invalid basic-info line: {0}")]
    InvalidBasicLine(String),

    #[error("invalid bulletin timestamp: {0:?}")]
    InvalidTimestamp(String),

    #[error("EBI tail has {tokens} token(s), not a multiple of 4")]
    EbiFormat { tokens: usize },
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
