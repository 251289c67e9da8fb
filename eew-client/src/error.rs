use std::time::Duration;

/// Errors that can occur during feed client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// TCP or socket I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Protocol parsing error (malformed header, truncated bulletin, etc.).
    #[error("protocol error: {0}")]
    Protocol(#[from] eew_rs_protocol::ProtocolError),

    /// Operation exceeded the configured timeout duration.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// Server closed the connection (read returned 0 bytes).
    #[error("disconnected")]
    Disconnected,

    /// Every resolved address for the endpoint refused the connection.
    #[error("no address for {endpoint} accepted the connection")]
    ConnectFailed { endpoint: String },

    /// Consecutive connect failures exceeded the configured ceiling.
    /// Fatal: the host should terminate.
    #[error("connection failed {attempts} consecutive times, giving up")]
    ConnectCeiling { attempts: u32 },
}

/// Convenience alias for `Result<T, ClientError>`.
pub type Result<T> = std::result::Result<T, ClientError>;
