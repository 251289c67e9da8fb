use std::net::IpAddr;
use std::time::Duration;

/// Session connection state.
///
/// Transitions: `Disconnected` → `Connecting` → `Connected` →
/// (`Disconnected` on any transport error or malformed frame).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No socket open.
    Disconnected,
    /// Resolving and dialing candidate addresses.
    Connecting,
    /// Stream established; frames flowing.
    Connected,
}

impl SessionState {
    /// Returns the state name as a static string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
        }
    }
}

/// Configuration for [`EewClient`](crate::EewClient) sessions.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Timeout for establishing the TCP connection. Default: 120 seconds.
    pub connect_timeout: Duration,
    /// Timeout for individual reads. The feed probes every few minutes, so
    /// this also bounds probe silence detection. Default: 120 seconds.
    pub read_timeout: Duration,
    /// Optional local address to bind before connecting.
    pub source_addr: Option<IpAddr>,
    /// Consecutive connect failures before
    /// [`ClientError::ConnectCeiling`](crate::ClientError::ConnectCeiling)
    /// is raised. Default: 60.
    pub max_connect_errors: u32,
    /// Stream errors before the session is closed and the counter reset
    /// (stop-and-reset, not fatal). Default: 30.
    pub max_errors: u32,
    /// Probe silence that forces a reconnect after a read timeout.
    /// Default: 5 minutes.
    pub liveness_window: Duration,
    /// Unit multiplied into the backoff step sequence. One second on a
    /// production feed; tests shrink it.
    pub backoff_unit: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(120),
            read_timeout: Duration::from_secs(120),
            source_addr: None,
            max_connect_errors: 60,
            max_errors: 30,
            liveness_window: Duration::from_secs(5 * 60),
            backoff_unit: Duration::from_secs(1),
        }
    }
}
