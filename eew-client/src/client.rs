use std::time::{Duration, Instant};

use eew_rs_protocol::frame::{self, Frame, FrameHeader};
use tracing::{debug, info, warn};

use crate::connection::Connection;
use crate::error::{ClientError, Result};
use crate::state::{ClientConfig, SessionState};

/// Resilient client for an EEW push feed.
///
/// Owns the TCP session and its connect/backoff/reconnect state machine,
/// answers in-band liveness and checkpoint probes, and surfaces payloads
/// only for alert-tagged frames. One frame is handled per
/// [`process()`](Self::process) call; hosts embed it in their own polling
/// loop.
///
/// # Example
///
/// ```no_run
/// # async fn example() -> eew_rs_client::Result<()> {
/// use eew_rs_client::EewClient;
/// use eew_rs_protocol::{AlertRecord, Bulletin, BulletinKind};
///
/// let mut client = EewClient::new("feed.example.net:9999");
/// loop {
///     let Some(payload) = client.process().await? else {
///         continue;
///     };
///     let bulletin = Bulletin::parse(&payload)?;
///     if bulletin.kind() == BulletinKind::Coded {
///         let record =
///             AlertRecord::parse(&bulletin.basic().message_type, &bulletin.coded_message());
///         println!("magnitude {:?}", record.magnitude);
///     }
/// }
/// # }
/// ```
pub struct EewClient {
    endpoint: String,
    config: ClientConfig,
    connection: Option<Connection>,
    state: SessionState,
    connect_err_count: u32,
    err_count: u32,
    last_probe: Option<Instant>,
}

impl EewClient {
    /// Create a client for `endpoint` (host:port) with default configuration.
    ///
    /// No I/O happens until the first [`process()`](Self::process) or
    /// [`connect()`](Self::connect) call.
    pub fn new(endpoint: &str) -> Self {
        Self::with_config(endpoint, ClientConfig::default())
    }

    /// Create a client with custom [`ClientConfig`].
    pub fn with_config(endpoint: &str, config: ClientConfig) -> Self {
        Self {
            endpoint: endpoint.to_owned(),
            config,
            connection: None,
            state: SessionState::Disconnected,
            connect_err_count: 0,
            err_count: 0,
            last_probe: None,
        }
    }

    // -- Accessors --

    /// Returns the current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Consecutive connect failures since the last successful connect.
    pub fn connect_err_count(&self) -> u32 {
        self.connect_err_count
    }

    /// Stream errors since the last successful connect or reset.
    pub fn err_count(&self) -> u32 {
        self.err_count
    }

    /// When the last liveness probe arrived, if any.
    pub fn last_probe_at(&self) -> Option<Instant> {
        self.last_probe
    }

    /// Returns the configuration used for this session.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // -- Session control --

    /// Establish the connection, applying exponential backoff before a
    /// retry: `min(2^connect_err_count, 60)` backoff units.
    ///
    /// Success resets both error counters. Already connected is a no-op.
    pub async fn connect(&mut self) -> Result<()> {
        if self.connection.is_some() {
            debug!(state = self.state.as_str(), "already connected");
            return Ok(());
        }
        if self.connect_err_count > 0 {
            let wait = backoff_delay(self.connect_err_count, self.config.backoff_unit);
            warn!(
                failures = self.connect_err_count,
                wait_ms = wait.as_millis() as u64,
                "backing off before reconnect"
            );
            tokio::time::sleep(wait).await;
        }
        self.state = SessionState::Connecting;
        match Connection::connect(&self.endpoint, &self.config).await {
            Ok(conn) => {
                info!(endpoint = %self.endpoint, "connected");
                self.connection = Some(conn);
                self.state = SessionState::Connected;
                self.connect_err_count = 0;
                self.err_count = 0;
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Disconnected;
                debug!(state = self.state.as_str(), error = %e, "connect attempt failed");
                Err(e)
            }
        }
    }

    /// Close the session. The next [`process()`](Self::process) reconnects.
    pub async fn stop(&mut self) {
        if let Some(conn) = self.connection.as_mut() {
            conn.shutdown().await.ok();
        }
        self.close();
    }

    /// Read and handle exactly one frame.
    ///
    /// Returns `Ok(Some(payload))` only for alert-tagged frames; liveness
    /// and checkpoint probes are answered in-band and consumed, as are
    /// recoverable transport errors (`Ok(None)` in all those cases). The
    /// only error surfaced is the fatal
    /// [`ConnectCeiling`](ClientError::ConnectCeiling).
    pub async fn process(&mut self) -> Result<Option<Vec<u8>>> {
        if self.connect_err_count > self.config.max_connect_errors {
            return Err(ClientError::ConnectCeiling {
                attempts: self.connect_err_count,
            });
        }
        if self.err_count > self.config.max_errors {
            warn!(errors = self.err_count, "too many stream errors, resetting session");
            self.close();
            self.err_count = 0;
        }
        if self.connection.is_none() {
            if let Err(e) = self.connect().await {
                self.connect_err_count += 1;
                warn!(
                    error = %e,
                    failures = self.connect_err_count,
                    "connect failed"
                );
                return Ok(None);
            }
        }

        let mut header_buf = [0u8; frame::HEADER_LEN];
        if let Err(e) = self.read(&mut header_buf).await {
            self.note_read_failure(e);
            return Ok(None);
        }

        let header = match FrameHeader::parse(&header_buf) {
            Ok(header) => header,
            Err(e) => {
                info!(
                    error = %e,
                    raw = %header_buf.escape_ascii(),
                    "bogus header, reconnecting"
                );
                self.close();
                return Ok(None);
            }
        };

        let mut body = vec![0u8; header.length];
        if let Err(e) = self.read(&mut body).await {
            self.note_read_failure(e);
            return Ok(None);
        }
        let frame = Frame::new(header, body)?;

        if frame.is_liveness_probe() {
            self.last_probe = Some(Instant::now());
            let reply = frame.liveness_reply();
            if !self.reply(&reply).await {
                return Ok(None);
            }
            info!("liveness probe acked");
        }
        if frame.header.tag.needs_checkpoint() {
            let reply = frame.checkpoint_reply();
            if !self.reply(&reply).await {
                return Ok(None);
            }
            info!(tag = %frame.header.tag, "checkpoint acked");
        }
        if frame.header.tag.is_alert() {
            debug!(len = frame.body.len(), "alert frame surfaced");
            return Ok(Some(frame.into_body()));
        }
        Ok(None)
    }

    // -- Private helpers --

    fn close(&mut self) {
        self.connection = None;
        self.state = SessionState::Disconnected;
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        match self.connection.as_mut() {
            Some(conn) => conn.read_exact(buf).await,
            None => Err(ClientError::Disconnected),
        }
    }

    /// Write a reply frame; on failure count the error, drop the
    /// connection, and report `false`.
    async fn reply(&mut self, data: &[u8]) -> bool {
        let result = match self.connection.as_mut() {
            Some(conn) => conn.send_raw(data).await,
            None => Err(ClientError::Disconnected),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "reply write failed");
                self.err_count += 1;
                self.close();
                false
            }
        }
    }

    fn note_read_failure(&mut self, err: ClientError) {
        match err {
            ClientError::Timeout(_) => {
                self.err_count += 1;
                match self.last_probe {
                    None => warn!("read timeout before any liveness probe"),
                    Some(at) if at.elapsed() > self.config.liveness_window => {
                        warn!(
                            silence_secs = at.elapsed().as_secs(),
                            "probe silence too long, reconnecting"
                        );
                        self.close();
                    }
                    Some(at) => {
                        info!(silence_secs = at.elapsed().as_secs(), "read timeout");
                    }
                }
            }
            ClientError::Disconnected => {
                warn!("peer closed the connection");
                self.connect_err_count += 1;
                self.close();
            }
            err => {
                warn!(error = %err, "read failed");
                self.err_count += 1;
                self.close();
            }
        }
    }
}

/// Backoff step in seconds for a given consecutive-failure count:
/// `min(2^count, 60)`.
pub fn backoff_secs(count: u32) -> u64 {
    2u64.checked_pow(count).map_or(60, |v| v.min(60))
}

/// Backoff step scaled by the configured unit.
pub fn backoff_delay(count: u32, unit: Duration) -> Duration {
    unit * backoff_secs(count) as u32
}
