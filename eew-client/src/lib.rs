//! Async client for EEW push feeds.
//!
//! Stays connected to a feed server with exponential-backoff reconnect,
//! answers in-band liveness and checkpoint probes, and surfaces alert
//! frame payloads for bulletin decoding.

pub mod client;
pub mod connection;
pub mod error;
pub mod state;
pub mod stream;

#[cfg(test)]
pub(crate) mod mock;

pub use client::EewClient;
pub use error::{ClientError, Result};
pub use state::{ClientConfig, SessionState};
pub use stream::bulletin_stream;
