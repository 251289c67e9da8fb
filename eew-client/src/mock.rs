//! In-process mock feed server for tests.
//!
//! Serves scripted frame lists over sequential connections and captures
//! every byte the client writes back, so tests can assert the exact
//! liveness and checkpoint replies on the wire.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use eew_rs_protocol::frame::{FrameTag, build_header};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub struct MockConfig {
    /// Frames to send on each sequential connection; the server stops
    /// accepting once the list is exhausted.
    pub connection_frames: Vec<Vec<Vec<u8>>>,
    /// Close the server→client direction after sending a connection's
    /// frames (the client sees EOF after draining them).
    pub close_after_frames: bool,
}

impl MockConfig {
    pub fn single(frames: Vec<Vec<u8>>) -> Self {
        Self {
            connection_frames: vec![frames],
            close_after_frames: false,
        }
    }
}

/// Build one wire frame: 10-byte header + body.
pub fn wire_frame(tag: &[u8; 2], body: &[u8]) -> Vec<u8> {
    let header = build_header(body.len(), FrameTag::new(*tag)).unwrap();
    let mut out = Vec::with_capacity(header.len() + body.len());
    out.extend_from_slice(&header);
    out.extend_from_slice(body);
    out
}

pub struct MockFeedServer {
    addr: SocketAddr,
    captured: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl MockFeedServer {
    pub async fn start(config: MockConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let captured: Arc<Mutex<Vec<Vec<u8>>>> = Arc::new(Mutex::new(Vec::new()));

        let capture = Arc::clone(&captured);
        tokio::spawn(async move {
            for frames in config.connection_frames {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let index = {
                    let mut all = capture.lock().unwrap();
                    all.push(Vec::new());
                    all.len() - 1
                };

                let (mut read_half, mut write_half) = stream.into_split();
                let reader_capture = Arc::clone(&capture);
                let reader = tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    loop {
                        match read_half.read(&mut buf).await {
                            Ok(0) | Err(_) => break,
                            Ok(n) => reader_capture.lock().unwrap()[index]
                                .extend_from_slice(&buf[..n]),
                        }
                    }
                });

                for frame in &frames {
                    if write_half.write_all(frame).await.is_err() {
                        break;
                    }
                }
                let _ = write_half.flush().await;

                if config.close_after_frames {
                    drop(write_half);
                }
                // Keep capturing until the client closes its side.
                let _ = reader.await;
            }
        });

        Self { addr, captured }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Snapshot of everything the client wrote on connection `index`.
    pub fn captured(&self, index: usize) -> Vec<u8> {
        self.captured
            .lock()
            .unwrap()
            .get(index)
            .cloned()
            .unwrap_or_default()
    }

    /// Poll until connection `index` has captured at least `len` bytes.
    pub async fn wait_for_capture(&self, index: usize, len: usize) -> Vec<u8> {
        for _ in 0..200 {
            let snapshot = self.captured(index);
            if snapshot.len() >= len {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!(
            "capture on connection {index} never reached {len} bytes: {:?}",
            self.captured(index)
        );
    }
}
