use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpSocket, TcpStream, lookup_host};
use tracing::{debug, warn};

use crate::error::{ClientError, Result};
use crate::state::ClientConfig;

pub struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
    read_timeout: Duration,
}

impl Connection {
    /// Resolve `endpoint` and dial each candidate address in order; the
    /// first successful stream wins.
    pub async fn connect(endpoint: &str, config: &ClientConfig) -> Result<Self> {
        debug!(endpoint, "resolving");
        let mut last_err = None;

        for addr in lookup_host(endpoint).await.map_err(ClientError::Io)? {
            match Self::connect_addr(addr, config).await {
                Ok(conn) => return Ok(conn),
                Err(e) => {
                    warn!(%addr, error = %e, "candidate address failed");
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or(ClientError::ConnectFailed {
            endpoint: endpoint.to_owned(),
        }))
    }

    async fn connect_addr(addr: SocketAddr, config: &ClientConfig) -> Result<Self> {
        debug!(%addr, "TCP connecting");
        let connect = async {
            match config.source_addr {
                Some(source) => {
                    let socket = if addr.is_ipv4() {
                        TcpSocket::new_v4()?
                    } else {
                        TcpSocket::new_v6()?
                    };
                    socket.bind(SocketAddr::new(source, 0))?;
                    socket.connect(addr).await
                }
                None => TcpStream::connect(addr).await,
            }
        };
        let stream = tokio::time::timeout(config.connect_timeout, connect)
            .await
            .map_err(|_| ClientError::Timeout(config.connect_timeout))?
            .map_err(ClientError::Io)?;

        stream.set_nodelay(true).ok();

        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
            read_timeout: config.read_timeout,
        })
    }

    /// Fill `buf` exactly, bounded by the read timeout. A peer close
    /// mid-read surfaces as [`ClientError::Disconnected`].
    pub async fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        tokio::time::timeout(self.read_timeout, self.reader.read_exact(buf))
            .await
            .map_err(|_| ClientError::Timeout(self.read_timeout))?
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::UnexpectedEof {
                    ClientError::Disconnected
                } else {
                    ClientError::Io(e)
                }
            })?;
        Ok(())
    }

    pub async fn send_raw(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data).await.map_err(ClientError::Io)?;
        self.writer.flush().await.map_err(ClientError::Io)?;
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.writer.shutdown().await.map_err(ClientError::Io)?;
        Ok(())
    }
}
