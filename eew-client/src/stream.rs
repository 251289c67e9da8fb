use eew_rs_protocol::bulletin::hex_dump;
use eew_rs_protocol::{Bulletin, BulletinKind};
use futures_core::Stream;
use tracing::{debug, warn};

use crate::EewClient;
use crate::error::ClientError;

/// Convert an [`EewClient`] into a [`Stream`] of decoded bulletins.
///
/// The client keeps reconnecting internally, so the stream only ends when
/// the connect-failure ceiling is hit (the terminal `Err`). Payloads that
/// fail bulletin decoding are logged and skipped.
pub fn bulletin_stream(
    mut client: EewClient,
) -> impl Stream<Item = Result<Bulletin, ClientError>> {
    async_stream::try_stream! {
        loop {
            let Some(payload) = client.process().await? else {
                continue;
            };
            match Bulletin::parse(&payload) {
                Ok(bulletin) => {
                    if bulletin.kind() == BulletinKind::Unknown {
                        debug!(
                            "unrecognized type marker:\n{}",
                            hex_dump(bulletin.type_line())
                        );
                    }
                    yield bulletin;
                }
                Err(e) => warn!(error = %e, "undecodable bulletin skipped"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockConfig, MockFeedServer, wire_frame};
    use crate::state::ClientConfig;
    use eew_rs_protocol::BulletinKind;
    use std::pin::pin;
    use std::time::Duration;
    use tokio_stream::StreamExt;

    const CODED_MARKER: &[u8] = b"\xc5\xb3\xb7\xd4\xbd\xc43 \xb7\xbc\xd6\xb3";

    fn make_bulletin(message_type: &str) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(b"0001 seq01\n");
        body.extend_from_slice(CODED_MARKER);
        body.push(b'\n');
        body.extend_from_slice(b"(header)\n");
        body.extend_from_slice(
            format!("{message_type} 0 00 110311144616 1\n").as_bytes(),
        );
        body.extend_from_slice(b"110311144616 ND20110311144640 NCN001\n");
        body.extend_from_slice(b"9999=\n");
        body
    }

    fn test_config() -> ClientConfig {
        ClientConfig {
            read_timeout: Duration::from_millis(200),
            backoff_unit: Duration::from_millis(1),
            ..ClientConfig::default()
        }
    }

    #[tokio::test]
    async fn stream_yields_decoded_bulletins() {
        let frames = vec![
            wire_frame(b"AN", &make_bulletin("35")),
            wire_frame(b"AN", &make_bulletin("36")),
        ];
        let server = MockFeedServer::start(MockConfig {
            connection_frames: vec![frames],
            close_after_frames: false,
        })
        .await;
        let client =
            EewClient::with_config(&server.addr().to_string(), test_config());

        let mut stream = pin!(bulletin_stream(client));

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.kind(), BulletinKind::Coded);
        assert_eq!(first.basic().message_type, "35");

        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(second.basic().message_type, "36");
    }

    #[tokio::test]
    async fn stream_skips_probes_and_undecodable_payloads() {
        let frames = vec![
            wire_frame(b"EN", b"chk"),
            wire_frame(b"AN", b"too short"),
            wire_frame(b"AN", &make_bulletin("37")),
        ];
        let server = MockFeedServer::start(MockConfig {
            connection_frames: vec![frames],
            close_after_frames: false,
        })
        .await;
        let client =
            EewClient::with_config(&server.addr().to_string(), test_config());

        let mut stream = pin!(bulletin_stream(client));

        // The probe and the truncated payload are both consumed silently.
        let bulletin = stream.next().await.unwrap().unwrap();
        assert_eq!(bulletin.basic().message_type, "37");
    }

    #[tokio::test]
    async fn stream_survives_peer_close() {
        let server = MockFeedServer::start(MockConfig {
            connection_frames: vec![
                vec![wire_frame(b"AN", &make_bulletin("35"))],
                vec![wire_frame(b"AN", &make_bulletin("39"))],
            ],
            close_after_frames: true,
        })
        .await;
        let client =
            EewClient::with_config(&server.addr().to_string(), test_config());

        let mut stream = pin!(bulletin_stream(client));

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.basic().message_type, "35");

        // EOF forces a reconnect behind the scenes; the stream carries on.
        let second = stream.next().await.unwrap().unwrap();
        assert!(second.is_cancel());
    }

    #[tokio::test]
    async fn stream_terminates_on_connect_ceiling() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = ClientConfig {
            max_connect_errors: 1,
            ..test_config()
        };
        let client = EewClient::with_config(&addr.to_string(), config);

        let mut stream = pin!(bulletin_stream(client));
        let item = stream.next().await.unwrap();
        assert!(matches!(
            item,
            Err(ClientError::ConnectCeiling { attempts: 2 })
        ));
        assert!(stream.next().await.is_none());
    }
}
