//! Physical connection seam. [`WsConnector`] speaks WebSocket through
//! `tokio-tungstenite`; tests substitute scripted connections.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::failure::ConnectionFailure;

/// One open, message-oriented connection.
#[async_trait]
pub trait Connection: Send {
    async fn send_text(&mut self, text: String) -> Result<(), ConnectionFailure>;

    /// Next text payload. Control frames are handled internally.
    async fn recv_text(&mut self) -> Result<String, ConnectionFailure>;

    /// Best-effort close handshake.
    async fn close(&mut self);
}

/// Opens connections to an endpoint.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Conn: Connection;

    async fn connect(&self, url: &str) -> Result<Self::Conn, ConnectionFailure>;
}

/// `ws://` / `wss://` connector.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    type Conn = WsConnection;

    async fn connect(&self, url: &str) -> Result<WsConnection, ConnectionFailure> {
        tracing::info!(url = %url, "connecting via WebSocket");
        let (stream, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| ConnectionFailure::from_ws_error(e, true))?;
        Ok(WsConnection { stream })
    }
}

pub struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Connection for WsConnection {
    async fn send_text(&mut self, text: String) -> Result<(), ConnectionFailure> {
        self.stream
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| ConnectionFailure::from_ws_error(e, false))
    }

    async fn recv_text(&mut self) -> Result<String, ConnectionFailure> {
        loop {
            match self.stream.next().await {
                None => {
                    return Err(ConnectionFailure::Closed {
                        code: 1006,
                        reason: "stream ended".into(),
                    })
                }
                Some(Err(e)) => return Err(ConnectionFailure::from_ws_error(e, false)),
                Some(Ok(Message::Text(text))) => return Ok(text.to_string()),
                // binary frames are not valid JSON-RPC; let the decoder reject them
                Some(Ok(Message::Binary(bytes))) => {
                    return Ok(String::from_utf8_lossy(&bytes).into_owned())
                }
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame
                        .map(|f| (u16::from(f.code), f.reason.to_string()))
                        .unwrap_or((1005, String::new()));
                    return Err(ConnectionFailure::Closed { code, reason });
                }
                Some(Ok(_)) => {}
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            tracing::debug!(error = %e, "WS close handshake failed");
        }
    }
}
