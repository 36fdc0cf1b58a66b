//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! [`WebSocketConnector`] dials `ws://` URLs and produces a
//! [`WebSocketConnection`]. The stream is split into separate read and
//! write halves, each behind its own lock: the client parks a reader
//! task in `recv` for the lifetime of the connection, and sends must
//! not queue behind it.
//!
//! `wss://` URLs additionally need one of tokio-tungstenite's TLS
//! features enabled.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::{Connection, Connector, TransportError};

/// The concrete stream type produced by `connect_async`.
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Dials WebSocket servers.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    /// Creates a new connector.
    pub fn new() -> Self {
        Self
    }
}

impl Connector for WebSocketConnector {
    type Connection = WebSocketConnection;

    async fn connect(&self, url: &str) -> Result<WebSocketConnection, TransportError> {
        // The URL may carry a session token in its query string, so it
        // is never logged, not even on failure.
        let (ws, _response) = connect_async(url)
            .await
            .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;
        tracing::debug!("websocket connection established");

        let (writer, reader) = ws.split();
        Ok(WebSocketConnection {
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
        })
    }
}

/// An established WebSocket connection.
pub struct WebSocketConnection {
    writer: Mutex<SplitSink<WsStream, Message>>,
    reader: Mutex<SplitStream<WsStream>>,
}

impl Connection for WebSocketConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let mut writer = self.writer.lock().await;
        writer
            .send(Message::Binary(data.to_vec().into()))
            .await
            .map_err(|e| {
                TransportError::SendFailed(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    e,
                ))
            })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut reader = self.reader.lock().await;
        loop {
            match reader.next().await {
                // Binary is the normal case; the protocol layer encodes
                // everything as binary frames.
                Some(Ok(Message::Binary(data))) => return Ok(Some(data.into())),
                // Some servers send text frames; surface them as bytes.
                Some(Ok(Message::Text(text))) => return Ok(Some(text.as_bytes().to_vec())),
                // Clean close, either via close frame or end of stream.
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                // Ping/pong are handled by tungstenite itself.
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        e,
                    )));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        let mut writer = self.writer.lock().await;
        writer.close().await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }
}
