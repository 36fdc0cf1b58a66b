//! Transport abstraction layer for Gridlink.
//!
//! Provides the [`Connector`] and [`Connection`] traits that abstract over
//! how the client reaches the server. The rest of the client only ever
//! speaks in bytes: framing and message types live one layer up, in
//! `gridlink-protocol`.
//!
//! Swapping the transport out is how the client gets tested — integration
//! tests dial an in-process server instead of a real backend, without
//! changing any client code.
//!
//! # Feature Flags
//!
//! - `websocket` (default) — WebSocket transport via `tokio-tungstenite`

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketConnector};

/// Establishes outbound connections.
///
/// # Trait bounds
///
/// - `Send + Sync` → the connector is shared across async tasks.
/// - `'static` → it doesn't borrow temporary data; it lives as long as
///   the client that owns it.
///
/// # Why `impl Future` instead of `async fn`?
///
/// The client dials from spawned background tasks, so the futures these
/// methods return must be `Send`. Writing the return type out lets the
/// trait require that; implementors still just write `async fn`.
pub trait Connector: Send + Sync + 'static {
    /// The connection type produced by this connector.
    type Connection: Connection;

    /// Dials the given URL and returns an established connection.
    fn connect(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = Result<Self::Connection, TransportError>> + Send;
}

/// A single established connection that can send and receive bytes.
///
/// `send` and `recv` take `&self` so one task can sit in a receive loop
/// while others send. Implementations must support that concurrently.
pub trait Connection: Send + Sync + 'static {
    /// Sends one message to the server.
    fn send(
        &self,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;

    /// Receives the next message from the server.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    fn recv(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<Vec<u8>>, TransportError>> + Send;

    /// Closes the connection.
    fn close(&self) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;
}
