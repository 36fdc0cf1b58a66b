/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Establishing the connection failed.
    ///
    /// Carries a message rather than the underlying error so the failure
    /// can be reported to every caller waiting on the same dial attempt.
    #[error("connect failed: {0}")]
    ConnectFailed(String),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// The connection is closed.
    #[error("connection closed")]
    Closed,
}
