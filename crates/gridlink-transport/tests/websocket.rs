//! Integration tests for the WebSocket transport.
//!
//! These tests spin up a real WebSocket server (raw tokio-tungstenite,
//! accept side) and dial it with [`WebSocketConnector`] to verify that
//! data actually flows over the network correctly.
//!
//! We use `tokio::test` because these tests are async — they need the
//! Tokio runtime to drive the futures (accept, connect, send, recv).

#[cfg(feature = "websocket")]
mod websocket {
    use std::sync::Arc;
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use gridlink_transport::{Connection, Connector, TransportError, WebSocketConnector};
    use tokio::net::TcpListener;

    /// Helper: binds a listener on a random port and returns it along
    /// with the `ws://` URL a client should dial.
    async fn bind_server() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("should bind");
        let addr = listener.local_addr().expect("should have a local addr");
        (listener, format!("ws://{addr}"))
    }

    #[tokio::test]
    async fn test_websocket_connect_and_round_trip() {
        let (listener, url) = bind_server().await;

        // Server: accept one connection and echo frames back.
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("should accept");
            let mut ws = tokio_tungstenite::accept_async(stream)
                .await
                .expect("handshake should succeed");
            while let Some(Ok(msg)) = ws.next().await {
                if msg.is_binary() || msg.is_text() {
                    ws.send(msg).await.expect("echo send should succeed");
                }
            }
        });

        let conn = WebSocketConnector::new()
            .connect(&url)
            .await
            .expect("client should connect");

        conn.send(b"hello from client")
            .await
            .expect("send should succeed");

        let received = conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, b"hello from client");

        conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_server_close() {
        let (listener, url) = bind_server().await;

        // Server: accept, then immediately close the connection.
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("should accept");
            let mut ws = tokio_tungstenite::accept_async(stream)
                .await
                .expect("handshake should succeed");
            ws.close(None).await.expect("server close should succeed");
        });

        let conn = WebSocketConnector::new()
            .connect(&url)
            .await
            .expect("client should connect");

        let result = conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on server close");
    }

    #[tokio::test]
    async fn test_websocket_connect_refused_returns_connect_failed() {
        // Bind to learn a free port, then drop the listener so nothing
        // is listening there when the client dials.
        let (listener, url) = bind_server().await;
        drop(listener);

        let result = WebSocketConnector::new().connect(&url).await;
        assert!(matches!(result, Err(TransportError::ConnectFailed(_))));
    }

    #[tokio::test]
    async fn test_websocket_text_frames_surface_as_bytes() {
        let (listener, url) = bind_server().await;

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("should accept");
            let mut ws = tokio_tungstenite::accept_async(stream)
                .await
                .expect("handshake should succeed");
            ws.send(tokio_tungstenite::tungstenite::Message::Text("hi".into()))
                .await
                .expect("text send should succeed");
        });

        let conn = WebSocketConnector::new()
            .connect(&url)
            .await
            .expect("client should connect");

        let received = conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, b"hi");
    }

    #[tokio::test]
    async fn test_websocket_send_while_recv_is_pending() {
        // The property the split halves exist for: a task parked in
        // `recv` must not block a concurrent `send`.
        let (listener, url) = bind_server().await;

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("should accept");
            let mut ws = tokio_tungstenite::accept_async(stream)
                .await
                .expect("handshake should succeed");
            // Stay silent until the client sends, then echo.
            if let Some(Ok(msg)) = ws.next().await {
                ws.send(msg).await.expect("echo send should succeed");
            }
        });

        let conn = Arc::new(
            WebSocketConnector::new()
                .connect(&url)
                .await
                .expect("client should connect"),
        );

        // Park a reader first, like the client's reader task does.
        let reader = {
            let conn = Arc::clone(&conn);
            tokio::spawn(async move { conn.recv().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        conn.send(b"ping")
            .await
            .expect("send should succeed while recv is pending");

        let received = tokio::time::timeout(Duration::from_secs(2), reader)
            .await
            .expect("recv should complete instead of deadlocking")
            .expect("reader task should not panic")
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, b"ping");
    }
}
