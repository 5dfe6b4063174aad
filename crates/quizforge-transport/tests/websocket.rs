//! Integration tests for the WebSocket transport.
//!
//! A real listener on an OS-assigned port and a real client, so frames
//! actually cross a socket.

#[cfg(feature = "websocket")]
mod websocket {
    use std::sync::Arc;
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use quizforge_transport::{Connection, Transport, WebSocketTransport};
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn connect_client(addr: &str) -> ClientWs {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        ws
    }

    async fn accept_one() -> (quizforge_transport::WebSocketConnection, ClientWs) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("local addr").to_string();

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let client = connect_client(&addr).await;
        let server_conn = server_handle.await.expect("task should complete");
        (server_conn, client)
    }

    #[tokio::test]
    async fn test_websocket_accept_and_send_receive() {
        let (server_conn, mut client_ws) = accept_one().await;
        assert_eq!(server_conn.id().get(), 1);
        assert!(server_conn.peer_addr().ip().is_loopback());

        server_conn
            .send(br#"{"type":"gameStarted","totalQuestions":3}"#)
            .await
            .expect("send should succeed");

        let msg = client_ws.next().await.unwrap().unwrap();
        assert!(msg.is_text(), "JSON payloads travel as text frames");
        assert_eq!(
            msg.into_data().as_ref(),
            br#"{"type":"gameStarted","totalQuestions":3}"#,
        );

        client_ws
            .send(Message::Text(r#"{"type":"start","roomId":"R1"}"#.into()))
            .await
            .unwrap();

        let received = server_conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, br#"{"type":"start","roomId":"R1"}"#);

        server_conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_connection_ids_follow_accept_order() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("local addr").to_string();

        let accepted = tokio::spawn(async move {
            let first = transport.accept().await.expect("first accept");
            let second = transport.accept().await.expect("second accept");
            (first.id().get(), second.id().get())
        });
        let _a = connect_client(&addr).await;
        let _b = connect_client(&addr).await;

        assert_eq!(accepted.await.unwrap(), (1, 2));
    }

    #[tokio::test]
    async fn test_send_is_not_blocked_by_pending_recv() {
        let (server_conn, mut client_ws) = accept_one().await;
        let server_conn = Arc::new(server_conn);

        let reader = {
            let conn = Arc::clone(&server_conn);
            tokio::spawn(async move { conn.recv().await })
        };
        // Let the reader park inside recv before sending.
        tokio::time::sleep(Duration::from_millis(20)).await;

        tokio::time::timeout(Duration::from_secs(2), server_conn.send(b"ping"))
            .await
            .expect("send must not wait for the reader")
            .expect("send should succeed");

        let msg = client_ws.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), b"ping");

        client_ws.send(Message::Close(None)).await.unwrap();
        let result = reader.await.unwrap().expect("recv should not error");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_client_close() {
        let (server_conn, mut client_ws) = accept_one().await;

        client_ws.send(Message::Close(None)).await.unwrap();

        let result = server_conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_pings_count_as_activity() {
        let (server_conn, mut client_ws) = accept_one().await;
        let server_conn = Arc::new(server_conn);
        let connected = server_conn.last_seen();

        let reader = {
            let conn = Arc::clone(&server_conn);
            tokio::spawn(async move { conn.recv().await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        client_ws.send(Message::Ping(b"hi".to_vec().into())).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!reader.is_finished(), "pings are not handed to the caller");
        assert!(server_conn.last_seen() >= connected + Duration::from_millis(50));

        client_ws.send(Message::Close(None)).await.unwrap();
        let result = reader.await.unwrap().expect("recv should not error");
        assert!(result.is_none());
    }
}
