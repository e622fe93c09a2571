#![allow(clippy::unwrap_used)]
// Integration tests for `WebSocketTransport` against a loopback server.

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_test::assert_ok;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use url::Url;

use realmfeed_api::{Error, LiveMessage, Transport, WebSocketTransport, decode_frame};

// ── Helpers ─────────────────────────────────────────────────────────

/// Start a one-shot WebSocket server that sends `frames` then closes
/// with `close`. Returns the `ws://` endpoint to connect to.
async fn serve(frames: Vec<Message>, close: Option<CloseFrame>) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        for frame in frames {
            ws.send(frame).await.unwrap();
        }
        let _ = ws.close(close).await;
    });

    Url::parse(&format!("ws://{addr}/feed")).unwrap()
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_streams_text_frames_then_ends_cleanly() {
    let upsert = json!({
        "type": "upsert",
        "id": "e1",
        "coordinate": [1.0, 2.0, 3.0],
        "realm": "grove"
    });
    let removal = json!({ "type": "remove", "id": "e1" });

    let endpoint = serve(
        vec![
            Message::text(upsert.to_string()),
            Message::binary(vec![0_u8, 1, 2]),
            Message::text(removal.to_string()),
        ],
        None,
    )
    .await;

    let mut frames = WebSocketTransport::new().open(&endpoint).await.unwrap();

    let first = assert_ok!(frames.next().await.unwrap());
    let decoded = assert_ok!(decode_frame(&first));
    assert_eq!(decoded.messages.len(), 1);
    assert_eq!(decoded.messages[0].id(), "e1");

    let second = assert_ok!(frames.next().await.unwrap());
    let decoded = assert_ok!(decode_frame(&second));
    assert_eq!(
        decoded.messages,
        vec![LiveMessage::Remove { id: "e1".into() }]
    );

    assert!(frames.next().await.is_none(), "stream should end on normal close");
}

#[tokio::test]
async fn test_abnormal_close_surfaces_as_error() {
    let endpoint = serve(
        Vec::new(),
        Some(CloseFrame {
            code: CloseCode::Away,
            reason: "server restarting".into(),
        }),
    )
    .await;

    let mut frames = WebSocketTransport::new().open(&endpoint).await.unwrap();

    match frames.next().await {
        Some(Err(Error::WebSocketClosed { code, reason })) => {
            assert_eq!(code, 1001);
            assert_eq!(reason, "server restarting");
        }
        other => panic!("expected WebSocketClosed, got {other:?}"),
    }
    assert!(frames.next().await.is_none());
}
