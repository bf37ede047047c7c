//! Shared fixtures for integration tests.
//!
//! Starts the server in-process on an ephemeral port with a fixed seed of
//! users and tokens.

#![allow(dead_code)]

use std::{net::SocketAddr, time::Duration};

use futures_util::{SinkExt, StreamExt};
use kizuna_server::{
    infrastructure::Seed,
    ui::{build_state, serve},
};
use serde_json::Value;
use tokio::{net::TcpListener, net::TcpStream, sync::oneshot, time::timeout};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Error as WsError, Message},
};

/// Grace period used by the test server
pub const OFFLINE_GRACE: Duration = Duration::from_millis(300);

const SEED: &str = r#"{
    "users": [
        {"id": "alice", "name": "Alice", "token": "alice-token"},
        {"id": "bob", "name": "Bob", "avatar": "https://example.com/bob.png", "token": "bob-token"},
        {"id": "carol", "name": "Carol", "token": "carol-token"},
        {"id": "mallory", "name": "Mallory", "banned": true, "banReason": "spam", "token": "mallory-token"}
    ]
}"#;

pub struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        let seed = Seed::from_json(SEED).expect("valid seed");
        let state = build_state(seed, OFFLINE_GRACE);
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            serve(listener, state, async {
                let _ = shutdown_rx.await;
            })
            .await
            .ok();
        });

        Self {
            addr,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self, user_id: &str) -> String {
        format!("ws://{}/ws?userId={}", self.addr, user_id)
    }

    /// Open a websocket as `user_id`
    pub async fn connect(&self, user_id: &str) -> Result<WsClient, WsError> {
        let (stream, _) = connect_async(self.ws_url(user_id)).await?;
        Ok(WsClient { stream })
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    /// Send one `{event, data}` frame
    pub async fn emit(&mut self, event: &str, data: Value) {
        let frame = serde_json::json!({"event": event, "data": data});
        self.stream
            .send(Message::Text(frame.to_string().into()))
            .await
            .expect("send frame");
    }

    /// Next event frame, or `None` if nothing arrives within `wait`
    pub async fn next_event(&mut self, wait: Duration) -> Option<Value> {
        loop {
            match timeout(wait, self.stream.next()).await {
                Ok(Some(Ok(Message::Text(text)))) => {
                    return Some(serde_json::from_str(&text).expect("json frame"));
                }
                Ok(Some(Ok(Message::Close(_)))) | Ok(Some(Err(_))) | Ok(None) | Err(_) => {
                    return None;
                }
                Ok(Some(Ok(_))) => continue,
            }
        }
    }

    /// Skip frames until an event named `name` arrives
    pub async fn expect_event(&mut self, name: &str) -> Value {
        loop {
            let event = self
                .next_event(Duration::from_secs(2))
                .await
                .unwrap_or_else(|| panic!("timed out waiting for {name}"));
            if event["event"] == name {
                return event;
            }
        }
    }

    /// Skip frames until `user_id` is reported with `status`
    pub async fn expect_status(&mut self, user_id: &str, status: &str) {
        loop {
            let event = self.expect_event("userStatus").await;
            if event["data"]["userId"] == user_id && event["data"]["status"] == status {
                return;
            }
        }
    }

    /// Round-trip `getOnlineUsers` so every frame sent before it has been handled
    pub async fn sync(&mut self) -> Value {
        self.emit("getOnlineUsers", Value::Null).await;
        self.expect_event("onlineUsers").await
    }

    /// Collect every frame that arrives within `wait`
    pub async fn drain(&mut self, wait: Duration) -> Vec<Value> {
        let mut events = Vec::new();
        while let Some(event) = self.next_event(wait).await {
            events.push(event);
        }
        events
    }

    /// Whether the server closed the connection within `wait`
    pub async fn is_closed_by_server(&mut self, wait: Duration) -> bool {
        loop {
            match timeout(wait, self.stream.next()).await {
                Ok(Some(Ok(Message::Close(_)))) | Ok(Some(Err(_))) | Ok(None) => return true,
                Ok(Some(Ok(_))) => continue,
                Err(_) => return false,
            }
        }
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}
