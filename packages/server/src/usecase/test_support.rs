//! ユースケースのテスト用フィクスチャ

use std::{
    sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    },
    time::Duration,
};

use tokio::sync::mpsc;

use crate::{
    domain::{UserId, UserProfile},
    infrastructure::{
        dto::websocket::ServerEvent,
        realtime::{ConnectionHandle, ConnectionHub},
        repository::{InMemoryMessageRepository, InMemoryUserRepository},
    },
};

pub(crate) const GRACE: Duration = Duration::from_millis(100);

pub(crate) fn user(id: &str) -> UserId {
    UserId::new(id.to_string()).unwrap()
}

pub(crate) struct Fixture {
    pub messages: Arc<InMemoryMessageRepository>,
    pub users: Arc<InMemoryUserRepository>,
    pub hub: Arc<ConnectionHub>,
}

impl Fixture {
    /// alice, bob, carol が登録済みの環境
    pub(crate) fn new() -> Self {
        let users = ["alice", "bob", "carol"]
            .into_iter()
            .map(|id| UserProfile::new(user(id), capitalize(id), None));
        Self {
            messages: Arc::new(InMemoryMessageRepository::with_clock(ticking_clock())),
            users: Arc::new(InMemoryUserRepository::with_users(users)),
            hub: Arc::new(ConnectionHub::new(GRACE)),
        }
    }

    /// `id` として接続し、接続時の userStatus ブロードキャストを読み捨てる
    pub(crate) async fn connect(&self, id: &str) -> (ConnectionHandle, Inbox) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = ConnectionHandle::new(tx);
        self.hub.connect(&user(id), handle.clone()).await;
        let mut inbox = Inbox(rx);
        inbox.drain();
        (handle, inbox)
    }
}

/// 接続に届いたフレーム
pub(crate) struct Inbox(mpsc::UnboundedReceiver<String>);

impl Inbox {
    pub(crate) fn drain(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(frame) = self.0.try_recv() {
            events.push(serde_json::from_str(&frame).unwrap());
        }
        events
    }
}

/// 呼ぶたびに 1ms 進む時計
fn ticking_clock() -> Arc<dyn Fn() -> i64 + Send + Sync> {
    let now = AtomicI64::new(1_700_000_000_000);
    Arc::new(move || now.fetch_add(1, Ordering::SeqCst))
}

fn capitalize(id: &str) -> String {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
