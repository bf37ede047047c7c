//! WebSocket transport.
//!
//! One background task owns the socket. Decoded server events come out of
//! [`Connection::recv`]; client events go in through [`Connection::send`].
//! The incoming channel closes when the server closes the socket.

use futures_util::{SinkExt, StreamExt};
use kizuna_server::infrastructure::dto::websocket::{ClientEvent, ServerEvent};
use tokio::{sync::mpsc, task::JoinHandle};
use reqwest::Url;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::error::ClientError;

pub struct Connection {
    outgoing: mpsc::UnboundedSender<ClientEvent>,
    incoming: mpsc::UnboundedReceiver<ServerEvent>,
    task: JoinHandle<()>,
}

impl Connection {
    /// Open `<base_url>?userId=<user_id>` and start the socket task.
    pub async fn open(base_url: &str, user_id: &str) -> Result<Self, ClientError> {
        let url = connect_url(base_url, user_id)?;
        tracing::debug!(url = %url, "connecting");
        let (stream, _response) = connect_async(url.as_str())
            .await
            .map_err(|source| ClientError::Connect { url, source })?;
        let (mut sink, mut source) = stream.split();

        let (in_tx, incoming) = mpsc::unbounded_channel();
        let (outgoing, mut out_rx) = mpsc::unbounded_channel::<ClientEvent>();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    frame = source.next() => match frame {
                        Some(Ok(Message::Text(text))) => {
                            match serde_json::from_str::<ServerEvent>(text.as_str()) {
                                Ok(event) => {
                                    tracing::trace!(event = event.name(), "received");
                                    if in_tx.send(event).is_err() {
                                        break;
                                    }
                                }
                                Err(e) => tracing::warn!(error = %e, "undecodable frame"),
                            }
                        }
                        Some(Ok(Message::Close(frame))) => {
                            tracing::info!(?frame, "server closed the connection");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::error!(error = %e, "websocket error");
                            break;
                        }
                        None => break,
                    },
                    event = out_rx.recv() => {
                        let Some(event) = event else {
                            let _ = sink.close().await;
                            break;
                        };
                        let frame = match serde_json::to_string(&event) {
                            Ok(frame) => frame,
                            Err(e) => {
                                tracing::error!(event = event.name(), error = %e, "failed to serialize event");
                                continue;
                            }
                        };
                        if let Err(e) = sink.send(Message::Text(frame.into())).await {
                            tracing::error!(error = %e, "failed to send frame");
                            break;
                        }
                    }
                }
            }
        });

        Ok(Self {
            outgoing,
            incoming,
            task,
        })
    }

    pub fn send(&self, event: ClientEvent) -> Result<(), ClientError> {
        self.outgoing.send(event).map_err(|_| ClientError::Closed)
    }

    pub fn send_all(&self, events: impl IntoIterator<Item = ClientEvent>) -> Result<(), ClientError> {
        events.into_iter().try_for_each(|event| self.send(event))
    }

    /// Next server event, or `None` once the socket is gone
    pub async fn recv(&mut self) -> Option<ServerEvent> {
        self.incoming.recv().await
    }

    /// Flush queued events and close the socket.
    pub async fn close(self) {
        let Self { outgoing, task, .. } = self;
        drop(outgoing);
        let _ = task.await;
    }
}

/// Append the `userId` query parameter to `base_url`.
pub fn connect_url(base_url: &str, user_id: &str) -> Result<String, ClientError> {
    let mut url = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })?;
    url.query_pairs_mut().append_pair("userId", user_id);
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_url() {
        // テスト項目: 接続 URL に userId クエリが付与される
        // when (操作):
        let plain = connect_url("ws://127.0.0.1:5001/ws", "alice").unwrap();
        let with_query = connect_url("ws://host/ws?v=1", "bob").unwrap();

        // then (期待する結果):
        assert_eq!(plain, "ws://127.0.0.1:5001/ws?userId=alice");
        assert_eq!(with_query, "ws://host/ws?v=1&userId=bob");
    }

    #[test]
    fn test_connect_url_encodes_user_id() {
        // テスト項目: ユーザー ID の予約文字はパーセントエンコードされる
        // when (操作):
        let url = connect_url("ws://host/ws", "a b&c").unwrap();

        // then (期待する結果):
        assert_eq!(url, "ws://host/ws?userId=a+b%26c");
    }

    #[test]
    fn test_connect_url_rejects_invalid_base() {
        // テスト項目: 解釈できないベース URL はエラーになる
        // when (操作):
        let result = connect_url("not a url", "alice");

        // then (期待する結果):
        assert!(matches!(result, Err(ClientError::InvalidUrl { .. })));
    }
}
