//! Conversation history over the HTTP API.

use kizuna_server::infrastructure::dto::websocket::MessageDto;

use crate::error::ClientError;

pub struct HistoryClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl HistoryClient {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    pub fn url_for(&self, peer: &str) -> String {
        format!("{}/api/messages/{peer}", self.api_url)
    }

    /// `GET /api/messages/{peer}`. The server marks the returned messages
    /// from `peer` as read.
    pub async fn fetch(&self, peer: &str) -> Result<Vec<MessageDto>, ClientError> {
        let messages = self
            .http
            .get(self.url_for(peer))
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<MessageDto>>()
            .await?;
        tracing::debug!(peer, count = messages.len(), "history loaded");
        Ok(messages)
    }
}
