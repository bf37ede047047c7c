//! UseCase: ユーザー接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectUserUseCase::authorize() / execute() / build_online_users()
//! - 接続要求の userId 検証と、在席レジストリへの登録
//!
//! ### なぜこのテストが必要か
//! - 未登録ユーザー・BAN 済みユーザーの接続を拒否できることを保証
//! - 同一ユーザーの再接続でハンドルが置き換わることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：登録済みユーザーの接続
//! - 異常系：userId なし、未登録ユーザー、BAN 済みユーザー
//! - エッジケース：同じユーザーが二つ目の接続を開く

use std::sync::Arc;

use crate::{
    domain::{IdentityVerifier, UserId},
    infrastructure::{
        dto::websocket::{OnlineUsersPayload, ServerEvent},
        realtime::{ConnectOutcome, ConnectionHandle, ConnectionHub},
    },
};

use super::error::ConnectError;

/// ユーザー接続のユースケース
pub struct ConnectUserUseCase {
    identity: Arc<dyn IdentityVerifier>,
    hub: Arc<ConnectionHub>,
}

impl ConnectUserUseCase {
    /// 新しい ConnectUserUseCase を作成
    pub fn new(identity: Arc<dyn IdentityVerifier>, hub: Arc<ConnectionHub>) -> Self {
        Self { identity, hub }
    }

    /// WebSocket アップグレード前に接続要求の userId を検証する
    ///
    /// # Returns
    ///
    /// * `Ok(UserId)` - 接続を許可するユーザー
    /// * `Err(ConnectError)` - userId なし、または ID 基盤が拒否
    pub async fn authorize(&self, user_id: Option<&str>) -> Result<UserId, ConnectError> {
        let user_id = user_id
            .filter(|id| !id.is_empty())
            .ok_or(ConnectError::MissingUserId)?;
        Ok(self.identity.resolve_user(user_id).await?)
    }

    /// 接続をユーザーの現在のハンドルとして登録する
    ///
    /// 全接続へ `userStatus: online` がブロードキャストされます。
    pub async fn execute(&self, user: &UserId, handle: ConnectionHandle) -> ConnectOutcome {
        let connection = handle.id();
        let outcome = self.hub.connect(user, handle).await;
        tracing::info!(user_id = %user, connection = %connection, "user connected");
        outcome
    }

    /// オンラインユーザー一覧イベントを構築（ソート済み）
    pub async fn build_online_users(&self) -> ServerEvent {
        let users = self
            .hub
            .online_users()
            .await
            .into_iter()
            .map(UserId::into_string)
            .collect();
        ServerEvent::OnlineUsers(OnlineUsersPayload { users })
    }
}
