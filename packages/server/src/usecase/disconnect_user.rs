//! UseCase: ユーザー切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectUserUseCase::execute() / announce_offline()
//! - 切断時のルーム退出と、猶予期間後の offline 通知
//!
//! ### なぜこのテストが必要か
//! - 猶予期間内の再接続で offline が通知されないことを保証
//! - 他人の offline を宣言できないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：切断後に猶予期間を経て offline が通知される
//! - 異常系：他ユーザーの userOffline 宣言
//! - エッジケース：明示的な userOffline の後の切断

use std::sync::Arc;

use crate::{
    domain::UserId,
    infrastructure::realtime::{ConnectionHub, ConnectionId, DisconnectOutcome},
};

/// ユーザー切断のユースケース
pub struct DisconnectUserUseCase {
    hub: Arc<ConnectionHub>,
}

impl DisconnectUserUseCase {
    /// 新しい DisconnectUserUseCase を作成
    pub fn new(hub: Arc<ConnectionHub>) -> Self {
        Self { hub }
    }

    /// 接続の終了を処理する
    ///
    /// 接続は全ルームから退出し、現在のハンドルであれば猶予期間後に
    /// `userStatus: offline` がブロードキャストされます。
    pub async fn execute(&self, connection: ConnectionId) -> DisconnectOutcome {
        let outcome = self.hub.disconnect(connection).await;
        match &outcome {
            DisconnectOutcome::OfflineScheduled(user) => {
                tracing::info!(user_id = %user, connection = %connection, "user disconnected");
            }
            DisconnectOutcome::AlreadyAnnounced(user) => {
                tracing::debug!(user_id = %user, connection = %connection, "disconnected after offline announcement");
            }
            DisconnectOutcome::NotRegistered => {
                tracing::debug!(connection = %connection, "stale connection closed");
            }
        }
        outcome
    }

    /// クライアントからの明示的な offline 宣言を処理する
    ///
    /// 接続のユーザー自身についての宣言だけを受け付けます。
    pub async fn announce_offline(&self, connection_user: &UserId, requested: &str) -> bool {
        if connection_user.as_str() != requested {
            tracing::warn!(
                user_id = %connection_user,
                requested,
                "ignored offline announcement for another user"
            );
            return false;
        }
        self.hub.announce_offline(connection_user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        infrastructure::dto::websocket::{PresenceStatus, ServerEvent, UserStatusPayload},
        usecase::test_support::{Fixture, GRACE, user},
    };

    fn offline(id: &str) -> ServerEvent {
        ServerEvent::UserStatus(UserStatusPayload {
            user_id: id.to_string(),
            status: PresenceStatus::Offline,
        })
    }

    #[tokio::test]
    async fn test_disconnect_broadcasts_offline_after_grace() {
        // テスト項目: 切断後、猶予期間を過ぎると offline が通知される
        // given (前提条件):
        let fixture = Fixture::new();
        let usecase = DisconnectUserUseCase::new(fixture.hub.clone());
        let (alice, _alice_inbox) = fixture.connect("alice").await;
        let (_bob, mut bob_inbox) = fixture.connect("bob").await;

        // when (操作):
        let outcome = usecase.execute(alice.id()).await;
        let before_grace = bob_inbox.drain();
        tokio::time::sleep(GRACE * 3).await;

        // then (期待する結果):
        assert_eq!(outcome, DisconnectOutcome::OfflineScheduled(user("alice")));
        assert!(before_grace.is_empty());
        assert_eq!(bob_inbox.drain(), vec![offline("alice")]);
        assert!(!fixture.hub.is_online(&user("alice")).await);
    }

    #[tokio::test]
    async fn test_announce_offline_only_for_own_user() {
        // テスト項目: 自分以外のユーザーの offline 宣言は無視される
        // given (前提条件):
        let fixture = Fixture::new();
        let usecase = DisconnectUserUseCase::new(fixture.hub.clone());
        let (_alice, _alice_inbox) = fixture.connect("alice").await;
        let (_bob, mut bob_inbox) = fixture.connect("bob").await;

        // when (操作):
        let forged = usecase.announce_offline(&user("bob"), "alice").await;
        let own = usecase.announce_offline(&user("alice"), "alice").await;

        // then (期待する結果):
        assert!(!forged);
        assert!(own);
        assert_eq!(bob_inbox.drain(), vec![offline("alice")]);
    }

    #[tokio::test]
    async fn test_disconnect_after_announcement_is_silent() {
        // テスト項目: offline 宣言後の切断では offline が再通知されない
        // given (前提条件):
        let fixture = Fixture::new();
        let usecase = DisconnectUserUseCase::new(fixture.hub.clone());
        let (alice, _alice_inbox) = fixture.connect("alice").await;
        let (_bob, mut bob_inbox) = fixture.connect("bob").await;
        usecase.announce_offline(&user("alice"), "alice").await;
        bob_inbox.drain();

        // when (操作):
        let outcome = usecase.execute(alice.id()).await;
        tokio::time::sleep(GRACE * 3).await;

        // then (期待する結果):
        assert_eq!(outcome, DisconnectOutcome::AlreadyAnnounced(user("alice")));
        assert!(bob_inbox.drain().is_empty());
    }
}
