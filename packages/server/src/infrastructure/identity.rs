//! In-process identity service.
//!
//! Maps opaque bearer tokens to users and consults the user repository for
//! existence and ban status. Stands in for the external token service.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;

use crate::domain::{IdentityError, IdentityVerifier, UserId, UserRepository};

pub struct InMemoryIdentityVerifier {
    tokens: HashMap<String, UserId>,
    users: Arc<dyn UserRepository>,
}

impl InMemoryIdentityVerifier {
    pub fn new(tokens: HashMap<String, UserId>, users: Arc<dyn UserRepository>) -> Self {
        Self { tokens, users }
    }

    async fn ensure_active(&self, user_id: UserId) -> Result<UserId, IdentityError> {
        let profile = self
            .users
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| IdentityError::UnknownUser(user_id.to_string()))?;

        if profile.banned {
            return Err(IdentityError::Banned {
                user_id: user_id.to_string(),
                reason: profile
                    .ban_reason
                    .unwrap_or_else(|| "No reason specified".to_string()),
            });
        }
        Ok(user_id)
    }
}

#[async_trait]
impl IdentityVerifier for InMemoryIdentityVerifier {
    async fn verify_token(&self, token: &str) -> Result<UserId, IdentityError> {
        if token.is_empty() {
            return Err(IdentityError::MissingCredential);
        }
        let user_id = self
            .tokens
            .get(token)
            .cloned()
            .ok_or(IdentityError::InvalidCredential)?;
        self.ensure_active(user_id).await
    }

    async fn resolve_user(&self, user_id: &str) -> Result<UserId, IdentityError> {
        if user_id.is_empty() {
            return Err(IdentityError::MissingCredential);
        }
        let user_id =
            UserId::new(user_id.to_string()).map_err(|_| IdentityError::InvalidCredential)?;
        self.ensure_active(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::UserProfile, infrastructure::repository::InMemoryUserRepository};

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    fn verifier() -> InMemoryIdentityVerifier {
        let mut banned = UserProfile::new(user("u3"), "Banned", None);
        banned.banned = true;
        banned.ban_reason = Some("spam".to_string());
        let users = Arc::new(InMemoryUserRepository::with_users([
            UserProfile::new(user("u1"), "Aiko", None),
            banned,
        ]));
        let tokens = HashMap::from([
            ("t1".to_string(), user("u1")),
            ("t3".to_string(), user("u3")),
            ("ghost".to_string(), user("u9")),
        ]);
        InMemoryIdentityVerifier::new(tokens, users)
    }

    #[tokio::test]
    async fn test_verify_token_success() {
        // テスト項目: 有効なトークンからユーザー ID が得られる
        // when (操作):
        let result = verifier().verify_token("t1").await;

        // then (期待する結果):
        assert_eq!(result, Ok(user("u1")));
    }

    #[tokio::test]
    async fn test_verify_token_rejections() {
        // テスト項目: 空・不明・存在しないユーザー・BAN 済みのトークンは拒否される
        // given (前提条件):
        let verifier = verifier();

        // then (期待する結果):
        assert_eq!(
            verifier.verify_token("").await,
            Err(IdentityError::MissingCredential)
        );
        assert_eq!(
            verifier.verify_token("nope").await,
            Err(IdentityError::InvalidCredential)
        );
        assert_eq!(
            verifier.verify_token("ghost").await,
            Err(IdentityError::UnknownUser("u9".to_string()))
        );
        assert_eq!(
            verifier.verify_token("t3").await,
            Err(IdentityError::Banned {
                user_id: "u3".to_string(),
                reason: "spam".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_resolve_user() {
        // テスト項目: 接続時のユーザー ID は存在し BAN されていない場合のみ解決される
        // given (前提条件):
        let verifier = verifier();

        // then (期待する結果):
        assert_eq!(verifier.resolve_user("u1").await, Ok(user("u1")));
        assert_eq!(
            verifier.resolve_user("").await,
            Err(IdentityError::MissingCredential)
        );
        assert!(matches!(
            verifier.resolve_user("u3").await,
            Err(IdentityError::Banned { .. })
        ));
        assert_eq!(
            verifier.resolve_user("u9").await,
            Err(IdentityError::UnknownUser("u9".to_string()))
        );
    }
}
