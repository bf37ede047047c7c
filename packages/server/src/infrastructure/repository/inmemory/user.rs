//! InMemory User Repository 実装

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{RepositoryError, UserId, UserProfile, UserRepository};

/// インメモリ User Repository 実装
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, UserProfile>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 初期ユーザーを登録した Repository を作成
    pub fn with_users(users: impl IntoIterator<Item = UserProfile>) -> Self {
        Self {
            users: RwLock::new(users.into_iter().map(|u| (u.id.clone(), u)).collect()),
        }
    }

    /// ユーザーを登録（同じ ID があれば上書き）
    pub async fn insert(&self, user: UserProfile) {
        self.users.write().await.insert(user.id.clone(), user);
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserProfile>, RepositoryError> {
        Ok(self.users.read().await.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_find_registered_user() {
        // テスト項目: 登録済みユーザーを取得でき、未登録は None になる
        // given (前提条件):
        let repo = InMemoryUserRepository::with_users([UserProfile::new(user("u1"), "Aiko", None)]);

        // when (操作):
        let found = repo.find_by_id(&user("u1")).await.unwrap();
        let missing = repo.find_by_id(&user("u9")).await.unwrap();

        // then (期待する結果):
        assert_eq!(found.unwrap().name, "Aiko");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_insert_overwrites() {
        // テスト項目: 同じ ID で登録すると上書きされる
        // given (前提条件):
        let repo = InMemoryUserRepository::new();
        repo.insert(UserProfile::new(user("u1"), "Old", None)).await;

        // when (操作):
        repo.insert(UserProfile::new(user("u1"), "New", None)).await;

        // then (期待する結果):
        let found = repo.find_by_id(&user("u1")).await.unwrap().unwrap();
        assert_eq!(found.name, "New");
    }
}
