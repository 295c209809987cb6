//! InMemory User Repository

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{RepositoryError, User, UserId, UserRepository};

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Option<User> {
        self.users.lock().await.get(id).cloned()
    }

    async fn find_by_external_id(&self, external_id: &str) -> Option<User> {
        self.users
            .lock()
            .await
            .values()
            .find(|u| u.external_id.as_deref() == Some(external_id))
            .cloned()
    }

    async fn insert(&self, user: User) -> Result<(), RepositoryError> {
        let mut users = self.users.lock().await;
        if users.contains_key(&user.id) {
            return Err(RepositoryError::AlreadyExists(user.id.into_string()));
        }
        tracing::debug!("User '{}' stored", user.id.as_str());
        users.insert(user.id.clone(), user);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Timestamp;

    fn user(id: &str, external_id: Option<&str>) -> User {
        User {
            id: UserId::new(id.to_string()).unwrap(),
            external_id: external_id.map(str::to_string),
            username: id.to_string(),
            display_name: None,
            email: None,
            created_at: Timestamp::new(1000),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_by_id() {
        // テスト項目: 追加したユーザーを ID で取得できる
        // given (前提条件):
        let repo = InMemoryUserRepository::new();
        repo.insert(user("alice", None)).await.unwrap();

        // when (操作):
        let found = repo
            .find_by_id(&UserId::new("alice".to_string()).unwrap())
            .await;

        // then (期待する結果):
        assert_eq!(found.map(|u| u.username), Some("alice".to_string()));
    }

    #[tokio::test]
    async fn test_find_by_external_id() {
        // テスト項目: 外部 ID でユーザーを取得できる
        // given (前提条件):
        let repo = InMemoryUserRepository::new();
        repo.insert(user("alice", Some("oauth|42"))).await.unwrap();

        // when (操作):
        let found = repo.find_by_external_id("oauth|42").await;
        let missing = repo.find_by_external_id("oauth|43").await;

        // then (期待する結果):
        assert!(found.is_some());
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_insert_duplicate_id_fails() {
        // テスト項目: 同じ ID のユーザーは追加できない
        // given (前提条件):
        let repo = InMemoryUserRepository::new();
        repo.insert(user("alice", None)).await.unwrap();

        // when (操作):
        let result = repo.insert(user("alice", None)).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RepositoryError::AlreadyExists("alice".to_string()))
        );
    }
}
