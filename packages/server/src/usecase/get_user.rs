//! UseCase: look up a user
//!
//! The id in the path may be either the primary id or the id issued by the
//! external identity provider. The primary id is tried first.

use std::sync::Arc;

use crate::domain::{User, UserId, UserRepository};

use super::error::GetUserError;

pub struct GetUserUseCase {
    repository: Arc<dyn UserRepository>,
}

impl GetUserUseCase {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, id: String) -> Result<User, GetUserError> {
        if let Ok(user_id) = UserId::new(id.clone())
            && let Some(user) = self.repository.find_by_id(&user_id).await
        {
            return Ok(user);
        }

        if let Some(user) = self.repository.find_by_external_id(&id).await {
            tracing::debug!("User '{}' resolved through external id", user.id.as_str());
            return Ok(user);
        }

        Err(GetUserError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Timestamp, repository::MockUserRepository};
    use mockall::predicate::{eq, function};

    fn user(id: &str) -> User {
        User {
            id: UserId::new(id.to_string()).unwrap(),
            external_id: Some(format!("ext-{}", id)),
            username: id.to_string(),
            display_name: None,
            email: None,
            created_at: Timestamp::new(1000),
        }
    }

    #[tokio::test]
    async fn test_execute_finds_by_primary_id() {
        // テスト項目: 主 ID で見つかった場合は外部 ID を参照しない
        // given (前提条件):
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .with(eq(UserId::new("alice".to_string()).unwrap()))
            .times(1)
            .returning(|_| Some(user("alice")));
        repo.expect_find_by_external_id().times(0);
        let usecase = GetUserUseCase::new(Arc::new(repo));

        // when (操作):
        let result = usecase.execute("alice".to_string()).await;

        // then (期待する結果):
        assert_eq!(result.map(|u| u.username), Ok("alice".to_string()));
    }

    #[tokio::test]
    async fn test_execute_falls_back_to_external_id() {
        // テスト項目: 主 ID で見つからない場合は外部 ID で検索する
        // given (前提条件):
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().times(1).returning(|_| None);
        repo.expect_find_by_external_id()
            .with(function(|id: &str| id == "ext-alice"))
            .times(1)
            .returning(|_| Some(user("alice")));
        let usecase = GetUserUseCase::new(Arc::new(repo));

        // when (操作):
        let result = usecase.execute("ext-alice".to_string()).await;

        // then (期待する結果):
        assert_eq!(result.map(|u| u.id.into_string()), Ok("alice".to_string()));
    }

    #[tokio::test]
    async fn test_execute_not_found() {
        // テスト項目: どちらの ID でも見つからない場合は NotFound
        // given (前提条件):
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|_| None);
        repo.expect_find_by_external_id().returning(|_| None);
        let usecase = GetUserUseCase::new(Arc::new(repo));

        // when (操作):
        let result = usecase.execute("ghost".to_string()).await;

        // then (期待する結果):
        assert_eq!(result, Err(GetUserError::NotFound("ghost".to_string())));
    }
}
