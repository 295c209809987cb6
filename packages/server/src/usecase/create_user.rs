//! UseCase: create a user

use std::sync::Arc;

use turup_shared::time::Clock;

use crate::domain::{RepositoryError, Timestamp, User, UserId, UserRepository};

use super::error::CreateUserError;

/// Input of [`CreateUserUseCase::execute`]
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub id: Option<String>,
    pub external_id: Option<String>,
    pub username: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

pub struct CreateUserUseCase {
    repository: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl CreateUserUseCase {
    pub fn new(repository: Arc<dyn UserRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Create and store a user. The id is generated when not supplied.
    pub async fn execute(&self, new_user: NewUser) -> Result<User, CreateUserError> {
        let username = new_user.username.trim().to_string();
        if username.is_empty() {
            return Err(CreateUserError::EmptyUsername);
        }

        let id = match new_user.id {
            Some(raw) => UserId::new(raw).map_err(CreateUserError::InvalidUserId)?,
            None => UserId::generate(),
        };

        let user = User {
            id,
            external_id: non_empty(new_user.external_id),
            username,
            display_name: non_empty(new_user.display_name),
            email: non_empty(new_user.email),
            created_at: Timestamp::new(self.clock.now_millis()),
        };

        self.repository
            .insert(user.clone())
            .await
            .map_err(|e| match e {
                RepositoryError::AlreadyExists(id) | RepositoryError::NotFound(id) => {
                    CreateUserError::AlreadyExists(id)
                }
            })?;

        tracing::info!("User '{}' created", user.id.as_str());
        Ok(user)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
