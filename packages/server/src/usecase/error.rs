//! UseCase errors.

use thiserror::Error;

use crate::domain::{MessagePushError, RepositoryError, ValueObjectError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetUserError {
    #[error("User '{0}' not found")]
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreateUserError {
    #[error("Invalid user id: {0}")]
    InvalidUserId(ValueObjectError),

    #[error("Username must not be empty")]
    EmptyUsername,

    #[error("User '{0}' already exists")]
    AlreadyExists(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("Invalid identifier: {0}")]
    InvalidId(ValueObjectError),

    #[error("Player name must not be empty")]
    EmptyName,

    #[error("Room '{0}' not found")]
    NotFound(String),

    #[error("Room is full ({0} players)")]
    RoomFull(usize),

    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RealtimeEventError {
    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    #[error("Invalid topic: {0}")]
    InvalidTopic(ValueObjectError),

    #[error("Connection is not subscribed to '{0}'")]
    NotSubscribed(String),

    #[error("Failed to encode frame: {0}")]
    Encode(String),

    #[error("Push failed: {0}")]
    Push(MessagePushError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("Invalid socket frame: {0}")]
    InvalidFrame(String),

    #[error("Push failed: {0}")]
    Push(MessagePushError),
}
