//! Error types for the client.

use thiserror::Error;
use turup_shared::config::ConfigError;

/// Client-side errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Could not open or keep a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The provider rejected or never acknowledged a subscription
    #[error("Subscription to '{topic}' failed: {reason}")]
    SubscriptionFailed { topic: String, reason: String },

    /// Publishing on an open channel failed
    #[error("Publish failed: {0}")]
    PublishFailed(String),

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// The server answered with an unexpected status
    #[error("Unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
