//! Secondary HTTP write of every published message.

use async_trait::async_trait;
use reqwest::Url;
use turup_shared::dto::BroadcastMessage;

use crate::{endpoint::fallback_url, error::ClientError};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FallbackSink: Send + Sync {
    /// Deliver `message` out of band. Only success or failure matters.
    async fn post(&self, message: &BroadcastMessage) -> Result<(), ClientError>;
}

/// `POST {base}/api/realtime` with the message as JSON body
#[derive(Debug, Clone)]
pub struct HttpFallback {
    client: reqwest::Client,
    url: Url,
}

impl HttpFallback {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self::with_client(reqwest::Client::new(), fallback_url(base_url)?))
    }

    pub fn with_client(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl FallbackSink for HttpFallback {
    async fn post(&self, message: &BroadcastMessage) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(ClientError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        })
    }
}
