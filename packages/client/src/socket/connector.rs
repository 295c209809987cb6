//! Text-frame WebSocket connections behind a trait.
//!
//! Both the raw socket fallback and the pub/sub hub client talk to a
//! [`SocketStream`], so they can be driven by an in-memory stream in tests.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message,
};

use crate::error::ClientError;

/// An open connection exchanging text frames
#[async_trait]
pub trait SocketStream: Send {
    async fn send(&mut self, text: String) -> Result<(), ClientError>;

    /// Next inbound text frame; `None` once the peer closed the connection
    async fn recv(&mut self) -> Option<Result<String, ClientError>>;

    async fn close(&mut self) -> Result<(), ClientError>;
}

/// Opens [`SocketStream`]s
#[async_trait]
pub trait SocketConnector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn SocketStream>, ClientError>;
}

/// `tokio-tungstenite` backed connector
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

#[async_trait]
impl SocketConnector for TungsteniteConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn SocketStream>, ClientError> {
        let (stream, response) = connect_async(url)
            .await
            .map_err(|e| ClientError::ConnectionError(e.to_string()))?;
        tracing::debug!("Connected to {} (HTTP {})", url, response.status());
        Ok(Box::new(TungsteniteStream { inner: stream }))
    }
}

struct TungsteniteStream {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl SocketStream for TungsteniteStream {
    async fn send(&mut self, text: String) -> Result<(), ClientError> {
        self.inner
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| ClientError::ConnectionError(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, ClientError>> {
        while let Some(message) = self.inner.next().await {
            match message {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_string())),
                Ok(Message::Close(_)) => return None,
                // ping/pong are answered by tungstenite itself
                Ok(_) => continue,
                Err(e) => return Some(Err(ClientError::ConnectionError(e.to_string()))),
            }
        }
        None
    }

    async fn close(&mut self) -> Result<(), ClientError> {
        self.inner
            .close(None)
            .await
            .map_err(|e| ClientError::ConnectionError(e.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory connector whose streams are fed by the test.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use tokio::sync::mpsc;

    use super::*;

    /// Test side of a [`FakeStream`]
    pub(crate) struct FakePeer {
        /// Frames pushed here arrive at the client; dropping it closes the stream
        pub to_client: mpsc::UnboundedSender<String>,
        /// Frames the client sent
        pub from_client: mpsc::UnboundedReceiver<String>,
    }

    pub(crate) struct FakeStream {
        inbound: mpsc::UnboundedReceiver<String>,
        outbound: mpsc::UnboundedSender<String>,
    }

    pub(crate) fn stream_pair() -> (FakeStream, FakePeer) {
        let (to_client, inbound) = mpsc::unbounded_channel();
        let (outbound, from_client) = mpsc::unbounded_channel();
        (
            FakeStream { inbound, outbound },
            FakePeer {
                to_client,
                from_client,
            },
        )
    }

    #[async_trait]
    impl SocketStream for FakeStream {
        async fn send(&mut self, text: String) -> Result<(), ClientError> {
            self.outbound
                .send(text)
                .map_err(|_| ClientError::ConnectionError("peer gone".to_string()))
        }

        async fn recv(&mut self) -> Option<Result<String, ClientError>> {
            self.inbound.recv().await.map(Ok)
        }

        async fn close(&mut self) -> Result<(), ClientError> {
            self.inbound.close();
            Ok(())
        }
    }

    /// Hands out queued streams, then refuses connections
    #[derive(Default)]
    pub(crate) struct FakeConnector {
        streams: Mutex<VecDeque<FakeStream>>,
        attempts: Mutex<Vec<String>>,
    }

    impl FakeConnector {
        pub(crate) fn push(&self, stream: FakeStream) {
            self.streams.lock().unwrap().push_back(stream);
        }

        pub(crate) fn attempts(&self) -> Vec<String> {
            self.attempts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SocketConnector for FakeConnector {
        async fn connect(&self, url: &str) -> Result<Box<dyn SocketStream>, ClientError> {
            self.attempts.lock().unwrap().push(url.to_string());
            match self.streams.lock().unwrap().pop_front() {
                Some(stream) => Ok(Box::new(stream)),
                None => Err(ClientError::ConnectionError("connection refused".to_string())),
            }
        }
    }
}
