//! Raw socket fallback channel.
//!
//! A single WebSocket to `/api/socket` that exchanges JSON frames
//! (`{type, ...fields}`) outside of the pub/sub bridge. After any close,
//! including a failed connect, exactly one reconnect is scheduled
//! [`RECONNECT_DELAY`] later. There is no backoff and no attempt limit; the
//! loop only stops through [`SocketFallback::shutdown`] or by dropping the
//! handle.

pub mod connector;

use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use tokio::{sync::mpsc, task::JoinHandle};
use turup_shared::dto::SocketFrame;

pub use connector::{SocketConnector, SocketStream, TungsteniteConnector};
pub use crate::endpoint::socket_url;

/// Fixed delay between a close and the next connection attempt
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Sender into the currently open connection, if any
type Outbound = Arc<Mutex<Option<mpsc::UnboundedSender<String>>>>;

/// Handle to the background connection loop
pub struct SocketFallback {
    url: String,
    outbound: Outbound,
    connects: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl SocketFallback {
    /// Start connecting to `url` in the background.
    ///
    /// Inbound frames that parse as [`SocketFrame`] are forwarded to the
    /// returned receiver across reconnects.
    pub fn start(
        connector: Arc<dyn SocketConnector>,
        url: impl Into<String>,
        reconnect_delay: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<SocketFrame>) {
        let url = url.into();
        let outbound: Outbound = Arc::new(Mutex::new(None));
        let connects = Arc::new(AtomicUsize::new(0));
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(connection_loop(
            connector,
            url.clone(),
            reconnect_delay,
            outbound.clone(),
            connects.clone(),
            inbound_tx,
        ));

        let fallback = Self {
            url,
            outbound,
            connects,
            task,
        };
        (fallback, inbound_rx)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_open(&self) -> bool {
        lock(&self.outbound).is_some()
    }

    /// Queue `frame` on the open socket.
    ///
    /// Returns `false` without doing anything when the socket is not open.
    pub fn send_message(&self, frame: &SocketFrame) -> bool {
        let guard = lock(&self.outbound);
        let Some(tx) = guard.as_ref() else {
            tracing::debug!("Socket not open, dropping '{}' frame", frame.r#type);
            return false;
        };

        match serde_json::to_string(frame) {
            Ok(text) => tx.send(text).is_ok(),
            Err(e) => {
                tracing::warn!("Failed to serialize socket frame: {}", e);
                false
            }
        }
    }

    /// Number of connection attempts made so far
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Stop the connection loop, including any pending reconnect
    pub fn shutdown(&self) {
        self.task.abort();
        lock(&self.outbound).take();
        tracing::debug!("Socket fallback to {} shut down", self.url);
    }
}

impl Drop for SocketFallback {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn lock(outbound: &Outbound) -> MutexGuard<'_, Option<mpsc::UnboundedSender<String>>> {
    outbound.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn connection_loop(
    connector: Arc<dyn SocketConnector>,
    url: String,
    reconnect_delay: Duration,
    outbound: Outbound,
    connects: Arc<AtomicUsize>,
    inbound_tx: mpsc::UnboundedSender<SocketFrame>,
) {
    loop {
        let attempt = connects.fetch_add(1, Ordering::SeqCst) + 1;
        match connector.connect(&url).await {
            Ok(stream) => {
                tracing::info!("Socket connected to {} (attempt {})", url, attempt);
                run_connection(stream, &outbound, &inbound_tx).await;
                tracing::info!("Socket to {} closed", url);
            }
            Err(e) => {
                tracing::warn!("Socket connection to {} failed: {}", url, e);
            }
        }

        tracing::info!("Reconnecting socket in {:?}", reconnect_delay);
        tokio::time::sleep(reconnect_delay).await;
    }
}

/// Pump one connection until it closes
async fn run_connection(
    mut stream: Box<dyn SocketStream>,
    outbound: &Outbound,
    inbound_tx: &mpsc::UnboundedSender<SocketFrame>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    lock(outbound).replace(tx);

    loop {
        tokio::select! {
            Some(text) = rx.recv() => {
                if let Err(e) = stream.send(text).await {
                    tracing::warn!("Socket send failed: {}", e);
                    break;
                }
            }
            incoming = stream.recv() => {
                match incoming {
                    Some(Ok(text)) => match serde_json::from_str::<SocketFrame>(&text) {
                        Ok(frame) => {
                            // receiver may have been dropped; keep the socket alive regardless
                            let _ = inbound_tx.send(frame);
                        }
                        Err(e) => tracing::warn!("Ignoring malformed socket frame: {}", e),
                    },
                    Some(Err(e)) => {
                        tracing::warn!("Socket receive failed: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    lock(outbound).take();
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::connector::testing::{FakeConnector, stream_pair};
    use super::*;

    const URL: &str = "ws://localhost:3000/api/socket";

    #[tokio::test(start_paused = true)]
    async fn test_failed_connect_retries_once_per_delay() {
        // テスト項目: 接続失敗後、5 秒ごとにちょうど 1 回再接続が試みられる
        // given (前提条件):
        let connector = Arc::new(FakeConnector::default());
        let (fallback, _inbound) = SocketFallback::start(connector.clone(), URL, RECONNECT_DELAY);

        // when (操作):
        tokio::time::sleep(Duration::from_millis(4_900)).await;
        let before_delay = fallback.connect_count();
        tokio::time::sleep(Duration::from_millis(200)).await;
        let after_delay = fallback.connect_count();
        tokio::time::sleep(Duration::from_secs(10)).await;
        let after_three_delays = fallback.connect_count();

        // then (期待する結果):
        assert_eq!(before_delay, 1);
        assert_eq!(after_delay, 2);
        assert_eq!(after_three_delays, 4);
        assert!(connector.attempts().iter().all(|url| url == URL));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_message_while_closed_is_noop() {
        // テスト項目: ソケットが開いていない間の送信は false を返し何もしない
        // given (前提条件):
        let connector = Arc::new(FakeConnector::default());
        let (fallback, _inbound) = SocketFallback::start(connector, URL, RECONNECT_DELAY);
        tokio::time::sleep(Duration::from_millis(10)).await;

        // when (操作):
        let sent = fallback.send_message(&SocketFrame::new("ping"));

        // then (期待する結果):
        assert!(!sent);
        assert!(!fallback.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_frames_flow_both_ways_while_open() {
        // テスト項目: 接続中は送信フレームが届き、受信フレームが転送される
        // given (前提条件):
        let connector = Arc::new(FakeConnector::default());
        let (stream, mut peer) = stream_pair();
        connector.push(stream);
        let (fallback, mut inbound) = SocketFallback::start(connector, URL, RECONNECT_DELAY);
        tokio::time::sleep(Duration::from_millis(10)).await;

        // when (操作):
        let sent = fallback.send_message(&SocketFrame::new("play_card").with_field("card", json!("AS")));
        peer.to_client
            .send(r#"{"type":"trick_won","team":1}"#.to_string())
            .unwrap();
        peer.to_client.send("not json".to_string()).unwrap();

        // then (期待する結果):
        assert!(sent);
        let outgoing: serde_json::Value =
            serde_json::from_str(&peer.from_client.recv().await.unwrap()).unwrap();
        assert_eq!(outgoing, json!({"type": "play_card", "card": "AS"}));
        let frame = inbound.recv().await.unwrap();
        assert_eq!(frame.r#type, "trick_won");
        assert_eq!(frame.fields.get("team"), Some(&json!(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_schedules_single_reconnect() {
        // テスト項目: 接続が閉じられると 5 秒後に 1 回だけ再接続される
        // given (前提条件):
        let connector = Arc::new(FakeConnector::default());
        let (first, first_peer) = stream_pair();
        let (second, _second_peer) = stream_pair();
        connector.push(first);
        connector.push(second);
        let (fallback, _inbound) = SocketFallback::start(connector, URL, RECONNECT_DELAY);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(fallback.is_open());

        // when (操作):
        drop(first_peer);
        tokio::time::sleep(Duration::from_millis(10)).await;
        let closed_open = fallback.is_open();
        let closed_count = fallback.connect_count();
        tokio::time::sleep(RECONNECT_DELAY).await;

        // then (期待する結果):
        assert!(!closed_open);
        assert_eq!(closed_count, 1);
        assert_eq!(fallback.connect_count(), 2);
        assert!(fallback.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_reconnect() {
        // テスト項目: shutdown 後は再接続が行われない
        // given (前提条件):
        let connector = Arc::new(FakeConnector::default());
        let (fallback, _inbound) = SocketFallback::start(connector, URL, RECONNECT_DELAY);
        tokio::time::sleep(Duration::from_millis(10)).await;

        // when (操作):
        fallback.shutdown();
        tokio::time::sleep(RECONNECT_DELAY * 3).await;

        // then (期待する結果):
        assert_eq!(fallback.connect_count(), 1);
        assert!(!fallback.send_message(&SocketFrame::new("ping")));
    }
}
