//! WebSocket connection handlers.
//!
//! - `/realtime`: pub/sub hub speaking `HubFrame`
//! - `/api/socket`: raw JSON frame relay

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use serde::Deserialize;
use tokio::sync::mpsc;
use turup_shared::dto::HubFrame;

use crate::{domain::ConnectionId, ui::state::AppState};

/// Query parameters for hub connections
#[derive(Debug, Deserialize)]
pub struct HubQuery {
    pub apikey: Option<String>,
}

pub async fn hub_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<HubQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    if let Some(expected) = &state.api_key
        && query.apikey.as_deref() != Some(expected.as_str())
    {
        tracing::warn!("Rejecting hub connection with missing or invalid api key");
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(ws.on_upgrade(move |socket| handle_hub_socket(socket, state)))
}

pub async fn socket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_raw_socket(socket, state))
}

/// Drain the connection's outbound channel into its WebSocket sink.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_hub_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = ConnectionId::generate();
    let (sender, mut receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel();

    let hub = state.realtime_hub_usecase.clone();
    hub.connect(connection_id, tx).await;
    tracing::info!("Hub connection '{}' opened", connection_id);

    let hub_for_recv = hub.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("Hub WebSocket error on '{}': {}", connection_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    let frame = match serde_json::from_str::<HubFrame>(&text) {
                        Ok(frame) => frame,
                        Err(e) => {
                            tracing::warn!("Ignoring malformed hub frame: {}", e);
                            continue;
                        }
                    };
                    handle_hub_frame(&hub_for_recv, connection_id, frame).await;
                }
                Message::Close(_) => {
                    tracing::info!("Hub connection '{}' requested close", connection_id);
                    break;
                }
                _ => {}
            }
        }
    });

    let mut send_task = pusher_loop(rx, sender);

    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    let left = hub.disconnect(connection_id).await;
    tracing::info!(
        "Hub connection '{}' closed, left {} topic(s)",
        connection_id,
        left.len()
    );
}

async fn handle_hub_frame(
    hub: &crate::usecase::RealtimeHubUseCase,
    connection_id: ConnectionId,
    frame: HubFrame,
) {
    match frame {
        HubFrame::Join { topic } => {
            if let Err(e) = hub.join(connection_id, topic.clone()).await {
                tracing::warn!("Join of '{}' failed: {}", topic, e);
                hub.reject(connection_id, topic, e.to_string()).await;
            }
        }
        HubFrame::Leave { topic } => {
            if let Err(e) = hub.leave(connection_id, topic.clone()).await {
                hub.reject(connection_id, topic, e.to_string()).await;
            }
        }
        HubFrame::Broadcast { topic, envelope } => {
            if let Err(e) = hub.publish(connection_id, topic.clone(), envelope).await {
                tracing::warn!("Publish on '{}' failed: {}", topic, e);
                hub.reject(connection_id, topic, e.to_string()).await;
            }
        }
        HubFrame::Joined { topic } | HubFrame::Error { topic, .. } => {
            tracing::debug!("Ignoring server-only frame from client on '{}'", topic);
        }
    }
}

async fn handle_raw_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = ConnectionId::generate();
    let (sender, mut receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel();

    let relay = state.socket_relay_usecase.clone();
    relay.connect(connection_id, tx).await;
    tracing::info!("Socket connection '{}' opened", connection_id);

    let relay_for_recv = relay.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if let Err(e) = relay_for_recv.relay(connection_id, &text).await {
                        tracing::warn!("Dropping socket frame from '{}': {}", connection_id, e);
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Socket error on '{}': {}", connection_id, e);
                    break;
                }
            }
        }
    });

    let mut send_task = pusher_loop(rx, sender);

    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    relay.disconnect(connection_id).await;
    tracing::info!("Socket connection '{}' closed", connection_id);
}
