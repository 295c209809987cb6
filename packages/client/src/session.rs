//! Interactive room session.

use std::sync::Arc;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use serde_json::{Value, json};
use tokio::sync::{broadcast, mpsc};
use turup_shared::dto::{BroadcastMessage, SocketFrame};

use crate::{
    api::BackendClient,
    bots::{VoteSchedule, trump_vote},
    domain::{Identity, Player, Suit},
    error::ClientError,
    host::resolve_host,
    realtime::RoomChannel,
    socket::SocketFallback,
};

use super::{formatter::MessageFormatter, ui::print_above_prompt};

/// Message type announcing that trump voting is over
pub const VOTING_COMPLETE_EVENT: &str = "voting_complete";
pub const GAME_STATE_EVENT: &str = "game_state";
pub const CHAT_EVENT: &str = "chat";

/// A line typed by the user
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Chat(String),
    Vote(Suit),
    State(Value),
    Raw(SocketFrame),
    Room,
    Quit,
}

/// Parse an input line; `Err` carries a usage hint
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    if !line.starts_with('/') {
        return Ok(Command::Chat(line.to_string()));
    }

    let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    match name {
        "/vote" => Suit::parse(rest)
            .map(Command::Vote)
            .ok_or_else(|| "usage: /vote <hearts|diamonds|clubs|spades>".to_string()),
        "/state" => serde_json::from_str(rest)
            .map(Command::State)
            .map_err(|e| format!("usage: /state <json> ({})", e)),
        "/raw" => parse_raw(rest),
        "/room" | "/host" => Ok(Command::Room),
        "/quit" | "/exit" => Ok(Command::Quit),
        other => Err(format!("unknown command '{}'", other)),
    }
}

fn parse_raw(rest: &str) -> Result<Command, String> {
    const USAGE: &str = "usage: /raw <type> [json object]";
    let (kind, fields) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    if kind.is_empty() {
        return Err(USAGE.to_string());
    }

    let mut frame = SocketFrame::new(kind);
    if !fields.trim().is_empty() {
        match serde_json::from_str::<Value>(fields) {
            Ok(Value::Object(map)) => frame.fields = map,
            _ => return Err(USAGE.to_string()),
        }
    }
    Ok(Command::Raw(frame))
}

pub struct Session {
    pub backend: BackendClient,
    pub channel: Arc<RoomChannel>,
    pub socket: Option<(SocketFallback, mpsc::UnboundedReceiver<SocketFrame>)>,
    pub identity: Identity,
    /// Players this client seated itself, used for host matching
    pub local_players: Vec<Player>,
    pub bot_votes: Arc<VoteSchedule>,
}

/// Run the session until the user quits
pub async fn run_session(session: Session) -> Result<(), ClientError> {
    let Session {
        backend,
        channel,
        socket,
        identity,
        local_players,
        bot_votes,
    } = session;
    let (socket, socket_rx) = match socket {
        Some((socket, rx)) => (Some(socket), Some(rx)),
        None => (None, None),
    };

    let label = identity.display_label().to_string();
    println!(
        "\nYou are '{}' in room '{}'. Type a message, /vote <suit>, /state <json>, /raw <type> [json], /room or /quit.\n",
        label,
        channel.room_id()
    );

    let mut read_task = tokio::spawn(receive_loop(
        channel.subscribe_messages(),
        socket_rx,
        bot_votes.clone(),
        label.clone(),
    ));

    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();
    let prompt = format!("{}> ", label);
    std::thread::spawn(move || readline_loop(&prompt, input_tx));

    let room_id = channel.room_id().to_string();
    let mut input_task = tokio::spawn(async move {
        while let Some(line) = input_rx.recv().await {
            let command = match parse_command(&line) {
                Ok(command) => command,
                Err(usage) => {
                    print_above_prompt(&format!("{}\n", usage), &label);
                    continue;
                }
            };

            let output = match command {
                Command::Quit => break,
                Command::Chat(text) => {
                    let message = BroadcastMessage::new(
                        CHAT_EVENT,
                        json!({"room_id": room_id, "player_id": identity.id, "text": text}),
                    );
                    MessageFormatter::format_send_outcome(&channel.send(message).await)
                }
                Command::Vote(suit) => {
                    let message = trump_vote(&room_id, &identity.id, suit);
                    MessageFormatter::format_send_outcome(&channel.send(message).await)
                }
                Command::State(state) => {
                    let message = BroadcastMessage::new(
                        GAME_STATE_EVENT,
                        json!({"room_id": room_id, "state": state}),
                    );
                    MessageFormatter::format_send_outcome(&channel.send(message).await)
                }
                Command::Raw(frame) => match &socket {
                    Some(socket) if socket.send_message(&frame) => "socket: sent\n".to_string(),
                    Some(_) => "socket: not open\n".to_string(),
                    None => "socket: disabled\n".to_string(),
                },
                Command::Room => match backend.get_room(&room_id).await {
                    Ok(room) => {
                        let resolution = resolve_host(&room.players, &identity, &local_players);
                        format!(
                            "{}{}",
                            MessageFormatter::format_room(&room, &identity.id),
                            MessageFormatter::format_host(&room, &identity, &resolution)
                        )
                    }
                    Err(e) => format!("could not load room: {}\n", e),
                },
            };
            print_above_prompt(&output, &label);
        }

        if let Some(socket) = &socket {
            socket.shutdown();
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut read_task => {
            input_task.abort();
            return Err(ClientError::ConnectionError("Subscription ended".to_string()));
        }
        _ = &mut input_task => {
            read_task.abort();
        }
    }

    Ok(())
}

fn readline_loop(prompt: &str, input_tx: mpsc::UnboundedSender<String>) {
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Failed to initialize readline: {}", e);
            return;
        }
    };

    loop {
        match rl.readline(prompt) {
            Ok(line) => {
                let line = line.trim();
                if !line.is_empty() {
                    rl.add_history_entry(line).ok();
                    if input_tx.send(line.to_string()).is_err() {
                        break;
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                // Ctrl+C / Ctrl+D ends the session like /quit
                input_tx.send("/quit".to_string()).ok();
                break;
            }
            Err(err) => {
                tracing::error!("Readline error: {}", err);
                input_tx.send("/quit".to_string()).ok();
                break;
            }
        }
    }
}

/// Print inbound channel messages and socket frames
async fn receive_loop(
    mut messages: broadcast::Receiver<BroadcastMessage>,
    mut socket_rx: Option<mpsc::UnboundedReceiver<SocketFrame>>,
    bot_votes: Arc<VoteSchedule>,
    label: String,
) {
    loop {
        tokio::select! {
            received = messages.recv() => match received {
                Ok(message) => {
                    if message.r#type == VOTING_COMPLETE_EVENT && bot_votes.pending() > 0 {
                        tracing::info!("Voting complete, cancelling {} bot votes", bot_votes.pending());
                        bot_votes.cancel();
                    }
                    print_above_prompt(&MessageFormatter::format_broadcast(&message), &label);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Skipped {} inbound messages", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            Some(frame) = next_frame(&mut socket_rx) => {
                print_above_prompt(&MessageFormatter::format_socket_frame(&frame), &label);
            }
        }
    }
}

/// Next socket frame, or pending forever without a socket
async fn next_frame(
    socket_rx: &mut Option<mpsc::UnboundedReceiver<SocketFrame>>,
) -> Option<SocketFrame> {
    match socket_rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
