//! Text rendering for the CLI.

use turup_shared::{
    dto::{BroadcastMessage, SocketFrame},
    time::timestamp_to_rfc3339,
};

use crate::{
    domain::{Identity, Room},
    host::HostResolution,
    realtime::SendOutcome,
};

const RULE: &str = "============================================================";

pub struct MessageFormatter;

impl MessageFormatter {
    /// Seats of `room`, marking the current player and the host
    pub fn format_room(room: &Room, current_player_id: &str) -> String {
        let mut output = format!("\n\n{}\nRoom {}\n", RULE, room.id);

        if room.players.is_empty() {
            output.push_str("(No players)\n");
        }
        for player in &room.players {
            let me = if player.id == current_player_id { " (me)" } else { "" };
            let host = if player.is_host == Some(true) { " [host]" } else { "" };
            output.push_str(&format!(
                "#{} team {} - {}{}{} joined at {}\n",
                player.position,
                player.team,
                player.name,
                me,
                host,
                timestamp_to_rfc3339(player.joined_at)
            ));
        }

        output.push_str(RULE);
        output.push('\n');
        output
    }

    /// Host status line.
    ///
    /// A host confirmed by the server is reported as such; otherwise the
    /// heuristic result is shown with how it was reached.
    pub fn format_host(room: &Room, identity: &Identity, resolution: &HostResolution) -> String {
        if let Some(host) = room.confirmed_host() {
            let who = if host.id == identity.id {
                "you".to_string()
            } else {
                host.name.clone()
            };
            return format!("Host: {} (confirmed by server)\n", who);
        }

        match resolution.strategy {
            Some(strategy) => format!(
                "Host: {} (matched by {:?}, confidence {:?})\n",
                if resolution.is_host { "you" } else { "someone else" },
                strategy,
                resolution.confidence
            ),
            None => "Host: unknown\n".to_string(),
        }
    }

    pub fn format_broadcast(message: &BroadcastMessage) -> String {
        format!("\n← [{}] {}\n", message.r#type, message.payload)
    }

    pub fn format_socket_frame(frame: &SocketFrame) -> String {
        let fields = serde_json::Value::Object(frame.fields.clone());
        format!("\n← socket [{}] {}\n", frame.r#type, fields)
    }

    pub fn format_send_outcome(outcome: &SendOutcome) -> String {
        match outcome {
            SendOutcome::NotConnected => "not sent: channel not connected\n".to_string(),
            SendOutcome::Attempted {
                published,
                fallback,
            } => format!(
                "publish: {}, fallback: {}\n",
                leg_status(published),
                leg_status(fallback)
            ),
        }
    }
}

fn leg_status<E: std::fmt::Display>(result: &Result<(), E>) -> String {
    match result {
        Ok(()) => "ok".to_string(),
        Err(e) => format!("failed ({})", e),
    }
}
