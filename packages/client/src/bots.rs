//! Automatic trump votes for bot seats.
//!
//! Each bot votes once for a random suit, staggered so the votes arrive one
//! after another: bot `i` fires after `base_delay + i * stagger`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::task::JoinHandle;
use turup_shared::dto::{BroadcastMessage, JoinRoomRequest};

use crate::{
    api::BackendClient,
    domain::{Room, Suit},
    error::ClientError,
    realtime::{ChannelRegistry, SendOutcome},
};

/// Seats per room
pub const ROOM_SEATS: usize = 4;

/// Message type of a trump vote
pub const TRUMP_VOTE_EVENT: &str = "trump_vote";

/// Anything bot votes can be sent through
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, message: BroadcastMessage) -> SendOutcome;
}

/// Sends through the registry to a fixed room
pub struct RegistrySink {
    pub registry: Arc<ChannelRegistry>,
    pub room_id: String,
}

#[async_trait]
impl MessageSink for RegistrySink {
    async fn send(&self, message: BroadcastMessage) -> SendOutcome {
        self.registry.send_message(&self.room_id, message).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotPlayer {
    pub id: String,
    pub name: String,
}

impl BotPlayer {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BotTiming {
    pub base_delay: Duration,
    pub stagger: Duration,
}

impl Default for BotTiming {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(1000),
            stagger: Duration::from_millis(500),
        }
    }
}

impl BotTiming {
    /// Delay before the bot at `index` votes
    pub fn delay_for(&self, index: usize) -> Duration {
        let steps = u32::try_from(index).unwrap_or(u32::MAX);
        self.base_delay + self.stagger.saturating_mul(steps)
    }
}

/// `{type: "trump_vote", payload: {room_id, player_id, suit}}`
pub fn trump_vote(room_id: &str, player_id: &str, suit: Suit) -> BroadcastMessage {
    BroadcastMessage::new(
        TRUMP_VOTE_EVENT,
        json!({
            "room_id": room_id,
            "player_id": player_id,
            "suit": suit,
        }),
    )
}

/// Pending bot votes.
///
/// Dropping the schedule leaves the votes running; call
/// [`VoteSchedule::cancel`] or hold a [`VoteGuard`] to stop them.
#[derive(Debug, Default)]
pub struct VoteSchedule {
    timers: Vec<JoinHandle<()>>,
}

impl VoteSchedule {
    /// Abort every vote that has not fired yet
    pub fn cancel(&self) {
        for timer in &self.timers {
            timer.abort();
        }
    }

    /// Votes still waiting or in flight
    pub fn pending(&self) -> usize {
        self.timers.iter().filter(|t| !t.is_finished()).count()
    }

    /// Number of votes scheduled
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Cancel the votes when the guard is dropped
    pub fn into_guard(self) -> VoteGuard {
        VoteGuard(self)
    }
}

/// Cancels its [`VoteSchedule`] on drop
#[derive(Debug)]
pub struct VoteGuard(VoteSchedule);

impl Drop for VoteGuard {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Seat up to `count` bots in the free seats of `room`
pub async fn seat_bots(
    backend: &BackendClient,
    room: &Room,
    count: usize,
) -> Result<Vec<BotPlayer>, ClientError> {
    let free = ROOM_SEATS.saturating_sub(room.players.len());
    if count > free {
        tracing::warn!("Only {} free seats, seating {} of {} bots", free, free, count);
    }

    let mut bots = Vec::new();
    for index in 1..=count.min(free) {
        let bot = BotPlayer::new(format!("{}-bot-{}", room.id, index), format!("Bot {}", index));
        let request = JoinRoomRequest {
            player_id: bot.id.clone(),
            name: bot.name.clone(),
        };
        let seat = backend.join_room(&room.id, &request).await?;
        tracing::info!("Seated '{}' at position {}", bot.name, seat.position);
        bots.push(bot);
    }
    Ok(bots)
}

/// Schedule one trump vote per bot.
///
/// Nothing is scheduled when voting is already complete or there are no bots.
/// The suit is drawn uniformly when the vote fires.
pub fn schedule_bot_votes(
    bots: &[BotPlayer],
    room_id: &str,
    voting_complete: bool,
    sink: Arc<dyn MessageSink>,
    timing: BotTiming,
) -> VoteSchedule {
    if voting_complete || bots.is_empty() {
        tracing::debug!("No bot votes to schedule for room '{}'", room_id);
        return VoteSchedule::default();
    }

    let timers = bots
        .iter()
        .enumerate()
        .map(|(index, bot)| {
            let delay = timing.delay_for(index);
            let sink = sink.clone();
            let room_id = room_id.to_string();
            let bot = bot.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let suit = Suit::random(&mut rand::thread_rng());
                tracing::info!("Bot '{}' votes {} in room '{}'", bot.name, suit, room_id);
                let outcome = sink.send(trump_vote(&room_id, &bot.id, suit)).await;
                if !outcome.is_published() {
                    tracing::warn!("Vote of bot '{}' was not published: {:?}", bot.name, outcome);
                }
            })
        })
        .collect();

    tracing::debug!("Scheduled {} bot votes for room '{}'", bots.len(), room_id);
    VoteSchedule { timers }
}
