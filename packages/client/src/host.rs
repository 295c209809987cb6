//! Host resolution.
//!
//! Rooms from the server carry an explicit host flag ([`Room::confirmed_host`]).
//! When that is missing the client falls back to matching the signed-in
//! identity against the room's players by name, which is a guess: identity
//! fields can disagree with each other and with the names players chose.
//! [`resolve_host`] therefore reports *how* it matched, not just the answer.
//!
//! Matching order:
//!
//! 1. `username` equals a player name
//! 2. `name` equals a player name
//! 3. email local part equals a player name
//! 4. the first locally tracked player, looked up by id
//!
//! A matched player with an explicit flag decides the result. A room with a
//! single, unflagged player is inferred to be hosted by that player if one of
//! the identity fields matches its name. Otherwise the identity is not host.
//! "First player is host" is deliberately not a rule.
//!
//! [`Room::confirmed_host`]: crate::domain::Room::confirmed_host

use crate::domain::{Identity, Player};

/// How an identity was tied to a player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    Username,
    DisplayName,
    EmailLocalPart,
    LocalFirstPlayer,
    SolePlayer,
}

/// How much a caller should trust a [`HostResolution`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Confidence {
    /// No player matched
    Unmatched,
    /// Inferred from the shape of the room
    Inferred,
    /// Matched through locally tracked state, not the identity
    Fallback,
    /// An identity field equals the player's name
    Confident,
}

/// Strategies that compare an identity field against player names, in rank order
const IDENTITY_STRATEGIES: [MatchStrategy; 3] = [
    MatchStrategy::Username,
    MatchStrategy::DisplayName,
    MatchStrategy::EmailLocalPart,
];

impl MatchStrategy {
    /// The identity field this strategy compares, if it compares one
    fn identity_key<'a>(&self, identity: &'a Identity) -> Option<&'a str> {
        let key = match self {
            MatchStrategy::Username => identity.username.as_deref(),
            MatchStrategy::DisplayName => identity.name.as_deref(),
            MatchStrategy::EmailLocalPart => identity.email_local_part(),
            MatchStrategy::LocalFirstPlayer | MatchStrategy::SolePlayer => None,
        };
        key.filter(|k| !k.is_empty())
    }

    pub fn confidence(&self) -> Confidence {
        match self {
            MatchStrategy::Username
            | MatchStrategy::DisplayName
            | MatchStrategy::EmailLocalPart => Confidence::Confident,
            MatchStrategy::LocalFirstPlayer => Confidence::Fallback,
            MatchStrategy::SolePlayer => Confidence::Inferred,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostResolution {
    pub is_host: bool,
    /// Player the identity was tied to
    pub player_id: Option<String>,
    pub strategy: Option<MatchStrategy>,
    pub confidence: Confidence,
}

impl HostResolution {
    fn unmatched() -> Self {
        Self {
            is_host: false,
            player_id: None,
            strategy: None,
            confidence: Confidence::Unmatched,
        }
    }

    fn matched(is_host: bool, strategy: MatchStrategy, player: &Player) -> Self {
        Self {
            is_host,
            player_id: Some(player.id.clone()),
            strategy: Some(strategy),
            confidence: strategy.confidence(),
        }
    }

    /// True only for a match on an identity field
    pub fn is_confident(&self) -> bool {
        self.confidence == Confidence::Confident
    }
}

/// Tie `identity` to one of `players` and decide whether it is the host.
///
/// `local_players` is the client's own list of players (e.g. built while
/// joining), used only as the last matching fallback.
pub fn resolve_host(
    players: &[Player],
    identity: &Identity,
    local_players: &[Player],
) -> HostResolution {
    let matched = match_identity(players, identity, local_players);

    if let Some((strategy, player)) = matched
        && let Some(is_host) = player.is_host
    {
        return HostResolution::matched(is_host, strategy, player);
    }

    if let [sole] = players
        && sole.is_host != Some(true)
        && names_identity(sole, identity)
    {
        return HostResolution::matched(true, MatchStrategy::SolePlayer, sole);
    }

    match matched {
        // matched, but nobody said whether this player hosts
        Some((strategy, player)) => HostResolution::matched(false, strategy, player),
        None => HostResolution::unmatched(),
    }
}

/// Boolean form of [`resolve_host`]
pub fn is_player_host(players: &[Player], identity: &Identity, local_players: &[Player]) -> bool {
    resolve_host(players, identity, local_players).is_host
}

fn match_identity<'p>(
    players: &'p [Player],
    identity: &Identity,
    local_players: &[Player],
) -> Option<(MatchStrategy, &'p Player)> {
    IDENTITY_STRATEGIES
        .iter()
        .find_map(|strategy| {
            let key = strategy.identity_key(identity)?;
            players
                .iter()
                .find(|p| p.name == key)
                .map(|p| (*strategy, p))
        })
        .or_else(|| {
            let local = local_players.first()?;
            players
                .iter()
                .find(|p| p.id == local.id)
                .map(|p| (MatchStrategy::LocalFirstPlayer, p))
        })
}

fn names_identity(player: &Player, identity: &Identity) -> bool {
    IDENTITY_STRATEGIES
        .iter()
        .filter_map(|strategy| strategy.identity_key(identity))
        .any(|key| key == player.name)
}
