//! Client startup: user, room, realtime bridge, bots, then the session.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use turup_shared::{
    config::BackendConfig,
    dto::{CreateRoomRequest, CreateUserRequest, JoinRoomRequest, UserDto},
};

use crate::{
    api::BackendClient,
    bots::{BotTiming, RegistrySink, schedule_bot_votes, seat_bots},
    domain::{Identity, Player, Room},
    endpoint::hub_url,
    error::ClientError,
    host::resolve_host,
    realtime::{ChannelRegistry, HttpFallback, WebSocketPubSub},
    socket::{RECONNECT_DELAY, SocketFallback, TungsteniteConnector, socket_url},
};

use super::{
    formatter::MessageFormatter,
    session::{Session, run_session},
};

const SUBSCRIBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Game-state flag telling that trump voting is over
const VOTING_COMPLETE_KEY: &str = "voting_complete";

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub backend: BackendConfig,
    pub identity: Identity,
    /// Room to join; a new room is created when `None`
    pub room_id: Option<String>,
    /// Bot seats to fill when this client hosts
    pub bots: usize,
    pub use_socket: bool,
}

/// Run the client until the user quits
pub async fn run_client(options: ClientOptions) -> Result<(), Box<dyn std::error::Error>> {
    let backend = BackendClient::from_config(&options.backend);

    let identity = ensure_user(&backend, options.identity).await?;
    tracing::info!("Signed in as '{}' ({})", identity.display_label(), identity.id);

    let room = enter_room(&backend, &identity, options.room_id.as_deref()).await?;
    let local_players = vec![Player::named(identity.id.clone(), identity.display_label())];
    let resolution = resolve_host(&room.players, &identity, &local_players);
    let is_host = match room.confirmed_host() {
        Some(host) => host.id == identity.id,
        None => resolution.is_host,
    };

    let bots = if is_host {
        seat_bots(&backend, &room, options.bots).await?
    } else {
        if options.bots > 0 {
            tracing::warn!("Only the host seats bots, ignoring --bots {}", options.bots);
        }
        Vec::new()
    };
    let room = if bots.is_empty() {
        room
    } else {
        backend.get_room(&room.id).await?
    };
    print!("{}", MessageFormatter::format_room(&room, &identity.id));
    print!("{}", MessageFormatter::format_host(&room, &identity, &resolution));

    let transport = WebSocketPubSub::connect(
        &TungsteniteConnector,
        &hub_url(&options.backend.url, &options.backend.api_key)?,
    )
    .await?;
    let fallback = HttpFallback::new(&options.backend.url)?;
    let registry = Arc::new(ChannelRegistry::new(
        Arc::new(transport),
        Arc::new(fallback),
    ));
    let channel = registry.open_or_reuse(&room.id).await;
    channel.wait_until_subscribed(SUBSCRIBE_TIMEOUT).await?;

    let socket = if options.use_socket {
        let url = socket_url(&options.backend.url)?;
        Some(SocketFallback::start(
            Arc::new(TungsteniteConnector),
            url,
            RECONNECT_DELAY,
        ))
    } else {
        None
    };

    let voting_complete = room
        .game_state
        .get(VOTING_COMPLETE_KEY)
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let sink = Arc::new(RegistrySink {
        registry: registry.clone(),
        room_id: room.id.clone(),
    });
    let bot_votes = Arc::new(schedule_bot_votes(
        &bots,
        &room.id,
        voting_complete,
        sink,
        BotTiming::default(),
    ));

    let result = run_session(Session {
        backend,
        channel,
        socket,
        identity,
        local_players,
        bot_votes: bot_votes.clone(),
    })
    .await;

    bot_votes.cancel();
    registry.close_all().await;
    tracing::info!("Client session ended");

    result.map_err(Into::into)
}

/// Fetch the backend user for `identity`, creating it on first sign-in.
///
/// Fields the backend knows fill in whatever the identity lacks.
async fn ensure_user(backend: &BackendClient, identity: Identity) -> Result<Identity, ClientError> {
    let user = match backend.get_user(&identity.id).await {
        Ok(user) => user,
        Err(ClientError::NotFound(_)) => {
            tracing::info!("No user '{}' yet, creating it", identity.id);
            let request = CreateUserRequest {
                id: Some(identity.id.clone()),
                external_id: None,
                username: identity.display_label().to_string(),
                display_name: identity.name.clone(),
                email: identity.email.clone(),
            };
            backend.create_user(&request).await?
        }
        Err(e) => return Err(e),
    };
    Ok(merge_identity(identity, user))
}

fn merge_identity(identity: Identity, user: UserDto) -> Identity {
    Identity {
        id: user.id,
        username: identity.username.or(Some(user.username)),
        name: identity.name.or(user.display_name),
        email: identity.email.or(user.email),
    }
}

async fn enter_room(
    backend: &BackendClient,
    identity: &Identity,
    room_id: Option<&str>,
) -> Result<Room, ClientError> {
    let name = identity.display_label().to_string();
    match room_id {
        Some(room_id) => {
            let request = JoinRoomRequest {
                player_id: identity.id.clone(),
                name,
            };
            let seat = backend.join_room(room_id, &request).await?;
            let room = backend.get_room(room_id).await?;
            if let Some(player) = room.player(&seat.id) {
                tracing::info!("Joined room '{}' at position {}", room.id, player.position);
            }
            Ok(room)
        }
        None => {
            let request = CreateRoomRequest {
                creator_id: identity.id.clone(),
                creator_name: name,
                is_public: true,
            };
            let room = backend.create_room(&request).await?;
            println!("Created room '{}'", room.id);
            Ok(room)
        }
    }
}
