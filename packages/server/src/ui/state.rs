//! Shared application state.

use std::sync::Arc;

use turup_shared::time::{Clock, SystemClock};

use crate::{
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryRoomRepository, InMemorySubscriptionRepository, InMemoryUserRepository},
    },
    usecase::{
        CreateRoomUseCase, CreateUserUseCase, GetRoomUseCase, GetUserUseCase, JoinRoomUseCase,
        RealtimeHubUseCase, RecordRealtimeEventUseCase, SocketRelayUseCase,
    },
};

pub struct AppState {
    pub get_user_usecase: Arc<GetUserUseCase>,
    pub create_user_usecase: Arc<CreateUserUseCase>,
    pub create_room_usecase: Arc<CreateRoomUseCase>,
    pub get_room_usecase: Arc<GetRoomUseCase>,
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    pub record_realtime_event_usecase: Arc<RecordRealtimeEventUseCase>,
    pub realtime_hub_usecase: Arc<RealtimeHubUseCase>,
    pub socket_relay_usecase: Arc<SocketRelayUseCase>,
    /// When set, hub connections must present it as `?apikey=`
    pub api_key: Option<String>,
}

impl AppState {
    /// Wire every use case to the in-memory infrastructure.
    ///
    /// Order: repositories, pushers, use cases. The hub and the raw socket
    /// relay get separate pushers; the two transports never share
    /// connections.
    pub fn in_memory(api_key: Option<String>) -> Self {
        Self::in_memory_with_clock(api_key, Arc::new(SystemClock))
    }

    pub fn in_memory_with_clock(api_key: Option<String>, clock: Arc<dyn Clock>) -> Self {
        // 1. Repositories
        let users = Arc::new(InMemoryUserRepository::new());
        let rooms = Arc::new(InMemoryRoomRepository::new());
        let subscriptions = Arc::new(InMemorySubscriptionRepository::new());

        // 2. MessagePushers
        let hub_pusher = Arc::new(WebSocketMessagePusher::new());
        let socket_pusher = Arc::new(WebSocketMessagePusher::new());

        // 3. UseCases
        Self {
            get_user_usecase: Arc::new(GetUserUseCase::new(users.clone())),
            create_user_usecase: Arc::new(CreateUserUseCase::new(users, clock.clone())),
            create_room_usecase: Arc::new(CreateRoomUseCase::new(rooms.clone(), clock.clone())),
            get_room_usecase: Arc::new(GetRoomUseCase::new(rooms.clone())),
            join_room_usecase: Arc::new(JoinRoomUseCase::new(rooms.clone(), clock.clone())),
            record_realtime_event_usecase: Arc::new(RecordRealtimeEventUseCase::new(rooms, clock)),
            realtime_hub_usecase: Arc::new(RealtimeHubUseCase::new(subscriptions, hub_pusher)),
            socket_relay_usecase: Arc::new(SocketRelayUseCase::new(socket_pusher)),
            api_key,
        }
    }
}
