//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use turup_shared::dto::{
    BroadcastMessage, CreateRoomRequest, CreateUserRequest, ErrorResponse, JoinRoomRequest,
    PlayerDto, RealtimeResponse, RoomDto, UserDto,
};

use crate::{
    ui::state::AppState,
    usecase::{
        CreateUserError, GetUserError, NewUser, RealtimeEffect, RealtimeEventError, RoomError,
    },
};

/// Error response: status code plus `{"error": message}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("{}", self.message);
        }
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<GetUserError> for ApiError {
    fn from(e: GetUserError) -> Self {
        match e {
            GetUserError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "User not found"),
        }
    }
}

impl From<CreateUserError> for ApiError {
    fn from(e: CreateUserError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, e.to_string())
    }
}

impl From<RoomError> for ApiError {
    fn from(e: RoomError) -> Self {
        let status = match e {
            RoomError::InvalidId(_) | RoomError::EmptyName => StatusCode::BAD_REQUEST,
            RoomError::NotFound(_) => StatusCode::NOT_FOUND,
            RoomError::RoomFull(_) => StatusCode::CONFLICT,
            RoomError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

impl From<RealtimeEventError> for ApiError {
    fn from(e: RealtimeEventError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Secondary leg of a realtime write
pub async fn post_realtime(
    State(state): State<Arc<AppState>>,
    Json(message): Json<BroadcastMessage>,
) -> Result<Json<RealtimeResponse>, ApiError> {
    tracing::debug!("Realtime fallback write: {}", message.r#type);
    let effect = state
        .record_realtime_event_usecase
        .execute(message)
        .await?;
    if let RealtimeEffect::GameStateReplaced(room_id) = &effect {
        tracing::info!("Game state of room {} replaced", room_id.as_str());
    }
    Ok(Json(RealtimeResponse { success: true }))
}

/// Get a user by primary id or external id
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<UserDto>, ApiError> {
    let user = state.get_user_usecase.execute(id).await?;
    Ok(Json(user.into()))
}

/// Create a user
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    let user = state
        .create_user_usecase
        .execute(NewUser {
            id: request.id,
            external_id: request.external_id,
            username: request.username,
            display_name: request.display_name,
            email: request.email,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Create a room; the creator is seated as host
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<RoomDto>), ApiError> {
    let room = state
        .create_room_usecase
        .execute(request.creator_id, request.creator_name, request.is_public)
        .await?;
    Ok((StatusCode::CREATED, Json(room.into())))
}

/// Get room detail by ID
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomDto>, ApiError> {
    let room = state.get_room_usecase.execute(room_id).await?;
    Ok(Json(room.into()))
}

/// Take a seat in a room
pub async fn join_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Json(request): Json<JoinRoomRequest>,
) -> Result<Json<PlayerDto>, ApiError> {
    let player = state
        .join_room_usecase
        .execute(room_id, request.player_id, request.name)
        .await?;
    Ok(Json(player.into()))
}
