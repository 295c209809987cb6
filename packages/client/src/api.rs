//! REST client for the user and room endpoints.

use reqwest::{Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use turup_shared::{
    config::BackendConfig,
    dto::{
        CreateRoomRequest, CreateUserRequest, JoinRoomRequest, PlayerDto, RoomDto, UserDto,
    },
};

use crate::{
    domain::{Player, Room},
    endpoint::api_url,
    error::ClientError,
};

#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(config.url.clone())
    }

    /// Look a user up by primary id or external identity id
    pub async fn get_user(&self, id: &str) -> Result<UserDto, ClientError> {
        let url = api_url(&self.base_url, &["api", "users", id])?;
        let response = self.http.get(url).send().await?;
        decode(response, || format!("user '{}'", id)).await
    }

    pub async fn create_user(&self, request: &CreateUserRequest) -> Result<UserDto, ClientError> {
        let url = api_url(&self.base_url, &["api", "users"])?;
        self.post(url, request, || format!("user '{}'", request.username))
            .await
    }

    pub async fn create_room(&self, request: &CreateRoomRequest) -> Result<Room, ClientError> {
        let url = api_url(&self.base_url, &["api", "rooms"])?;
        let room: RoomDto = self
            .post(url, request, || "new room".to_string())
            .await?;
        Ok(room.into())
    }

    pub async fn get_room(&self, room_id: &str) -> Result<Room, ClientError> {
        let url = api_url(&self.base_url, &["api", "rooms", room_id])?;
        let response = self.http.get(url).send().await?;
        let room: RoomDto = decode(response, || format!("room '{}'", room_id)).await?;
        Ok(room.into())
    }

    /// Seat a player and return the seat; joining a room twice is harmless
    pub async fn join_room(
        &self,
        room_id: &str,
        request: &JoinRoomRequest,
    ) -> Result<Player, ClientError> {
        let url = api_url(&self.base_url, &["api", "rooms", room_id, "players"])?;
        let player: PlayerDto = self
            .post(url, request, || format!("room '{}'", room_id))
            .await?;
        Ok(player.into())
    }

    async fn post<B, T, F>(&self, url: reqwest::Url, body: &B, what: F) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
        F: FnOnce() -> String,
    {
        let response = self.http.post(url).json(body).send().await?;
        decode(response, what).await
    }
}

/// Map the response status and decode a JSON body
async fn decode<T, F>(response: Response, what: F) -> Result<T, ClientError>
where
    T: DeserializeOwned,
    F: FnOnce() -> String,
{
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound(what()));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        });
    }

    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}
