//! HTTP adapter for the chat API

use std::time::Duration;

use async_trait::async_trait;
use chat_common::{AppError, AppResult};
use chat_core::requests::normalize_query;
use chat_core::{
    ApiResult, ChatApi, ChatMessage, ChatRoom, ChatUser, CreateRoomRequest, DomainError, RoomId,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Response body, either bare or wrapped in `{"data": ...}`
#[derive(Deserialize)]
#[serde(untagged)]
enum Body<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Body<T> {
    fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

/// `ChatApi` over HTTP with a bearer token
#[derive(Debug, Clone)]
pub struct RestChatApi {
    client: Client,
    base_url: String,
    token: String,
}

impl RestChatApi {
    /// Create a client; every request is bounded by `timeout`
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AppError::internal)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(&self.token)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(&self.token)
    }

    /// Send `request`; a 404 on a room-scoped path means the room is gone
    async fn send(
        request: RequestBuilder,
        room: Option<&RoomId>,
    ) -> ApiResult<reqwest::Response> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = %status, body = %body, "Request rejected");
        Err(status_error(status, &body, room))
    }

    async fn json<T: DeserializeOwned>(
        request: RequestBuilder,
        room: Option<&RoomId>,
    ) -> ApiResult<T> {
        let text = Self::send(request, room)
            .await?
            .text()
            .await
            .map_err(transport_error)?;
        decode_body(&text)
    }
}

fn decode_body<T: DeserializeOwned>(text: &str) -> ApiResult<T> {
    serde_json::from_str::<Body<T>>(text)
        .map(Body::into_inner)
        .map_err(|e| DomainError::Decode(e.to_string()))
}

fn transport_error(err: reqwest::Error) -> DomainError {
    if err.is_timeout() {
        DomainError::TimedOut("request")
    } else {
        DomainError::Transport(err.to_string())
    }
}

fn status_error(status: StatusCode, body: &str, room: Option<&RoomId>) -> DomainError {
    match (status, room) {
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => {
            DomainError::Unauthorized(status.to_string())
        }
        (StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY, _) => {
            DomainError::Validation(body.to_string())
        }
        (StatusCode::NOT_FOUND, Some(room_id)) => DomainError::RoomNotFound(room_id.clone()),
        _ => DomainError::Transport(format!("{status}: {body}")),
    }
}

#[async_trait]
impl ChatApi for RestChatApi {
    async fn list_rooms(&self) -> ApiResult<Vec<ChatRoom>> {
        Self::json(self.get("rooms"), None).await
    }

    async fn fetch_history(&self, room_id: &RoomId, limit: u32) -> ApiResult<Vec<ChatMessage>> {
        let request = self
            .get(&format!("rooms/{room_id}/messages"))
            .query(&[("limit", limit)]);
        Self::json(request, Some(room_id)).await
    }

    async fn mark_read(&self, room_id: &RoomId) -> ApiResult<()> {
        Self::send(self.post(&format!("rooms/{room_id}/read")), Some(room_id)).await?;
        Ok(())
    }

    async fn search_users(&self, query: &str) -> ApiResult<Vec<ChatUser>> {
        let query = normalize_query(query)?;
        Self::json(self.get("users/search").query(&[("q", query)]), None).await
    }

    async fn recommended_users(&self) -> ApiResult<Vec<ChatUser>> {
        Self::json(self.get("users/recommended"), None).await
    }

    async fn create_room(&self, request: &CreateRoomRequest) -> ApiResult<ChatRoom> {
        Self::json(self.post("rooms").json(request), None).await
    }
}
