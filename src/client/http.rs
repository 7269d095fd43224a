//! HTTP transport for the room API and its SSE event stream

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::api::{ClientError, RoomApi};
use super::subscriber::{ChannelSubscriber, Subscription};
use crate::domain::room::dto::{RoomDetailResponse, RoomResponse};
use crate::domain::vote::dto::VoteResponse;
use crate::domain::vote::Estimate;
use crate::event::ChannelMessage;
use crate::utils::{BaseResponse, ErrorResponse};

const SUBSCRIPTION_BUFFER: usize = 64;

/// `RoomApi` over the `/api/v1` HTTP surface
#[derive(Debug, Clone)]
pub struct HttpRoomApi {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpRoomApi {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, token)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Option<T>, ClientError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(error_from_response(status, &body));
        }

        let envelope: BaseResponse<T> =
            serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))?;

        Ok(envelope.result)
    }

    async fn send_required<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        self.send(request)
            .await?
            .ok_or_else(|| ClientError::Decode("response envelope has no result".into()))
    }
}

/// Map a non-2xx response onto the client error taxonomy
pub(crate) fn error_from_response(status: StatusCode, body: &str) -> ClientError {
    let (code, message) = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(err) => (err.code, err.message),
        Err(_) => (String::new(), body.to_string()),
    };

    match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthenticated(message),
        StatusCode::FORBIDDEN => ClientError::Forbidden(message),
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        StatusCode::CONFLICT => ClientError::Conflict(message),
        StatusCode::BAD_REQUEST if code == "ROOM4001" => ClientError::QuotaExceeded(message),
        StatusCode::BAD_REQUEST => ClientError::BadRequest(message),
        _ => ClientError::Server(format!("{}: {}", status, message)),
    }
}

#[async_trait]
impl RoomApi for HttpRoomApi {
    async fn get_room(&self, room_id: &str) -> Result<RoomDetailResponse, ClientError> {
        let request = self.client.get(self.url(&format!("/rooms/{}", room_id)));
        self.send_required(request).await
    }

    async fn get_room_by_slug(&self, slug: &str) -> Result<RoomDetailResponse, ClientError> {
        let request = self.client.get(self.url(&format!("/room-slugs/{}", slug)));
        self.send_required(request).await
    }

    async fn cast_vote(
        &self,
        room_id: &str,
        value: Option<Estimate>,
    ) -> Result<VoteResponse, ClientError> {
        let request = self
            .client
            .put(self.url(&format!("/rooms/{}/votes/me", room_id)))
            .json(&json!({ "value": value }));
        self.send_required(request).await
    }

    async fn reset_votes(&self, room_id: &str) -> Result<(), ClientError> {
        let request = self
            .client
            .delete(self.url(&format!("/rooms/{}/votes", room_id)));
        self.send::<serde_json::Value>(request).await.map(|_| ())
    }

    async fn toggle_votes_visible(&self, room_id: &str) -> Result<RoomResponse, ClientError> {
        let request = self
            .client
            .post(self.url(&format!("/rooms/{}/votes-visible", room_id)));
        self.send_required(request).await
    }

    async fn leave_room(&self, room_id: &str) -> Result<RoomResponse, ClientError> {
        let request = self
            .client
            .post(self.url(&format!("/rooms/{}/leave", room_id)));
        self.send_required(request).await
    }

    async fn delete_room(&self, room_id: &str) -> Result<RoomResponse, ClientError> {
        let request = self.client.delete(self.url(&format!("/rooms/{}", room_id)));
        self.send_required(request).await
    }
}

/// One parsed `text/event-stream` frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
    pub id: Option<String>,
}

/// Parse a single frame (the text between blank lines).
///
/// Comment-only frames such as keep-alives yield `None`.
pub fn parse_sse_frame(frame: &str) -> Option<SseFrame> {
    let mut event = None;
    let mut data: Vec<&str> = Vec::new();
    let mut id = None;

    for line in frame.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => event = Some(value.to_string()),
            "data" => data.push(value),
            "id" => id = Some(value.to_string()),
            _ => {}
        }
    }

    if event.is_none() && data.is_empty() {
        return None;
    }

    Some(SseFrame {
        event: event.unwrap_or_else(|| "message".to_string()),
        data: data.join("\n"),
        id,
    })
}

/// `ChannelSubscriber` over the room SSE endpoint
#[derive(Debug, Clone)]
pub struct SseSubscriber {
    client: Client,
    base_url: String,
    token: String,
}

impl SseSubscriber {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl ChannelSubscriber for SseSubscriber {
    async fn subscribe(&self, channel: &str) -> Result<Subscription, ClientError> {
        let room_id = channel
            .strip_prefix("room-")
            .ok_or_else(|| ClientError::BadRequest(format!("not a room channel: {}", channel)))?;

        let response = self
            .client
            .get(format!("{}/api/v1/rooms/{}/events", self.base_url, room_id))
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_response(status, &body));
        }

        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let channel_name = channel.to_string();
        let mut bytes = response.bytes_stream();

        let forwarder = tokio::spawn(async move {
            let mut buffer: Vec<u8> = Vec::new();
            let mut fallback_sequence = 0u64;

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        warn!(channel = %channel_name, error = %e, "SSE stream failed");
                        break;
                    }
                };
                buffer.extend_from_slice(&chunk);

                while let Some(frame) = next_frame(&mut buffer) {
                    let Some(frame) = parse_sse_frame(&frame) else {
                        continue;
                    };

                    let sequence = frame
                        .id
                        .as_deref()
                        .and_then(|id| id.parse().ok())
                        .unwrap_or(fallback_sequence);
                    fallback_sequence = sequence.saturating_add(1);

                    let message = ChannelMessage {
                        channel: channel_name.clone(),
                        event: frame.event,
                        sequence,
                        payload: serde_json::from_str(&frame.data)
                            .unwrap_or(serde_json::Value::Null),
                    };

                    if tx.send(message).await.is_err() {
                        return;
                    }
                }
            }
            debug!(channel = %channel_name, "SSE stream ended");
        });

        Ok(Subscription::new(channel, rx, forwarder))
    }
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Take the next complete frame off `buffer`.
///
/// Frames are split on raw bytes so a character cut across two chunks is
/// only decoded once both halves have arrived.
fn next_frame(buffer: &mut Vec<u8>) -> Option<String> {
    let (end, separator) = [b"\r\n\r\n".as_slice(), b"\n\n".as_slice()]
        .into_iter()
        .filter_map(|separator| find_bytes(buffer, separator).map(|end| (end, separator.len())))
        .min_by_key(|(end, _)| *end)?;

    let frame: Vec<u8> = buffer.drain(..end + separator).collect();
    Some(String::from_utf8_lossy(&frame[..end]).replace("\r\n", "\n"))
}
