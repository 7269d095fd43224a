use async_trait::async_trait;

use crate::domain::room::dto::{RoomDetailResponse, RoomResponse};
use crate::domain::vote::dto::VoteResponse;
use crate::domain::vote::Estimate;
use crate::utils::error::AppError;

/// Errors seen by a client of the room services
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("server error: {0}")]
    Server(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<AppError> for ClientError {
    fn from(err: AppError) -> Self {
        let message = err.message();
        match err {
            AppError::Unauthenticated(_) => ClientError::Unauthenticated(message),
            AppError::NotFound(_) => ClientError::NotFound(message),
            AppError::Forbidden(_) => ClientError::Forbidden(message),
            AppError::QuotaExceeded(_) => ClientError::QuotaExceeded(message),
            AppError::Conflict(_) => ClientError::Conflict(message),
            AppError::BadRequest(_)
            | AppError::ValidationError(_)
            | AppError::JsonParseFailed(_) => ClientError::BadRequest(message),
            AppError::InternalError(_) => ClientError::Server(message),
        }
    }
}

/// Transport seam for the room and vote operations a room view needs
#[async_trait]
pub trait RoomApi: Send + Sync {
    async fn get_room(&self, room_id: &str) -> Result<RoomDetailResponse, ClientError>;

    async fn get_room_by_slug(&self, slug: &str) -> Result<RoomDetailResponse, ClientError>;

    async fn cast_vote(
        &self,
        room_id: &str,
        value: Option<Estimate>,
    ) -> Result<VoteResponse, ClientError>;

    async fn reset_votes(&self, room_id: &str) -> Result<(), ClientError>;

    async fn toggle_votes_visible(&self, room_id: &str) -> Result<RoomResponse, ClientError>;

    async fn leave_room(&self, room_id: &str) -> Result<RoomResponse, ClientError>;

    async fn delete_room(&self, room_id: &str) -> Result<RoomResponse, ClientError>;
}
