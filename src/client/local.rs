use async_trait::async_trait;

use super::api::{ClientError, RoomApi};
use crate::domain::room::dto::{RoomDetailResponse, RoomResponse};
use crate::domain::room::service::RoomService;
use crate::domain::vote::dto::VoteResponse;
use crate::domain::vote::service::VoteService;
use crate::domain::vote::Estimate;
use crate::state::AppState;

/// `RoomApi` that calls the services in-process on behalf of one user
#[derive(Clone)]
pub struct LocalRoomApi {
    state: AppState,
    user_id: String,
}

impl LocalRoomApi {
    pub fn new(state: AppState, user_id: impl Into<String>) -> Self {
        Self {
            state,
            user_id: user_id.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

#[async_trait]
impl RoomApi for LocalRoomApi {
    async fn get_room(&self, room_id: &str) -> Result<RoomDetailResponse, ClientError> {
        Ok(RoomService::get_room(&self.state, &self.user_id, room_id).await?)
    }

    async fn get_room_by_slug(&self, slug: &str) -> Result<RoomDetailResponse, ClientError> {
        Ok(RoomService::get_room_by_slug(&self.state, &self.user_id, slug).await?)
    }

    async fn cast_vote(
        &self,
        room_id: &str,
        value: Option<Estimate>,
    ) -> Result<VoteResponse, ClientError> {
        Ok(VoteService::cast_vote(&self.state, &self.user_id, room_id, value).await?)
    }

    async fn reset_votes(&self, room_id: &str) -> Result<(), ClientError> {
        Ok(VoteService::reset_votes(&self.state, &self.user_id, room_id).await?)
    }

    async fn toggle_votes_visible(&self, room_id: &str) -> Result<RoomResponse, ClientError> {
        Ok(RoomService::toggle_votes_visible(&self.state, &self.user_id, room_id).await?)
    }

    async fn leave_room(&self, room_id: &str) -> Result<RoomResponse, ClientError> {
        Ok(RoomService::leave_room(&self.state, &self.user_id, room_id).await?)
    }

    async fn delete_room(&self, room_id: &str) -> Result<RoomResponse, ClientError> {
        Ok(RoomService::delete_room(&self.state, &self.user_id, room_id).await?)
    }
}
