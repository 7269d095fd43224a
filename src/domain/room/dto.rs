use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use super::entity::room;

const MAX_NAME_CHARS: usize = 50;
const MAX_DESCRIPTION_CHARS: usize = 200;

pub(crate) fn format_timestamp(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
}

// ============== Requests ==============

/// Surrounding whitespace is not part of the name.
fn validate_room_name(name: &str) -> Result<(), ValidationError> {
    let length = name.trim().chars().count();
    if length == 0 || length > MAX_NAME_CHARS {
        return Err(ValidationError::new("room_name_length"));
    }
    Ok(())
}

fn validate_room_description(description: &str) -> Result<(), ValidationError> {
    if description.trim().chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(ValidationError::new("room_description_length"));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    #[validate(custom(
        function = "validate_room_name",
        message = "Room name must be 1 to 50 characters."
    ))]
    pub name: String,

    #[validate(custom(
        function = "validate_room_description",
        message = "Room description cannot exceed 200 characters."
    ))]
    pub description: Option<String>,
}

// ============== Responses ==============

/// Room summary returned by list and mutation endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomResponse {
    pub room_id: String,
    pub name: String,
    pub description: Option<String>,
    pub slug: String,
    pub owner_id: String,
    pub votes_visible: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<room::Model> for RoomResponse {
    fn from(model: room::Model) -> Self {
        Self {
            room_id: model.room_id,
            name: model.name,
            description: model.description,
            slug: model.slug,
            owner_id: model.owner_id,
            votes_visible: model.votes_visible,
            created_at: format_timestamp(model.created_at),
            updated_at: format_timestamp(model.updated_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantItem {
    pub id: String,
    pub name: String,
}

/// A vote as seen inside a room: the voter is identified by id only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomVoteItem {
    pub user_id: String,
    pub value: String,
}

/// Room with its participants (by name) and current votes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetailResponse {
    pub room_id: String,
    pub name: String,
    pub description: Option<String>,
    pub slug: String,
    pub owner_id: String,
    pub votes_visible: bool,
    pub created_at: String,
    pub updated_at: String,
    pub participants: Vec<ParticipantItem>,
    pub votes: Vec<RoomVoteItem>,
}

impl RoomDetailResponse {
    pub fn vote_of(&self, user_id: &str) -> Option<&str> {
        self.votes
            .iter()
            .find(|vote| vote.user_id == user_id)
            .map(|vote| vote.value.as_str())
    }

    pub fn is_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p.id == user_id)
    }
}

// ============== Swagger wrappers ==============

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuccessRoomResponse {
    pub is_success: bool,
    pub code: String,
    pub message: String,
    pub result: RoomResponse,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuccessRoomListResponse {
    pub is_success: bool,
    pub code: String,
    pub message: String,
    pub result: Vec<RoomResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuccessRoomDetailResponse {
    pub is_success: bool,
    pub code: String,
    pub message: String,
    pub result: RoomDetailResponse,
}
