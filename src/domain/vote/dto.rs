use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::estimate::Estimate;

/// `{"value": "5"}` casts or changes a vote, `{"value": null}` withdraws it
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteRequest {
    #[serde(default)]
    pub value: Option<Estimate>,
}

/// The requester's vote after a cast; `value` is null once withdrawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub room_id: String,
    pub user_id: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoterItem {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteWithUserResponse {
    pub room_id: String,
    pub user_id: String,
    pub value: String,
    pub created_at: String,
    pub updated_at: String,
    pub user: VoterItem,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuccessVoteResponse {
    pub is_success: bool,
    pub code: String,
    pub message: String,
    pub result: VoteResponse,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuccessVoteListResponse {
    pub is_success: bool,
    pub code: String,
    pub message: String,
    pub result: Vec<VoteWithUserResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuccessEmptyResponse {
    pub is_success: bool,
    pub code: String,
    pub message: String,
    pub result: Option<()>,
}
