use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use super::dto::{CastVoteRequest, VoteResponse, VoteWithUserResponse};
use super::service::VoteService;
use crate::state::AppState;
use crate::utils::auth::AuthUser;
use crate::utils::error::AppError;
use crate::utils::BaseResponse;

/// Cast, change or withdraw my vote
///
/// A `null` value withdraws the vote; withdrawing without a vote succeeds.
#[utoipa::path(
    put,
    path = "/api/v1/rooms/{room_id}/votes/me",
    params(
        ("room_id" = String, Path, description = "Room id")
    ),
    request_body = CastVoteRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Vote stored or withdrawn", body = SuccessVoteResponse),
        (status = 400, description = "Value not on the scale", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 404, description = "Missing room or not a participant", body = ErrorResponse)
    ),
    tag = "Vote"
)]
pub async fn cast_vote(
    State(state): State<AppState>,
    user: AuthUser,
    Path(room_id): Path<String>,
    request: Result<Json<CastVoteRequest>, JsonRejection>,
) -> Result<Json<BaseResponse<VoteResponse>>, AppError> {
    let Json(req) = request?;
    let result = VoteService::cast_vote(&state, user.user_id(), &room_id, req.value).await?;

    Ok(Json(BaseResponse::success(result)))
}

/// Reset all votes (owner only)
///
/// Clears every vote and hides votes again.
#[utoipa::path(
    delete,
    path = "/api/v1/rooms/{room_id}/votes",
    params(
        ("room_id" = String, Path, description = "Room id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Votes reset", body = SuccessEmptyResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Missing room or not a participant", body = ErrorResponse)
    ),
    tag = "Vote"
)]
pub async fn reset_votes(
    State(state): State<AppState>,
    user: AuthUser,
    Path(room_id): Path<String>,
) -> Result<Json<BaseResponse<()>>, AppError> {
    VoteService::reset_votes(&state, user.user_id(), &room_id).await?;

    Ok(Json(BaseResponse::empty("Votes reset.")))
}

/// List votes with voter identity
#[utoipa::path(
    get,
    path = "/api/v1/rooms/{room_id}/votes",
    params(
        ("room_id" = String, Path, description = "Room id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Votes ordered by voter name", body = SuccessVoteListResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 404, description = "Missing room or not a participant", body = ErrorResponse)
    ),
    tag = "Vote"
)]
pub async fn get_votes(
    State(state): State<AppState>,
    user: AuthUser,
    Path(room_id): Path<String>,
) -> Result<Json<BaseResponse<Vec<VoteWithUserResponse>>>, AppError> {
    let result = VoteService::get_votes(&state, user.user_id(), &room_id).await?;

    Ok(Json(BaseResponse::success(result)))
}
