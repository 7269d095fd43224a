use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use validator::Validate;

use super::dto::{CreateRoomRequest, RoomDetailResponse, RoomResponse};
use super::service::{RoomLookup, RoomService};
use crate::state::AppState;
use crate::utils::auth::AuthUser;
use crate::utils::error::AppError;
use crate::utils::BaseResponse;

/// Create a room
///
/// The requester becomes owner and sole participant. Fails once the requester
/// already participates in the maximum number of open rooms.
#[utoipa::path(
    post,
    path = "/api/v1/rooms",
    request_body = CreateRoomRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Room created", body = SuccessRoomResponse),
        (status = 400, description = "Invalid input or room quota reached", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    ),
    tag = "Room"
)]
pub async fn create_room(
    State(state): State<AppState>,
    user: AuthUser,
    request: Result<Json<CreateRoomRequest>, JsonRejection>,
) -> Result<Json<BaseResponse<RoomResponse>>, AppError> {
    let Json(req) = request?;
    req.validate()?;

    let result = RoomService::create_room(&state, user.user_id(), req).await?;

    Ok(Json(BaseResponse::success_with_message(
        result,
        "Room created.",
    )))
}

/// List my rooms
#[utoipa::path(
    get,
    path = "/api/v1/rooms",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Rooms the requester participates in, newest first", body = SuccessRoomListResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    ),
    tag = "Room"
)]
pub async fn list_rooms(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<BaseResponse<Vec<RoomResponse>>>, AppError> {
    let result = RoomService::list_rooms(&state, user.user_id()).await?;

    Ok(Json(BaseResponse::success(result)))
}

/// Get a room by id
#[utoipa::path(
    get,
    path = "/api/v1/rooms/{room_id}",
    params(
        ("room_id" = String, Path, description = "Room id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Room with participants and votes", body = SuccessRoomDetailResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 404, description = "Missing, deleted, or not a participant", body = ErrorResponse)
    ),
    tag = "Room"
)]
pub async fn get_room(
    State(state): State<AppState>,
    user: AuthUser,
    Path(room_id): Path<String>,
) -> Result<Json<BaseResponse<RoomDetailResponse>>, AppError> {
    let result = RoomService::get_room(&state, user.user_id(), &room_id).await?;

    Ok(Json(BaseResponse::success(result)))
}

/// Get a room by slug
#[utoipa::path(
    get,
    path = "/api/v1/room-slugs/{slug}",
    params(
        ("slug" = String, Path, description = "Room slug, e.g. brave-azure-wolf")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Room with participants and votes", body = SuccessRoomDetailResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 404, description = "Missing, deleted, or not a participant", body = ErrorResponse)
    ),
    tag = "Room"
)]
pub async fn get_room_by_slug(
    State(state): State<AppState>,
    user: AuthUser,
    Path(slug): Path<String>,
) -> Result<Json<BaseResponse<RoomDetailResponse>>, AppError> {
    let result = RoomService::get_room_by_slug(&state, user.user_id(), &slug).await?;

    Ok(Json(BaseResponse::success(result)))
}

/// Get a room by id or slug
///
/// The key is tried as a room id first and as a slug second.
#[utoipa::path(
    get,
    path = "/api/v1/room-keys/{key}",
    params(
        ("key" = String, Path, description = "Room id or slug")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Room with participants and votes", body = SuccessRoomDetailResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 404, description = "No visible room under this key", body = ErrorResponse)
    ),
    tag = "Room"
)]
pub async fn get_room_by_key(
    State(state): State<AppState>,
    user: AuthUser,
    Path(key): Path<String>,
) -> Result<Json<BaseResponse<RoomDetailResponse>>, AppError> {
    let result = RoomService::get_room_by_key(&state, user.user_id(), &key).await?;

    Ok(Json(BaseResponse::success(result)))
}

/// Join a room by id
#[utoipa::path(
    post,
    path = "/api/v1/rooms/{room_id}/join",
    params(
        ("room_id" = String, Path, description = "Room id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Joined (or already a participant)", body = SuccessRoomResponse),
        (status = 400, description = "Room quota reached", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 404, description = "No open room with this id", body = ErrorResponse)
    ),
    tag = "Room"
)]
pub async fn join_room(
    State(state): State<AppState>,
    user: AuthUser,
    Path(room_id): Path<String>,
) -> Result<Json<BaseResponse<RoomResponse>>, AppError> {
    let result =
        RoomService::join_room(&state, user.user_id(), RoomLookup::Id(&room_id)).await?;

    Ok(Json(BaseResponse::success(result)))
}

/// Join a room by slug
#[utoipa::path(
    post,
    path = "/api/v1/room-slugs/{slug}/join",
    params(
        ("slug" = String, Path, description = "Room slug")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Joined (or already a participant)", body = SuccessRoomResponse),
        (status = 400, description = "Room quota reached", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 404, description = "No open room with this slug", body = ErrorResponse)
    ),
    tag = "Room"
)]
pub async fn join_room_by_slug(
    State(state): State<AppState>,
    user: AuthUser,
    Path(slug): Path<String>,
) -> Result<Json<BaseResponse<RoomResponse>>, AppError> {
    let result =
        RoomService::join_room(&state, user.user_id(), RoomLookup::Slug(&slug)).await?;

    Ok(Json(BaseResponse::success(result)))
}

/// Leave a room
///
/// Owners cannot leave. When the last participant leaves, the room is closed.
#[utoipa::path(
    post,
    path = "/api/v1/rooms/{room_id}/leave",
    params(
        ("room_id" = String, Path, description = "Room id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Left the room", body = SuccessRoomResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Owner must delete instead", body = ErrorResponse),
        (status = 404, description = "Missing room or not a participant", body = ErrorResponse)
    ),
    tag = "Room"
)]
pub async fn leave_room(
    State(state): State<AppState>,
    user: AuthUser,
    Path(room_id): Path<String>,
) -> Result<Json<BaseResponse<RoomResponse>>, AppError> {
    let result = RoomService::leave_room(&state, user.user_id(), &room_id).await?;

    Ok(Json(BaseResponse::success(result)))
}

/// Delete a room (owner only)
#[utoipa::path(
    delete,
    path = "/api/v1/rooms/{room_id}",
    params(
        ("room_id" = String, Path, description = "Room id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Room deleted", body = SuccessRoomResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Missing room", body = ErrorResponse)
    ),
    tag = "Room"
)]
pub async fn delete_room(
    State(state): State<AppState>,
    user: AuthUser,
    Path(room_id): Path<String>,
) -> Result<Json<BaseResponse<RoomResponse>>, AppError> {
    let result = RoomService::delete_room(&state, user.user_id(), &room_id).await?;

    Ok(Json(BaseResponse::success_with_message(
        result,
        "Room deleted.",
    )))
}

/// Reveal or hide votes
#[utoipa::path(
    post,
    path = "/api/v1/rooms/{room_id}/votes-visible",
    params(
        ("room_id" = String, Path, description = "Room id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Visibility flipped", body = SuccessRoomResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 404, description = "Missing room or not a participant", body = ErrorResponse)
    ),
    tag = "Room"
)]
pub async fn toggle_votes_visible(
    State(state): State<AppState>,
    user: AuthUser,
    Path(room_id): Path<String>,
) -> Result<Json<BaseResponse<RoomResponse>>, AppError> {
    let result = RoomService::toggle_votes_visible(&state, user.user_id(), &room_id).await?;

    Ok(Json(BaseResponse::success(result)))
}
