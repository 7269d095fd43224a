use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{
    CreateRoomRequest, ParticipantItem, RoomDetailResponse, RoomResponse, RoomVoteItem,
};
use super::entity::{room, room_participant};
use super::slug::generate_slug;
use crate::domain::user::entity::user;
use crate::domain::vote::entity::vote;
use crate::event::{notify_room, RoomEvent};
use crate::state::AppState;
use crate::utils::error::AppError;

const MAX_NAME_CHARS: usize = 50;
const MAX_DESCRIPTION_CHARS: usize = 200;
const SLUG_ATTEMPTS: usize = 5;

/// How a caller addresses a room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomLookup<'a> {
    Id(&'a str),
    Slug(&'a str),
}

pub struct RoomService;

impl RoomService {
    /// Create a room owned by the requester, who becomes its only participant.
    pub async fn create_room(
        state: &AppState,
        user_id: &str,
        req: CreateRoomRequest,
    ) -> Result<RoomResponse, AppError> {
        let name = req.name.trim().to_string();
        if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
            return Err(AppError::ValidationError(
                "Room name must be 1 to 50 characters.".into(),
            ));
        }

        let description = req
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        if description
            .as_ref()
            .is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_CHARS)
        {
            return Err(AppError::ValidationError(
                "Room description cannot exceed 200 characters.".into(),
            ));
        }

        let txn = state
            .db
            .begin()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        let room_count = Self::count_active_rooms(&txn, user_id).await?;
        if room_count >= state.config.max_rooms_per_user {
            warn!(user_id = %user_id, room_count, "Room quota reached on create");
            return Err(AppError::QuotaExceeded(
                "You are in too many rooms already!".into(),
            ));
        }

        let slug = Self::pick_slug(&txn).await?;
        let now = Utc::now().naive_utc();

        let created = room::ActiveModel {
            room_id: Set(Uuid::new_v4().to_string()),
            name: Set(name),
            description: Set(description),
            slug: Set(slug),
            owner_id: Set(user_id.to_string()),
            votes_visible: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        room_participant::ActiveModel {
            room_id: Set(created.room_id.clone()),
            user_id: Set(user_id.to_string()),
            joined_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        info!(
            user_id = %user_id,
            room_id = %created.room_id,
            slug = %created.slug,
            "Room created"
        );

        Ok(RoomResponse::from(created))
    }

    /// Join a non-deleted room. Joining a room twice is a no-op.
    pub async fn join_room(
        state: &AppState,
        user_id: &str,
        lookup: RoomLookup<'_>,
    ) -> Result<RoomResponse, AppError> {
        let txn = state
            .db
            .begin()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        let room = Self::find_active_room(&txn, lookup)
            .await?
            .ok_or_else(|| AppError::NotFound("Room not found".into()))?;

        let already_joined = Self::is_participant(&txn, &room.room_id, user_id).await?;

        if !already_joined {
            let room_count = Self::count_active_rooms(&txn, user_id).await?;
            if room_count >= state.config.max_rooms_per_user {
                warn!(user_id = %user_id, room_count, "Room quota reached on join");
                return Err(AppError::QuotaExceeded(
                    "You are in too many rooms already!".into(),
                ));
            }

            room_participant::ActiveModel {
                room_id: Set(room.room_id.clone()),
                user_id: Set(user_id.to_string()),
                joined_at: Set(Utc::now().naive_utc()),
            }
            .insert(&txn)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        info!(
            user_id = %user_id,
            room_id = %room.room_id,
            already_joined,
            "Participant joined room"
        );

        notify_room(
            state.notifier.as_ref(),
            &room.room_id,
            RoomEvent::ParticipantJoined,
        )
        .await;

        Ok(RoomResponse::from(room))
    }

    /// Leave a room.
    ///
    /// - the owner can never leave (`Forbidden`); owners delete instead
    /// - the last remaining participant soft-deletes the room
    /// - anyone else loses membership and their vote
    pub async fn leave_room(
        state: &AppState,
        user_id: &str,
        room_id: &str,
    ) -> Result<RoomResponse, AppError> {
        let txn = state
            .db
            .begin()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        let room = Self::find_active_room(&txn, RoomLookup::Id(room_id))
            .await?
            .ok_or_else(|| AppError::NotFound("Room not found".into()))?;

        if room.is_owned_by(user_id) {
            warn!(user_id = %user_id, room_id = %room_id, "Owner attempted to leave room");
            return Err(AppError::Forbidden(
                "Room owners must delete the room instead of leaving it.".into(),
            ));
        }

        if !Self::is_participant(&txn, room_id, user_id).await? {
            return Err(AppError::NotFound("Room not found".into()));
        }

        let participant_count = room_participant::Entity::find()
            .filter(room_participant::Column::RoomId.eq(room_id))
            .count(&txn)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        let (result, event) = if participant_count <= 1 {
            let now = Utc::now().naive_utc();
            let mut active: room::ActiveModel = room.into();
            active.deleted_at = Set(Some(now));
            active.updated_at = Set(now);
            let closed = active
                .update(&txn)
                .await
                .map_err(|e| AppError::InternalError(e.to_string()))?;
            (closed, RoomEvent::RoomClosed)
        } else {
            vote::Entity::delete_many()
                .filter(vote::Column::RoomId.eq(room_id))
                .filter(vote::Column::UserId.eq(user_id))
                .exec(&txn)
                .await
                .map_err(|e| AppError::InternalError(e.to_string()))?;

            room_participant::Entity::delete_by_id((room_id.to_string(), user_id.to_string()))
                .exec(&txn)
                .await
                .map_err(|e| AppError::InternalError(e.to_string()))?;

            (room, RoomEvent::ParticipantLeft)
        };

        txn.commit()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        info!(
            user_id = %user_id,
            room_id = %room_id,
            soft_deleted = result.is_deleted(),
            "Participant left room"
        );

        notify_room(state.notifier.as_ref(), room_id, event).await;

        Ok(RoomResponse::from(result))
    }

    /// Soft-delete a room. Owner only.
    pub async fn delete_room(
        state: &AppState,
        user_id: &str,
        room_id: &str,
    ) -> Result<RoomResponse, AppError> {
        let room = Self::find_active_room(&state.db, RoomLookup::Id(room_id))
            .await?
            .ok_or_else(|| AppError::NotFound("Room not found".into()))?;

        if !room.is_owned_by(user_id) {
            warn!(user_id = %user_id, room_id = %room_id, "Non-owner attempted to delete room");
            return Err(AppError::Forbidden(
                "Only the room owner can delete this room.".into(),
            ));
        }

        let now = Utc::now().naive_utc();
        let mut active: room::ActiveModel = room.into();
        active.deleted_at = Set(Some(now));
        active.updated_at = Set(now);
        let deleted = active
            .update(&state.db)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        info!(user_id = %user_id, room_id = %room_id, "Room deleted");

        notify_room(state.notifier.as_ref(), room_id, RoomEvent::RoomClosed).await;

        Ok(RoomResponse::from(deleted))
    }

    pub async fn get_room(
        state: &AppState,
        user_id: &str,
        room_id: &str,
    ) -> Result<RoomDetailResponse, AppError> {
        Self::get_visible_detail(state, user_id, RoomLookup::Id(room_id)).await
    }

    pub async fn get_room_by_slug(
        state: &AppState,
        user_id: &str,
        slug: &str,
    ) -> Result<RoomDetailResponse, AppError> {
        Self::get_visible_detail(state, user_id, RoomLookup::Slug(slug)).await
    }

    /// Resolve a key that may be either a room id or a slug: id first, then slug.
    pub async fn get_room_by_key(
        state: &AppState,
        user_id: &str,
        key: &str,
    ) -> Result<RoomDetailResponse, AppError> {
        let by_id = Self::find_visible_room(&state.db, user_id, RoomLookup::Id(key)).await?;
        let room = match by_id {
            Some(room) => Some(room),
            None => Self::find_visible_room(&state.db, user_id, RoomLookup::Slug(key)).await?,
        }
        .ok_or_else(|| AppError::NotFound("Room not found".into()))?;

        Self::load_detail(&state.db, room).await
    }

    /// Non-deleted rooms the requester participates in, newest first.
    pub async fn list_rooms(state: &AppState, user_id: &str) -> Result<Vec<RoomResponse>, AppError> {
        let rooms = room::Entity::find()
            .inner_join(room_participant::Entity)
            .filter(room_participant::Column::UserId.eq(user_id))
            .filter(room::Column::DeletedAt.is_null())
            .order_by_desc(room::Column::CreatedAt)
            .order_by_desc(room::Column::RoomId)
            .all(&state.db)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        Ok(rooms.into_iter().map(RoomResponse::from).collect())
    }

    /// Flip `votes_visible`. Any participant may toggle.
    pub async fn toggle_votes_visible(
        state: &AppState,
        user_id: &str,
        room_id: &str,
    ) -> Result<RoomResponse, AppError> {
        let txn = state
            .db
            .begin()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        let room = Self::find_visible_room(&txn, user_id, RoomLookup::Id(room_id))
            .await?
            .ok_or_else(|| AppError::NotFound("Room not found".into()))?;

        let visible = !room.votes_visible;
        let mut active: room::ActiveModel = room.into();
        active.votes_visible = Set(visible);
        active.updated_at = Set(Utc::now().naive_utc());
        let updated = active
            .update(&txn)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        info!(
            user_id = %user_id,
            room_id = %room_id,
            votes_visible = visible,
            "Vote visibility toggled"
        );

        notify_room(
            state.notifier.as_ref(),
            room_id,
            RoomEvent::VoteVisibilityToggle,
        )
        .await;

        Ok(RoomResponse::from(updated))
    }

    /// Non-deleted room the user participates in, or `NotFound`.
    pub async fn ensure_participant<C>(
        db: &C,
        user_id: &str,
        room_id: &str,
    ) -> Result<room::Model, AppError>
    where
        C: ConnectionTrait,
    {
        Self::find_visible_room(db, user_id, RoomLookup::Id(room_id))
            .await?
            .ok_or_else(|| AppError::NotFound("Room not found".into()))
    }

    /// A room is visible to a user only while it is not deleted and they
    /// participate in it.
    pub(crate) async fn find_visible_room<C>(
        db: &C,
        user_id: &str,
        lookup: RoomLookup<'_>,
    ) -> Result<Option<room::Model>, AppError>
    where
        C: ConnectionTrait,
    {
        let query = room::Entity::find()
            .inner_join(room_participant::Entity)
            .filter(room::Column::DeletedAt.is_null())
            .filter(room_participant::Column::UserId.eq(user_id));

        let query = match lookup {
            RoomLookup::Id(id) => query.filter(room::Column::RoomId.eq(id)),
            RoomLookup::Slug(slug) => query.filter(room::Column::Slug.eq(slug)),
        };

        query
            .order_by_desc(room::Column::CreatedAt)
            .one(db)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))
    }

    async fn find_active_room<C>(
        db: &C,
        lookup: RoomLookup<'_>,
    ) -> Result<Option<room::Model>, AppError>
    where
        C: ConnectionTrait,
    {
        let query = room::Entity::find().filter(room::Column::DeletedAt.is_null());

        let query = match lookup {
            RoomLookup::Id(id) => query.filter(room::Column::RoomId.eq(id)),
            RoomLookup::Slug(slug) => query.filter(room::Column::Slug.eq(slug)),
        };

        query
            .order_by_desc(room::Column::CreatedAt)
            .one(db)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))
    }

    async fn is_participant<C>(db: &C, room_id: &str, user_id: &str) -> Result<bool, AppError>
    where
        C: ConnectionTrait,
    {
        let row = room_participant::Entity::find_by_id((room_id.to_string(), user_id.to_string()))
            .one(db)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        Ok(row.is_some())
    }

    async fn count_active_rooms<C>(db: &C, user_id: &str) -> Result<u64, AppError>
    where
        C: ConnectionTrait,
    {
        room_participant::Entity::find()
            .inner_join(room::Entity)
            .filter(room_participant::Column::UserId.eq(user_id))
            .filter(room::Column::DeletedAt.is_null())
            .count(db)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))
    }

    /// Best-effort unique slug; the last candidate wins after repeated collisions.
    async fn pick_slug<C>(db: &C) -> Result<String, AppError>
    where
        C: ConnectionTrait,
    {
        let mut candidate = generate_slug();

        for attempt in 1..=SLUG_ATTEMPTS {
            let taken = room::Entity::find()
                .filter(room::Column::Slug.eq(candidate.as_str()))
                .filter(room::Column::DeletedAt.is_null())
                .count(db)
                .await
                .map_err(|e| AppError::InternalError(e.to_string()))?;

            if taken == 0 {
                break;
            }

            warn!(slug = %candidate, attempt, "Slug collision");
            if attempt < SLUG_ATTEMPTS {
                candidate = generate_slug();
            }
        }

        Ok(candidate)
    }

    async fn get_visible_detail(
        state: &AppState,
        user_id: &str,
        lookup: RoomLookup<'_>,
    ) -> Result<RoomDetailResponse, AppError> {
        let room = Self::find_visible_room(&state.db, user_id, lookup)
            .await?
            .ok_or_else(|| AppError::NotFound("Room not found".into()))?;

        Self::load_detail(&state.db, room).await
    }

    async fn load_detail<C>(db: &C, room: room::Model) -> Result<RoomDetailResponse, AppError>
    where
        C: ConnectionTrait,
    {
        let participants = user::Entity::find()
            .inner_join(room_participant::Entity)
            .filter(room_participant::Column::RoomId.eq(room.room_id.as_str()))
            .order_by_asc(user::Column::Name)
            .order_by_asc(user::Column::UserId)
            .all(db)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        let votes = vote::Entity::find()
            .filter(vote::Column::RoomId.eq(room.room_id.as_str()))
            .order_by_asc(vote::Column::CreatedAt)
            .all(db)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        let summary = RoomResponse::from(room);

        Ok(RoomDetailResponse {
            room_id: summary.room_id,
            name: summary.name,
            description: summary.description,
            slug: summary.slug,
            owner_id: summary.owner_id,
            votes_visible: summary.votes_visible,
            created_at: summary.created_at,
            updated_at: summary.updated_at,
            participants: participants
                .into_iter()
                .map(|u| ParticipantItem {
                    id: u.user_id,
                    name: u.name,
                })
                .collect(),
            votes: votes
                .into_iter()
                .map(|v| RoomVoteItem {
                    user_id: v.user_id,
                    value: v.value,
                })
                .collect(),
        })
    }
}
