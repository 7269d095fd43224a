use chrono::Utc;
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use tracing::{info, warn};

use super::dto::{VoteResponse, VoteWithUserResponse, VoterItem};
use super::entity::vote;
use super::estimate::Estimate;
use crate::domain::room::dto::format_timestamp;
use crate::domain::room::entity::room;
use crate::domain::room::service::RoomService;
use crate::domain::user::entity::user;
use crate::event::{notify_room, RoomEvent};
use crate::state::AppState;
use crate::utils::error::AppError;

pub struct VoteService;

impl VoteService {
    /// Cast, change or withdraw (`None`) the requester's vote.
    ///
    /// The room must be open and the requester a participant. Withdrawing a
    /// vote that does not exist is a no-op.
    pub async fn cast_vote(
        state: &AppState,
        user_id: &str,
        room_id: &str,
        value: Option<Estimate>,
    ) -> Result<VoteResponse, AppError> {
        let txn = state
            .db
            .begin()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        RoomService::ensure_participant(&txn, user_id, room_id).await?;

        let stored = match value {
            None => {
                let result = vote::Entity::delete_many()
                    .filter(vote::Column::UserId.eq(user_id))
                    .filter(vote::Column::RoomId.eq(room_id))
                    .exec(&txn)
                    .await
                    .map_err(|e| AppError::InternalError(e.to_string()))?;

                info!(
                    user_id = %user_id,
                    room_id = %room_id,
                    removed = result.rows_affected,
                    "Vote withdrawn"
                );
                None
            }
            Some(estimate) => {
                let now = Utc::now().naive_utc();
                let model = vote::ActiveModel {
                    user_id: Set(user_id.to_string()),
                    room_id: Set(room_id.to_string()),
                    value: Set(estimate.as_str().to_string()),
                    created_at: Set(now),
                    updated_at: Set(now),
                };

                vote::Entity::insert(model)
                    .on_conflict(
                        OnConflict::columns([vote::Column::UserId, vote::Column::RoomId])
                            .update_columns([vote::Column::Value, vote::Column::UpdatedAt])
                            .to_owned(),
                    )
                    .exec_without_returning(&txn)
                    .await
                    .map_err(|e| AppError::InternalError(e.to_string()))?;

                info!(
                    user_id = %user_id,
                    room_id = %room_id,
                    value = %estimate,
                    "Vote cast"
                );
                Some(estimate.as_str().to_string())
            }
        };

        txn.commit()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        notify_room(state.notifier.as_ref(), room_id, RoomEvent::VoteUpdate).await;

        Ok(VoteResponse {
            room_id: room_id.to_string(),
            user_id: user_id.to_string(),
            value: stored,
        })
    }

    /// Clear every vote and hide votes again, atomically. Owner only.
    pub async fn reset_votes(state: &AppState, user_id: &str, room_id: &str) -> Result<(), AppError> {
        let txn = state
            .db
            .begin()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        let room = RoomService::ensure_participant(&txn, user_id, room_id).await?;

        if !room.is_owned_by(user_id) {
            warn!(user_id = %user_id, room_id = %room_id, "Non-owner attempted to reset votes");
            return Err(AppError::Forbidden(
                "Only the room owner can reset votes.".into(),
            ));
        }

        let removed = vote::Entity::delete_many()
            .filter(vote::Column::RoomId.eq(room_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        let mut active: room::ActiveModel = room.into();
        active.votes_visible = Set(false);
        active.updated_at = Set(Utc::now().naive_utc());
        active
            .update(&txn)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        info!(
            user_id = %user_id,
            room_id = %room_id,
            removed = removed.rows_affected,
            "Votes reset"
        );

        notify_room(state.notifier.as_ref(), room_id, RoomEvent::VoteReset).await;

        Ok(())
    }

    /// All votes of a room with the voter's identity, ordered by voter name.
    pub async fn get_votes(
        state: &AppState,
        user_id: &str,
        room_id: &str,
    ) -> Result<Vec<VoteWithUserResponse>, AppError> {
        RoomService::ensure_participant(&state.db, user_id, room_id).await?;

        let rows = vote::Entity::find()
            .find_also_related(user::Entity)
            .filter(vote::Column::RoomId.eq(room_id))
            .order_by_asc(user::Column::Name)
            .order_by_asc(vote::Column::UserId)
            .all(&state.db)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        let votes = rows
            .into_iter()
            .filter_map(|(vote, voter)| {
                // Users are never deleted while their votes exist (FK cascade)
                let voter = voter?;
                Some(VoteWithUserResponse {
                    room_id: vote.room_id,
                    user_id: vote.user_id,
                    value: vote.value,
                    created_at: format_timestamp(vote.created_at),
                    updated_at: format_timestamp(vote.updated_at),
                    user: VoterItem {
                        id: voter.user_id,
                        name: voter.name,
                        email: voter.email,
                    },
                })
            })
            .collect();

        Ok(votes)
    }
}
