//! Vote casting and reset against an in-memory database

mod common;

use common::{create_room, seed_users, setup_state};
use planning_poker::domain::room::service::{RoomLookup, RoomService};
use planning_poker::domain::vote::entity::vote;
use planning_poker::domain::vote::service::VoteService;
use planning_poker::domain::vote::Estimate;
use planning_poker::utils::AppError;
use planning_poker::AppState;
use sea_orm::{ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, PaginatorTrait, QueryFilter, Statement};

async fn vote_rows(state: &AppState, room_id: &str) -> u64 {
    vote::Entity::find()
        .filter(vote::Column::RoomId.eq(room_id))
        .count(&state.db)
        .await
        .unwrap()
}

/// Alice owns the room, Bob has joined it.
async fn room_with_two(state: &AppState) -> String {
    seed_users(state, &[("alice", "Alice"), ("bob", "Bob")]).await;
    let created = create_room(state, "alice", "Sprint 1").await;
    RoomService::join_room(state, "bob", RoomLookup::Id(&created.room_id))
        .await
        .unwrap();
    created.room_id
}

#[tokio::test]
async fn casting_twice_should_keep_one_vote() {
    // Arrange
    let state = setup_state().await;
    let room_id = room_with_two(&state).await;

    // Act
    VoteService::cast_vote(&state, "bob", &room_id, Some(Estimate::Three))
        .await
        .unwrap();
    let second = VoteService::cast_vote(&state, "bob", &room_id, Some(Estimate::Eight))
        .await
        .unwrap();

    // Assert
    assert_eq!(second.value.as_deref(), Some("8"));
    assert_eq!(vote_rows(&state, &room_id).await, 1);
    let detail = RoomService::get_room(&state, "bob", &room_id).await.unwrap();
    assert_eq!(detail.vote_of("bob"), Some("8"));
}

#[tokio::test]
async fn null_vote_should_withdraw() {
    let state = setup_state().await;
    let room_id = room_with_two(&state).await;
    VoteService::cast_vote(&state, "bob", &room_id, Some(Estimate::Unknown))
        .await
        .unwrap();

    let withdrawn = VoteService::cast_vote(&state, "bob", &room_id, None)
        .await
        .unwrap();

    assert_eq!(withdrawn.value, None);
    assert_eq!(vote_rows(&state, &room_id).await, 0);
}

#[tokio::test]
async fn withdrawing_without_a_vote_should_succeed() {
    let state = setup_state().await;
    let room_id = room_with_two(&state).await;

    let result = VoteService::cast_vote(&state, "bob", &room_id, None).await;

    tokio_test::assert_ok!(result);
    assert_eq!(vote_rows(&state, &room_id).await, 0);
}

#[tokio::test]
async fn outsider_vote_should_be_not_found() {
    let state = setup_state().await;
    let room_id = room_with_two(&state).await;
    seed_users(&state, &[("eve", "Eve")]).await;

    let result = VoteService::cast_vote(&state, "eve", &room_id, Some(Estimate::One)).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert_eq!(vote_rows(&state, &room_id).await, 0);
}

#[tokio::test]
async fn vote_racing_leave_should_not_outlive_membership() {
    // Arrange
    let state = setup_state().await;
    let room_id = room_with_two(&state).await;

    // Act
    let (cast, left) = tokio::join!(
        VoteService::cast_vote(&state, "bob", &room_id, Some(Estimate::Three)),
        RoomService::leave_room(&state, "bob", &room_id),
    );

    // Assert
    assert!(left.is_ok());
    assert!(matches!(cast, Ok(_) | Err(AppError::NotFound(_))));
    let bob_votes = vote::Entity::find()
        .filter(vote::Column::RoomId.eq(room_id.as_str()))
        .filter(vote::Column::UserId.eq("bob"))
        .count(&state.db)
        .await
        .unwrap();
    assert_eq!(bob_votes, 0);
}

#[tokio::test]
async fn voting_in_deleted_room_should_be_not_found() {
    let state = setup_state().await;
    let room_id = room_with_two(&state).await;
    RoomService::delete_room(&state, "alice", &room_id)
        .await
        .unwrap();

    let result = VoteService::cast_vote(&state, "bob", &room_id, Some(Estimate::Two)).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn reset_by_non_owner_should_be_forbidden() {
    let state = setup_state().await;
    let room_id = room_with_two(&state).await;
    VoteService::cast_vote(&state, "bob", &room_id, Some(Estimate::Five))
        .await
        .unwrap();

    let result = VoteService::reset_votes(&state, "bob", &room_id).await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
    assert_eq!(vote_rows(&state, &room_id).await, 1);
}

#[tokio::test]
async fn reset_should_clear_votes_and_hide_them() {
    // Arrange
    let state = setup_state().await;
    let room_id = room_with_two(&state).await;
    VoteService::cast_vote(&state, "alice", &room_id, Some(Estimate::Five))
        .await
        .unwrap();
    VoteService::cast_vote(&state, "bob", &room_id, Some(Estimate::Thirteen))
        .await
        .unwrap();
    RoomService::toggle_votes_visible(&state, "bob", &room_id)
        .await
        .unwrap();

    // Act
    VoteService::reset_votes(&state, "alice", &room_id)
        .await
        .unwrap();

    // Assert
    let detail = RoomService::get_room(&state, "alice", &room_id).await.unwrap();
    assert!(detail.votes.is_empty());
    assert!(!detail.votes_visible);
}

#[tokio::test]
async fn failed_reset_should_leave_votes_and_visibility_untouched() {
    // Arrange
    let state = setup_state().await;
    let room_id = room_with_two(&state).await;
    VoteService::cast_vote(&state, "alice", &room_id, Some(Estimate::Five))
        .await
        .unwrap();
    VoteService::cast_vote(&state, "bob", &room_id, Some(Estimate::Eight))
        .await
        .unwrap();
    RoomService::toggle_votes_visible(&state, "alice", &room_id)
        .await
        .unwrap();

    // Any room update now fails, after the votes were deleted
    state
        .db
        .execute(Statement::from_string(
            DbBackend::Sqlite,
            "CREATE TRIGGER fail_room_update BEFORE UPDATE ON room \
             BEGIN SELECT RAISE(ABORT, 'boom'); END;",
        ))
        .await
        .unwrap();

    // Act
    let result = VoteService::reset_votes(&state, "alice", &room_id).await;

    // Assert
    assert!(matches!(result, Err(AppError::InternalError(_))));
    assert_eq!(vote_rows(&state, &room_id).await, 2);
    let detail = RoomService::get_room(&state, "alice", &room_id).await.unwrap();
    assert!(detail.votes_visible);
}

#[tokio::test]
async fn votes_should_list_voters_by_name() {
    // Arrange
    let state = setup_state().await;
    seed_users(&state, &[("u1", "Zoe"), ("u2", "Adam")]).await;
    let created = create_room(&state, "u1", "Sprint 1").await;
    RoomService::join_room(&state, "u2", RoomLookup::Id(&created.room_id))
        .await
        .unwrap();
    VoteService::cast_vote(&state, "u1", &created.room_id, Some(Estimate::Half))
        .await
        .unwrap();
    VoteService::cast_vote(&state, "u2", &created.room_id, Some(Estimate::Two))
        .await
        .unwrap();

    // Act
    let votes = VoteService::get_votes(&state, "u1", &created.room_id)
        .await
        .unwrap();

    // Assert
    let listed: Vec<(&str, &str)> = votes
        .iter()
        .map(|v| (v.user.name.as_str(), v.value.as_str()))
        .collect();
    assert_eq!(listed, vec![("Adam", "2"), ("Zoe", "0.5")]);
    assert_eq!(votes[0].user.email, "u2@example.com");
}
