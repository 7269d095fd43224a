//! Room sessions kept in sync through the in-process hub

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use common::{create_room, seed_users, setup_state, wait_until};
use planning_poker::client::{
    ChannelSubscriber, ClientError, EntryState, LocalRoomApi, Notice, QueryKey, RoomApi, RoomKey,
    RoomSession, Subscription, ViewState, VoteDisplay,
};
use planning_poker::domain::room::dto::{RoomDetailResponse, RoomResponse};
use planning_poker::domain::room::service::{RoomLookup, RoomService};
use planning_poker::domain::vote::dto::VoteResponse;
use planning_poker::domain::vote::service::VoteService;
use planning_poker::domain::vote::Estimate;
use planning_poker::event::{room_channel, ChannelMessage};
use planning_poker::AppState;
use tokio::sync::{mpsc, Notify};

async fn open_session(state: &AppState, user_id: &str, key: RoomKey) -> RoomSession {
    let api = Arc::new(LocalRoomApi::new(state.clone(), user_id));
    let subscriber: Arc<dyn ChannelSubscriber> = Arc::new(state.hub.clone());
    RoomSession::open(api, subscriber, user_id, key).await
}

/// Alice owns the room, Bob has joined it.
async fn shared_room(state: &AppState) -> RoomResponse {
    seed_users(state, &[("alice", "Alice"), ("bob", "Bob")]).await;
    let created = create_room(state, "alice", "Sprint 1").await;
    RoomService::join_room(state, "bob", RoomLookup::Id(&created.room_id))
        .await
        .unwrap();
    created
}

/// Delegates to the services but rejects votes once released by the test
struct GatedFailingApi {
    inner: LocalRoomApi,
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl RoomApi for GatedFailingApi {
    async fn get_room(&self, room_id: &str) -> Result<RoomDetailResponse, ClientError> {
        self.inner.get_room(room_id).await
    }

    async fn get_room_by_slug(&self, slug: &str) -> Result<RoomDetailResponse, ClientError> {
        self.inner.get_room_by_slug(slug).await
    }

    async fn cast_vote(
        &self,
        _room_id: &str,
        _value: Option<Estimate>,
    ) -> Result<VoteResponse, ClientError> {
        self.entered.notify_one();
        self.release.notified().await;
        Err(ClientError::Server("database unavailable".into()))
    }

    async fn reset_votes(&self, room_id: &str) -> Result<(), ClientError> {
        self.inner.reset_votes(room_id).await
    }

    async fn toggle_votes_visible(&self, room_id: &str) -> Result<RoomResponse, ClientError> {
        self.inner.toggle_votes_visible(room_id).await
    }

    async fn leave_room(&self, room_id: &str) -> Result<RoomResponse, ClientError> {
        self.inner.leave_room(room_id).await
    }

    async fn delete_room(&self, room_id: &str) -> Result<RoomResponse, ClientError> {
        self.inner.delete_room(room_id).await
    }
}

/// Hands out one subscription whose stream the test can end
#[derive(Default)]
struct ClosableSubscriber {
    sender: Mutex<Option<mpsc::Sender<ChannelMessage>>>,
}

impl ClosableSubscriber {
    fn close(&self) {
        self.sender.lock().unwrap().take();
    }
}

#[async_trait]
impl ChannelSubscriber for ClosableSubscriber {
    async fn subscribe(&self, channel: &str) -> Result<Subscription, ClientError> {
        let (tx, rx) = mpsc::channel(8);
        *self.sender.lock().unwrap() = Some(tx);
        Ok(Subscription::new(channel, rx, tokio::spawn(async {})))
    }
}

#[tokio::test]
async fn opening_by_slug_should_cache_under_both_keys() {
    // Arrange
    let state = setup_state().await;
    let created = shared_room(&state).await;

    // Act
    let session = open_session(&state, "bob", RoomKey::Slug(created.slug.clone())).await;

    // Assert
    assert_eq!(session.state().await, ViewState::Ready);
    assert!(session.is_subscribed());
    let by_id = session
        .cached(&QueryKey::RoomById(created.room_id.clone()))
        .await
        .unwrap();
    let by_slug = session
        .cached(&QueryKey::RoomBySlug(created.slug.clone()))
        .await
        .unwrap();
    assert_eq!(by_id, by_slug);
    assert_eq!(by_id.participants.len(), 2);
}

#[tokio::test]
async fn outsider_should_see_not_found_error() {
    let state = setup_state().await;
    let created = shared_room(&state).await;
    seed_users(&state, &[("eve", "Eve")]).await;

    let session = open_session(&state, "eve", RoomKey::Id(created.room_id.clone())).await;

    assert!(matches!(
        session.state().await,
        ViewState::Error(ClientError::NotFound(_))
    ));
    assert!(!session.is_subscribed());
    assert!(session.room().await.is_none());
}

#[tokio::test]
async fn remote_vote_should_trigger_refetch() {
    // Arrange
    let state = setup_state().await;
    let created = shared_room(&state).await;
    let session = open_session(&state, "alice", RoomKey::Id(created.room_id.clone())).await;

    // Act
    VoteService::cast_vote(&state, "bob", &created.room_id, Some(Estimate::Eight))
        .await
        .unwrap();

    // Assert
    let view = &session;
    wait_until(|| async move {
        view.room()
            .await
            .is_some_and(|room| room.vote_of("bob") == Some("8"))
    })
    .await;

    let shown = session.displayed_votes().await;
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].display, VoteDisplay::Hidden);
}

#[tokio::test]
async fn own_vote_should_apply_and_survive_reconciliation() {
    let state = setup_state().await;
    let created = shared_room(&state).await;
    let session = open_session(&state, "bob", RoomKey::Id(created.room_id.clone())).await;

    session.select_vote(Estimate::Three).await.unwrap();

    assert_eq!(session.selected_vote().await, Some(Estimate::Three));
    let room = session.room().await.unwrap();
    assert_eq!(room.vote_of("bob"), Some("3"));
    let view = &session;
    let key = QueryKey::RoomById(created.room_id.clone());
    let key = &key;
    wait_until(|| async move { view.cache_state(key).await == Some(EntryState::Clean) }).await;

    // Picking the same card again withdraws
    session.select_vote(Estimate::Three).await.unwrap();
    assert_eq!(session.selected_vote().await, None);
    assert!(session.room().await.unwrap().vote_of("bob").is_none());
}

#[tokio::test]
async fn rejected_vote_should_roll_back_to_snapshot() {
    // Arrange
    let state = setup_state().await;
    let created = shared_room(&state).await;
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let api = Arc::new(GatedFailingApi {
        inner: LocalRoomApi::new(state.clone(), "bob"),
        entered: entered.clone(),
        release: release.clone(),
    });
    let mut session = RoomSession::open(
        api,
        Arc::new(state.hub.clone()),
        "bob",
        RoomKey::Id(created.room_id.clone()),
    )
    .await;
    let mut notices = session.take_notices().unwrap();
    let key = QueryKey::RoomById(created.room_id.clone());
    let before = session.cached(&key).await.unwrap();

    // Act
    let observe = async {
        entered.notified().await;
        let during = session.cached(&key).await.unwrap();
        let state_during = session.cache_state(&key).await;
        release.notify_one();
        (during, state_during)
    };
    let (result, (during, state_during)) =
        tokio::join!(session.cast_vote(Some(Estimate::Five)), observe);

    // Assert
    assert_eq!(during.vote_of("bob"), Some("5"));
    assert!(matches!(state_during, Some(EntryState::Optimistic { .. })));

    assert_eq!(
        result,
        Err(ClientError::Server("database unavailable".into()))
    );
    assert_eq!(session.cached(&key).await.unwrap(), before);
    assert_eq!(session.selected_vote().await, None);
    assert_eq!(
        notices.recv().await,
        Some(Notice::MutationFailed {
            action: "cast vote",
            error: ClientError::Server("database unavailable".into()),
        })
    );
}

#[tokio::test]
async fn remote_event_should_not_discard_pending_write() {
    // Arrange
    let state = setup_state().await;
    let created = shared_room(&state).await;
    VoteService::cast_vote(&state, "bob", &created.room_id, Some(Estimate::Two))
        .await
        .unwrap();
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let api = Arc::new(GatedFailingApi {
        inner: LocalRoomApi::new(state.clone(), "bob"),
        entered: entered.clone(),
        release: release.clone(),
    });
    let mut session = RoomSession::open(
        api,
        Arc::new(state.hub.clone()),
        "bob",
        RoomKey::Id(created.room_id.clone()),
    )
    .await;
    let mut notices = session.take_notices().unwrap();
    let key = QueryKey::RoomById(created.room_id.clone());
    assert_eq!(session.cached(&key).await.unwrap().vote_of("bob"), Some("2"));

    // Act
    let observe = async {
        entered.notified().await;
        VoteService::cast_vote(&state, "alice", &created.room_id, Some(Estimate::Eight))
            .await
            .unwrap();
        // Give the listener time to handle the vote-update event
        tokio::time::sleep(Duration::from_millis(100)).await;
        let during = session.cached(&key).await.unwrap();
        let state_during = session.cache_state(&key).await;
        release.notify_one();
        (during, state_during)
    };
    let (result, (during, state_during)) =
        tokio::join!(session.cast_vote(Some(Estimate::Five)), observe);

    // Assert
    assert_eq!(during.vote_of("bob"), Some("5"));
    assert!(matches!(state_during, Some(EntryState::Optimistic { .. })));

    assert!(result.is_err());
    assert!(matches!(
        notices.recv().await,
        Some(Notice::MutationFailed {
            action: "cast vote",
            ..
        })
    ));
    let view = &session;
    let key = &key;
    wait_until(|| async move {
        view.cache_state(key).await == Some(EntryState::Clean)
            && view.cached(key).await.is_some_and(|room| {
                room.vote_of("bob") == Some("2") && room.vote_of("alice") == Some("8")
            })
    })
    .await;
}

#[tokio::test]
async fn ended_event_stream_should_raise_notice() {
    // Arrange
    let state = setup_state().await;
    let created = shared_room(&state).await;
    let subscriber = Arc::new(ClosableSubscriber::default());
    let mut session = RoomSession::open(
        Arc::new(LocalRoomApi::new(state.clone(), "bob")),
        subscriber.clone(),
        "bob",
        RoomKey::Id(created.room_id.clone()),
    )
    .await;
    let mut notices = session.take_notices().unwrap();
    assert!(session.is_subscribed());

    // Act
    subscriber.close();

    // Assert
    assert_eq!(
        notices.recv().await,
        Some(Notice::LiveUpdatesUnavailable(ClientError::Transport(
            "room event stream ended".into()
        )))
    );
    assert_eq!(session.state().await, ViewState::Ready);
    let view = &session;
    wait_until(|| async move { !view.is_subscribed() }).await;
}

#[tokio::test]
async fn vote_reset_should_clear_selection() {
    // Arrange
    let state = setup_state().await;
    let created = shared_room(&state).await;
    let session = open_session(&state, "bob", RoomKey::Id(created.room_id.clone())).await;
    session.cast_vote(Some(Estimate::Thirteen)).await.unwrap();
    assert_eq!(session.selected_vote().await, Some(Estimate::Thirteen));

    // Act
    VoteService::reset_votes(&state, "alice", &created.room_id)
        .await
        .unwrap();

    // Assert
    let view = &session;
    wait_until(|| async move {
        view.selected_vote().await.is_none()
            && view.room().await.is_some_and(|room| room.votes.is_empty())
    })
    .await;
}

#[tokio::test]
async fn room_closed_should_leave_view_and_stop_listening() {
    // Arrange
    let state = setup_state().await;
    let created = shared_room(&state).await;
    let mut session = open_session(&state, "bob", RoomKey::Id(created.room_id.clone())).await;
    let mut notices = session.take_notices().unwrap();

    // Act
    RoomService::delete_room(&state, "alice", &created.room_id)
        .await
        .unwrap();

    // Assert
    assert_eq!(
        notices.recv().await,
        Some(Notice::RoomClosed {
            room_id: created.room_id.clone()
        })
    );
    assert_eq!(session.state().await, ViewState::Closed);
    let view = &session;
    wait_until(|| async move { !view.is_subscribed() }).await;
}

#[tokio::test]
async fn dropping_session_should_release_subscription() {
    // Arrange
    let state = setup_state().await;
    let created = shared_room(&state).await;
    let channel = room_channel(&created.room_id);
    let session = open_session(&state, "alice", RoomKey::Id(created.room_id.clone())).await;
    assert_eq!(state.hub.subscriber_count(&channel).await, 1);

    // Act
    drop(session);

    // Assert
    let hub = &state.hub;
    let channel = channel.as_str();
    wait_until(|| async move { hub.subscriber_count(channel).await == 0 }).await;
}
