//! Live room view: initial load, event-driven refetch and optimistic mutations

use std::ops::ControlFlow;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::api::{ClientError, RoomApi};
use super::cache::{EntryState, FetchTicket, QueryKey, RoomCache};
use super::optimistic::Mutation;
use super::subscriber::{ChannelSubscriber, Subscription};
use crate::domain::room::dto::{RoomDetailResponse, RoomResponse};
use crate::domain::vote::Estimate;
use crate::event::{room_channel, ChannelMessage, RoomEvent};

/// How the view was addressed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomKey {
    Id(String),
    Slug(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Loading,
    Ready,
    /// A read failed; replaces the room content
    Error(ClientError),
    /// The room was closed or the user left it
    Closed,
}

/// User-visible notifications raised by the session
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// A mutation was rejected and its local effect rolled back
    MutationFailed {
        action: &'static str,
        error: ClientError,
    },
    RoomClosed { room_id: String },
    /// Subscribing failed or the event stream ended; the view works but will
    /// not update by itself
    LiveUpdatesUnavailable(ClientError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteDisplay {
    Hidden,
    Value(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayedVote {
    pub user_id: String,
    pub display: VoteDisplay,
}

/// Votes as shown to `viewer`: other users' values stay hidden until revealed.
pub fn displayed_votes(room: &RoomDetailResponse, viewer: &str) -> Vec<DisplayedVote> {
    room.votes
        .iter()
        .map(|vote| DisplayedVote {
            user_id: vote.user_id.clone(),
            display: if room.votes_visible || vote.user_id == viewer {
                VoteDisplay::Value(vote.value.clone())
            } else {
                VoteDisplay::Hidden
            },
        })
        .collect()
}

struct ViewData {
    state: ViewState,
    room_id: Option<String>,
    slug: Option<String>,
    selected_vote: Option<Estimate>,
}

struct SessionInner {
    api: Arc<dyn RoomApi>,
    user_id: String,
    cache: Mutex<RoomCache>,
    view: Mutex<ViewData>,
    /// Serialises snapshot/apply/rollback across mutations
    mutation_lock: Mutex<()>,
    notices: mpsc::UnboundedSender<Notice>,
}

/// One open room view. Dropping or closing it ends the subscription.
pub struct RoomSession {
    inner: Arc<SessionInner>,
    listener: Option<JoinHandle<()>>,
    notices: Option<mpsc::UnboundedReceiver<Notice>>,
}

impl RoomSession {
    /// Load the room and, once ready, subscribe to its channel.
    pub async fn open(
        api: Arc<dyn RoomApi>,
        subscriber: Arc<dyn ChannelSubscriber>,
        user_id: impl Into<String>,
        key: RoomKey,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let inner = Arc::new(SessionInner {
            api,
            user_id: user_id.into(),
            cache: Mutex::new(RoomCache::new()),
            view: Mutex::new(ViewData {
                state: ViewState::Loading,
                room_id: None,
                slug: None,
                selected_vote: None,
            }),
            mutation_lock: Mutex::new(()),
            notices: tx,
        });

        let mut session = Self {
            inner: inner.clone(),
            listener: None,
            notices: Some(rx),
        };

        let fetched = match &key {
            RoomKey::Id(id) => inner.api.get_room(id).await,
            RoomKey::Slug(slug) => inner.api.get_room_by_slug(slug).await,
        };

        let room = match fetched {
            Ok(room) => room,
            Err(e) => {
                warn!(key = ?key, error = %e, "Room view failed to load");
                inner.view.lock().await.state = ViewState::Error(e);
                return session;
            }
        };

        {
            let mut cache = inner.cache.lock().await;
            for query in QueryKey::for_room(&room) {
                cache.set(query, room.clone());
            }
        }

        {
            let mut view = inner.view.lock().await;
            view.room_id = Some(room.room_id.clone());
            view.slug = Some(room.slug.clone());
            view.selected_vote = room
                .vote_of(&inner.user_id)
                .and_then(|value| value.parse().ok());
            view.state = ViewState::Ready;
        }

        match subscriber.subscribe(&room_channel(&room.room_id)).await {
            Ok(subscription) => {
                session.listener = Some(tokio::spawn(listen(inner.clone(), subscription)));
            }
            Err(e) => {
                warn!(room_id = %room.room_id, error = %e, "Room subscription failed");
                inner.notify(Notice::LiveUpdatesUnavailable(e));
            }
        }

        info!(room_id = %room.room_id, user_id = %inner.user_id, "Room view ready");

        session
    }

    /// Notice stream; can be taken once
    pub fn take_notices(&mut self) -> Option<mpsc::UnboundedReceiver<Notice>> {
        self.notices.take()
    }

    pub fn user_id(&self) -> &str {
        &self.inner.user_id
    }

    pub async fn state(&self) -> ViewState {
        self.inner.view.lock().await.state.clone()
    }

    pub async fn room_id(&self) -> Option<String> {
        self.inner.view.lock().await.room_id.clone()
    }

    /// Current cached room
    pub async fn room(&self) -> Option<RoomDetailResponse> {
        let room_id = self.room_id().await?;
        self.cached(&QueryKey::RoomById(room_id)).await
    }

    pub async fn cached(&self, key: &QueryKey) -> Option<RoomDetailResponse> {
        self.inner.cache.lock().await.get(key).cloned()
    }

    pub async fn cache_state(&self, key: &QueryKey) -> Option<EntryState> {
        self.inner.cache.lock().await.state(key).cloned()
    }

    pub async fn selected_vote(&self) -> Option<Estimate> {
        self.inner.view.lock().await.selected_vote
    }

    /// Votes as this user should see them
    pub async fn displayed_votes(&self) -> Vec<DisplayedVote> {
        match self.room().await {
            Some(room) => displayed_votes(&room, &self.inner.user_id),
            None => Vec::new(),
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.listener
            .as_ref()
            .is_some_and(|listener| !listener.is_finished())
    }

    /// Pick a card. Picking the selected card again withdraws the vote.
    pub async fn select_vote(&self, estimate: Estimate) -> Result<(), ClientError> {
        let _guard = self.inner.mutation_lock.lock().await;

        let previous = self.inner.view.lock().await.selected_vote;
        let next = if previous == Some(estimate) {
            None
        } else {
            Some(estimate)
        };

        self.inner.view.lock().await.selected_vote = next;
        let result = self
            .inner
            .run_mutation(Mutation::CastVote { value: next })
            .await;
        if result.is_err() {
            self.inner.view.lock().await.selected_vote = previous;
        }

        result
    }

    pub async fn cast_vote(&self, value: Option<Estimate>) -> Result<(), ClientError> {
        let _guard = self.inner.mutation_lock.lock().await;

        let previous = self.inner.view.lock().await.selected_vote;
        self.inner.view.lock().await.selected_vote = value;
        let result = self.inner.run_mutation(Mutation::CastVote { value }).await;
        if result.is_err() {
            self.inner.view.lock().await.selected_vote = previous;
        }

        result
    }

    pub async fn reset_votes(&self) -> Result<(), ClientError> {
        let _guard = self.inner.mutation_lock.lock().await;

        let previous = self.inner.view.lock().await.selected_vote.take();
        let result = self.inner.run_mutation(Mutation::ResetVotes).await;
        if result.is_err() {
            self.inner.view.lock().await.selected_vote = previous;
        }

        result
    }

    pub async fn toggle_votes_visible(&self) -> Result<(), ClientError> {
        let _guard = self.inner.mutation_lock.lock().await;
        self.inner.run_mutation(Mutation::ToggleVotesVisible).await
    }

    /// Force a reconciliation with the server
    pub async fn refresh(&self) {
        self.inner.invalidate_all().await;
        self.inner.refetch().await;
    }

    /// Leave the room and close the view
    pub async fn leave(&mut self) -> Result<RoomResponse, ClientError> {
        let room_id = self.inner.ready_room_id().await?;
        let room = self.inner.api.leave_room(&room_id).await?;
        self.close().await;
        Ok(room)
    }

    /// Delete the room (owner only) and close the view
    pub async fn delete(&mut self) -> Result<RoomResponse, ClientError> {
        let room_id = self.inner.ready_room_id().await?;
        let room = self.inner.api.delete_room(&room_id).await?;
        self.close().await;
        Ok(room)
    }

    /// Tear down the subscription and mark the view closed
    pub async fn close(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
        self.inner.view.lock().await.state = ViewState::Closed;
    }
}

impl Drop for RoomSession {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

async fn listen(inner: Arc<SessionInner>, mut subscription: Subscription) {
    while let Some(message) = subscription.recv().await {
        if inner.handle_event(&message).await.is_break() {
            debug!(channel = %subscription.channel(), "Room listener stopped");
            return;
        }
    }

    warn!(channel = %subscription.channel(), "Room event stream ended");
    inner.notify(Notice::LiveUpdatesUnavailable(ClientError::Transport(
        "room event stream ended".into(),
    )));
}

impl SessionInner {
    fn notify(&self, notice: Notice) {
        // Nobody listening is fine
        let _ = self.notices.send(notice);
    }

    async fn keys(&self) -> Vec<QueryKey> {
        let view = self.view.lock().await;
        let mut keys = Vec::with_capacity(2);
        if let Some(room_id) = &view.room_id {
            keys.push(QueryKey::RoomById(room_id.clone()));
        }
        if let Some(slug) = &view.slug {
            keys.push(QueryKey::RoomBySlug(slug.clone()));
        }
        keys
    }

    async fn ready_room_id(&self) -> Result<String, ClientError> {
        let view = self.view.lock().await;
        match (&view.state, &view.room_id) {
            (ViewState::Ready, Some(room_id)) => Ok(room_id.clone()),
            _ => Err(ClientError::BadRequest("room view is not ready".into())),
        }
    }

    async fn handle_event(&self, message: &ChannelMessage) -> ControlFlow<()> {
        let Some(event) = message.room_event() else {
            debug!(event = %message.event, "Ignoring unknown channel event");
            return ControlFlow::Continue(());
        };

        debug!(event = %event, sequence = message.sequence, "Room event received");

        match event {
            RoomEvent::RoomClosed => {
                let room_id = {
                    let mut view = self.view.lock().await;
                    view.state = ViewState::Closed;
                    view.room_id.clone().unwrap_or_default()
                };
                info!(room_id = %room_id, "Room closed; leaving view");
                self.notify(Notice::RoomClosed { room_id });
                ControlFlow::Break(())
            }
            other => {
                if other == RoomEvent::VoteReset {
                    self.view.lock().await.selected_vote = None;
                }
                self.invalidate_all().await;
                self.refetch().await;
                ControlFlow::Continue(())
            }
        }
    }

    async fn invalidate_all(&self) {
        let keys = self.keys().await;
        let mut cache = self.cache.lock().await;
        for key in &keys {
            cache.invalidate(key);
        }
    }

    async fn refetch(&self) {
        let Some(room_id) = self.view.lock().await.room_id.clone() else {
            return;
        };
        let keys = self.keys().await;

        let tickets: Vec<FetchTicket> = {
            let mut cache = self.cache.lock().await;
            keys.iter().map(|key| cache.begin_fetch(key)).collect()
        };

        match self.api.get_room(&room_id).await {
            Ok(room) => {
                let mut cache = self.cache.lock().await;
                for ticket in tickets {
                    if !cache.complete_fetch(ticket, room.clone()) {
                        debug!(room_id = %room_id, "Discarded superseded refetch");
                    }
                }
            }
            Err(e) => {
                let mut view = self.view.lock().await;
                if view.state == ViewState::Ready {
                    warn!(room_id = %room_id, error = %e, "Room refetch failed");
                    view.state = ViewState::Error(e);
                }
            }
        }
    }

    /// Optimistic protocol; the caller holds `mutation_lock`.
    async fn run_mutation(&self, mutation: Mutation) -> Result<(), ClientError> {
        let room_id = self.ready_room_id().await?;
        let keys = self.keys().await;

        // Cancel in-flight refetches, snapshot, apply locally
        {
            let mut cache = self.cache.lock().await;
            for key in &keys {
                cache.cancel(key);
                cache.apply_optimistic(key, |room| mutation.apply(room, &self.user_id));
            }
        }

        let result = match mutation {
            Mutation::CastVote { value } => self.api.cast_vote(&room_id, value).await.map(|_| ()),
            Mutation::ResetVotes => self.api.reset_votes(&room_id).await,
            Mutation::ToggleVotesVisible => {
                self.api.toggle_votes_visible(&room_id).await.map(|_| ())
            }
        };

        // Roll back or settle, then reconcile either way
        {
            let mut cache = self.cache.lock().await;
            for key in &keys {
                if result.is_err() {
                    cache.rollback(key);
                } else {
                    cache.settle(key);
                }
                cache.invalidate(key);
            }
        }

        if let Err(e) = &result {
            warn!(room_id = %room_id, action = mutation.name(), error = %e, "Mutation rolled back");
            self.notify(Notice::MutationFailed {
                action: mutation.name(),
                error: e.clone(),
            });
        }

        self.refetch().await;

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::room::dto::RoomVoteItem;

    #[test]
    fn hidden_votes_should_show_only_own_value() {
        let room = RoomDetailResponse {
            room_id: "r1".into(),
            name: "Sprint 1".into(),
            description: None,
            slug: "brave-azure-wolf".into(),
            owner_id: "a".into(),
            votes_visible: false,
            created_at: String::new(),
            updated_at: String::new(),
            participants: vec![],
            votes: vec![
                RoomVoteItem {
                    user_id: "a".into(),
                    value: "5".into(),
                },
                RoomVoteItem {
                    user_id: "b".into(),
                    value: "8".into(),
                },
            ],
        };

        let shown = displayed_votes(&room, "a");

        assert_eq!(shown[0].display, VoteDisplay::Value("5".into()));
        assert_eq!(shown[1].display, VoteDisplay::Hidden);
    }
}
