//! Client-side synchronisation for room views
//!
//! A [`RoomSession`] loads a room through a [`RoomApi`], keeps it in a
//! [`RoomCache`] under both its id and slug, and reconciles the cache with
//! the server whenever an event arrives on the room channel. Vote actions are
//! applied optimistically and rolled back if the server rejects them.

pub mod api;
pub mod cache;
pub mod http;
pub mod local;
pub mod optimistic;
pub mod subscriber;
pub mod view;

pub use api::{ClientError, RoomApi};
pub use cache::{EntryState, FetchTicket, QueryKey, RoomCache};
pub use http::{HttpRoomApi, SseSubscriber};
pub use local::LocalRoomApi;
pub use optimistic::Mutation;
pub use subscriber::{ChannelSubscriber, Subscription};
pub use view::{displayed_votes, DisplayedVote, Notice, RoomKey, RoomSession, ViewState, VoteDisplay};
