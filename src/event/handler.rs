use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};

use super::event_types::{room_channel, ChannelMessage};
use crate::domain::room::service::RoomService;
use crate::state::AppState;
use crate::utils::auth::AuthUser;
use crate::utils::error::AppError;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Subscribe to a room's events
///
/// Streams `event: <name>` / `data: <json>` frames for every change in the room.
#[utoipa::path(
    get,
    path = "/api/v1/rooms/{room_id}/events",
    params(
        ("room_id" = String, Path, description = "Room id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Server-sent event stream", content_type = "text/event-stream", body = String),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 404, description = "Missing room or not a participant", body = ErrorResponse)
    ),
    tag = "Event"
)]
pub async fn room_events(
    State(state): State<AppState>,
    user: AuthUser,
    Path(room_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    RoomService::ensure_participant(&state.db, user.user_id(), &room_id).await?;

    let channel = room_channel(&room_id);
    let receiver = state.hub.subscribe_channel(&channel).await;

    info!(user_id = %user.user_id(), channel = %channel, "SSE subscriber attached");

    let stream = BroadcastStream::new(receiver)
        .filter_map(|result| async move {
            match result {
                Ok(message) => to_sse_event(&message),
                Err(e) => {
                    warn!(error = %e, "SSE subscriber lagged");
                    None
                }
            }
        })
        .map(Ok);

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    ))
}

fn to_sse_event(message: &ChannelMessage) -> Option<Event> {
    let data = serde_json::to_string(&message.payload).ok()?;

    Some(
        Event::default()
            .event(message.event.as_str())
            .id(message.sequence.to_string())
            .data(data),
    )
}
