pub mod client;
pub mod config;
pub mod domain;
pub mod event;
pub mod global;
pub mod shutdown;
pub mod state;
pub mod utils;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

pub use state::AppState;

use domain::{health, room, vote};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::handler::health_check,
        room::handler::create_room,
        room::handler::list_rooms,
        room::handler::get_room,
        room::handler::get_room_by_slug,
        room::handler::get_room_by_key,
        room::handler::join_room,
        room::handler::join_room_by_slug,
        room::handler::leave_room,
        room::handler::delete_room,
        room::handler::toggle_votes_visible,
        vote::handler::cast_vote,
        vote::handler::reset_votes,
        vote::handler::get_votes,
        event::handler::room_events,
    ),
    components(
        schemas(
            health::dto::HealthStatus,
            health::dto::HealthState,
            health::dto::HealthChecks,
            health::dto::CheckResult,
            room::dto::CreateRoomRequest,
            room::dto::RoomResponse,
            room::dto::RoomDetailResponse,
            room::dto::ParticipantItem,
            room::dto::RoomVoteItem,
            room::dto::SuccessRoomResponse,
            room::dto::SuccessRoomListResponse,
            room::dto::SuccessRoomDetailResponse,
            vote::Estimate,
            vote::dto::CastVoteRequest,
            vote::dto::VoteResponse,
            vote::dto::VoterItem,
            vote::dto::VoteWithUserResponse,
            vote::dto::SuccessVoteResponse,
            vote::dto::SuccessVoteListResponse,
            vote::dto::SuccessEmptyResponse,
            utils::response::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Room", description = "Room lifecycle"),
        (name = "Vote", description = "Voting"),
        (name = "Event", description = "Live room events")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn app(state: AppState) -> Router {
    let cors = build_cors(state.config.cors_allowed_origin.as_deref());

    let api = Router::new()
        .route(
            "/rooms",
            post(room::handler::create_room).get(room::handler::list_rooms),
        )
        .route(
            "/rooms/:room_id",
            get(room::handler::get_room).delete(room::handler::delete_room),
        )
        .route("/rooms/:room_id/join", post(room::handler::join_room))
        .route("/rooms/:room_id/leave", post(room::handler::leave_room))
        .route(
            "/rooms/:room_id/votes-visible",
            post(room::handler::toggle_votes_visible),
        )
        .route(
            "/rooms/:room_id/votes",
            get(vote::handler::get_votes).delete(vote::handler::reset_votes),
        )
        .route("/rooms/:room_id/votes/me", put(vote::handler::cast_vote))
        .route("/rooms/:room_id/events", get(event::handler::room_events))
        .route("/room-slugs/:slug", get(room::handler::get_room_by_slug))
        .route(
            "/room-slugs/:slug/join",
            post(room::handler::join_room_by_slug),
        )
        .route("/room-keys/:key", get(room::handler::get_room_by_key));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health::handler::health_check))
        .nest("/api/v1", api)
        .layer(middleware::from_fn(
            global::middleware::request_id_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn build_cors(allowed_origin: Option<&str>) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::DELETE];

    match allowed_origin.and_then(|origin| origin.parse::<HeaderValue>().ok()) {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(methods)
            .allow_headers([
                axum::http::header::AUTHORIZATION,
                axum::http::header::CONTENT_TYPE,
            ])
            .allow_credentials(true),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any),
    }
}
