//! Shared fixtures: in-memory SQLite with the production schema

#![allow(dead_code)]

use std::future::Future;
use std::time::Duration;

use planning_poker::config::{sync_schema, AppConfig};
use planning_poker::domain::room::dto::{CreateRoomRequest, RoomResponse};
use planning_poker::domain::room::service::RoomService;
use planning_poker::domain::user::service::UserService;
use planning_poker::utils::jwt::encode_token;
use planning_poker::AppState;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

pub const TEST_SECRET: &str = "test-secret-key";

pub fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: TEST_SECRET.to_string(),
        ..AppConfig::default()
    }
}

/// Single-connection pool so every query sees the same in-memory database
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("in-memory sqlite should connect");
    sync_schema(&db).await.expect("schema sync should succeed");
    db
}

pub async fn setup_state() -> AppState {
    AppState::new(setup_db().await, test_config())
}

/// Provision users the way the auth collaborator would
pub async fn seed_users(state: &AppState, users: &[(&str, &str)]) {
    for (id, name) in users {
        UserService::upsert_user(&state.db, id, name, &format!("{}@example.com", id))
            .await
            .expect("user upsert should succeed");
    }
}

pub fn token_for(user_id: &str) -> String {
    encode_token(user_id.to_string(), TEST_SECRET, 3600).expect("token should encode")
}

pub async fn create_room(state: &AppState, owner: &str, name: &str) -> RoomResponse {
    RoomService::create_room(
        state,
        owner,
        CreateRoomRequest {
            name: name.to_string(),
            description: None,
        },
    )
    .await
    .expect("room creation should succeed")
}

/// Poll `check` until it holds or about two seconds pass.
pub async fn wait_until<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition was not met in time");
}
