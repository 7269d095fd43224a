//! HTTP surface: routing, auth and the response envelope

mod common;

use axum::http::{header, HeaderValue, StatusCode};
use axum_test::TestServer;
use common::{create_room, seed_users, setup_state, token_for};
use planning_poker::{app, AppState};
use serde_json::{json, Value};

fn bearer(user_id: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token_for(user_id))).unwrap()
}

async fn server_with_users() -> (TestServer, AppState) {
    let state = setup_state().await;
    seed_users(&state, &[("alice", "Alice"), ("bob", "Bob")]).await;
    let server = TestServer::new(app(state.clone())).unwrap();
    (server, state)
}

#[tokio::test]
async fn should_return_401_without_token() {
    // Arrange
    let (server, _) = server_with_users().await;

    // Act
    let response = server.get("/api/v1/rooms").await;

    // Assert
    response.assert_status_unauthorized();
    response.assert_json_contains(&json!({
        "isSuccess": false,
        "code": "AUTH401"
    }));
}

#[tokio::test]
async fn should_create_room_inside_envelope() {
    // Arrange
    let (server, _) = server_with_users().await;

    // Act
    let response = server
        .post("/api/v1/rooms")
        .add_header(header::AUTHORIZATION, bearer("alice"))
        .json(&json!({ "name": "Sprint 1", "description": "Story points" }))
        .await;

    // Assert
    response.assert_status_ok();
    response.assert_json_contains(&json!({
        "isSuccess": true,
        "code": "COMMON200",
        "result": {
            "name": "Sprint 1",
            "ownerId": "alice",
            "votesVisible": false
        }
    }));

    let body: Value = response.json();
    let slug = body["result"]["slug"].as_str().unwrap();
    assert_eq!(slug.split('-').count(), 3);
}

#[tokio::test]
async fn should_return_400_for_blank_room_name() {
    let (server, _) = server_with_users().await;

    let response = server
        .post("/api/v1/rooms")
        .add_header(header::AUTHORIZATION, bearer("alice"))
        .json(&json!({ "name": "" }))
        .await;

    response.assert_status_bad_request();
    response.assert_json_contains(&json!({
        "isSuccess": false,
        "code": "COMMON400"
    }));
}

#[tokio::test]
async fn should_accept_padded_name_at_limit() {
    // Arrange
    let (server, _) = server_with_users().await;
    let name = "x".repeat(50);

    // Act
    let response = server
        .post("/api/v1/rooms")
        .add_header(header::AUTHORIZATION, bearer("alice"))
        .json(&json!({ "name": format!("  {name}  ") }))
        .await;

    // Assert
    response.assert_status_ok();
    response.assert_json_contains(&json!({ "result": { "name": name } }));
}

#[tokio::test]
async fn should_hide_room_from_outsider() {
    // Arrange
    let (server, state) = server_with_users().await;
    let created = create_room(&state, "alice", "Sprint 1").await;

    // Act
    let response = server
        .get(&format!("/api/v1/rooms/{}", created.room_id))
        .add_header(header::AUTHORIZATION, bearer("bob"))
        .await;

    // Assert
    response.assert_status_not_found();
    response.assert_json_contains(&json!({
        "isSuccess": false,
        "code": "COMMON404"
    }));
}

#[tokio::test]
async fn should_join_by_slug_and_vote() {
    // Arrange
    let (server, state) = server_with_users().await;
    let created = create_room(&state, "alice", "Sprint 1").await;

    // Act
    server
        .post(&format!("/api/v1/room-slugs/{}/join", created.slug))
        .add_header(header::AUTHORIZATION, bearer("bob"))
        .await
        .assert_status_ok();
    let vote = server
        .put(&format!("/api/v1/rooms/{}/votes/me", created.room_id))
        .add_header(header::AUTHORIZATION, bearer("bob"))
        .json(&json!({ "value": "0.5" }))
        .await;

    // Assert
    vote.assert_status_ok();
    vote.assert_json_contains(&json!({
        "result": { "userId": "bob", "value": "0.5" }
    }));

    let votes = server
        .get(&format!("/api/v1/rooms/{}/votes", created.room_id))
        .add_header(header::AUTHORIZATION, bearer("alice"))
        .await;
    votes.assert_status_ok();
    let body: Value = votes.json();
    assert_eq!(body["result"][0]["user"]["name"], "Bob");
}

#[tokio::test]
async fn should_reject_value_off_the_scale() {
    let (server, state) = server_with_users().await;
    let created = create_room(&state, "alice", "Sprint 1").await;

    let response = server
        .put(&format!("/api/v1/rooms/{}/votes/me", created.room_id))
        .add_header(header::AUTHORIZATION, bearer("alice"))
        .json(&json!({ "value": "7" }))
        .await;

    response.assert_status_bad_request();
    response.assert_json_contains(&json!({ "code": "COMMON400" }));
}

#[tokio::test]
async fn should_forbid_reset_by_non_owner() {
    let (server, state) = server_with_users().await;
    let created = create_room(&state, "alice", "Sprint 1").await;
    server
        .post(&format!("/api/v1/rooms/{}/join", created.room_id))
        .add_header(header::AUTHORIZATION, bearer("bob"))
        .await
        .assert_status_ok();

    let response = server
        .delete(&format!("/api/v1/rooms/{}/votes", created.room_id))
        .add_header(header::AUTHORIZATION, bearer("bob"))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    response.assert_json_contains(&json!({ "code": "COMMON403" }));
}

#[tokio::test]
async fn should_report_health() {
    let (server, _) = server_with_users().await;

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["checks"]["database"]["status"], true);
}

#[tokio::test]
async fn openapi_should_reference_envelope_schemas() {
    let (server, _) = server_with_users().await;

    let response = server.get("/api-docs/openapi.json").await;

    response.assert_status_ok();
    let doc: Value = response.json();
    let created = &doc["paths"]["/api/v1/rooms"]["post"]["responses"]["200"];
    assert_eq!(
        created["content"]["application/json"]["schema"]["$ref"],
        "#/components/schemas/SuccessRoomResponse"
    );
    for schema in ["SuccessRoomResponse", "SuccessVoteResponse", "SuccessEmptyResponse"] {
        assert!(doc["components"]["schemas"][schema].is_object(), "{schema} missing");
    }
}

#[tokio::test]
async fn should_echo_request_id() {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    // Arrange
    let state = setup_state().await;
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();

    // Act
    let response = app(state).oneshot(request).await.unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "req-42");
}
