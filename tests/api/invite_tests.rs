//! Invite API Tests

use axum::http::StatusCode;
use serde_json::json;

use crate::common::{new_user, TestApp};

async fn create_invite(app: &TestApp, token: &str, server_id: &str, body: serde_json::Value) -> String {
    let (status, invite) = app
        .post(&format!("/api/v1/servers/{}/invites", server_id), token, body)
        .await;
    assert_eq!(status, StatusCode::CREATED, "create invite failed: {}", invite);
    invite["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_invite_preview_is_public() {
    let app = TestApp::new();
    let owner = new_user("owner");
    let (server_id, _) = app.create_server(&owner, "Open house").await;
    let invite_id = create_invite(&app, &owner, &server_id, json!({})).await;

    let (status, preview) = app
        .request("GET", &format!("/api/v1/invites/{}", invite_id), None, None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview["server"]["name"], "Open house");
    assert_eq!(preview["invite"]["uses"], 0);
}

#[tokio::test]
async fn test_single_use_invite_admits_one_user() {
    let app = TestApp::new();
    let owner = new_user("owner");
    let first = new_user("first");
    let second = new_user("second");
    let (server_id, _) = app.create_server(&owner, "Exclusive").await;
    let invite_id = create_invite(&app, &owner, &server_id, json!({ "max_uses": 1 })).await;
    let join = format!("/api/v1/invites/{}/join", invite_id);

    let (status, body) = app.post(&join, &first, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["joined"], true);
    assert_eq!(body["server_id"], server_id.as_str());

    let (status, _) = app.post(&join, &second, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, members) = app
        .get(&format!("/api/v1/servers/{}/members", server_id), &owner)
        .await;
    assert_eq!(members.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_existing_member_join_does_not_consume_use() {
    let app = TestApp::new();
    let owner = new_user("owner");
    let (server_id, _) = app.create_server(&owner, "Home").await;
    let invite_id = create_invite(&app, &owner, &server_id, json!({ "max_uses": 1 })).await;

    let (status, body) = app
        .post(&format!("/api/v1/invites/{}/join", invite_id), &owner, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["joined"], false);

    let (_, preview) = app
        .request("GET", &format!("/api/v1/invites/{}", invite_id), None, None)
        .await;
    assert_eq!(preview["invite"]["uses"], 0);
}

#[tokio::test]
async fn test_invite_rejects_bad_limits() {
    let app = TestApp::new();
    let owner = new_user("owner");
    let (server_id, _) = app.create_server(&owner, "Home").await;
    let uri = format!("/api/v1/servers/{}/invites", server_id);

    let (status, _) = app.post(&uri, &owner, json!({ "max_uses": 0 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(&uri, &owner, json!({ "expires_at": "2001-01-01T00:00:00Z" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_non_member_cannot_create_invite() {
    let app = TestApp::new();
    let owner = new_user("owner");
    let stranger = new_user("stranger");
    let (server_id, _) = app.create_server(&owner, "Home").await;

    let (status, _) = app
        .post(&format!("/api/v1/servers/{}/invites", server_id), &stranger, json!({}))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_invite_is_not_found() {
    let app = TestApp::new();

    let (status, _) = app.request("GET", "/api/v1/invites/42", None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
