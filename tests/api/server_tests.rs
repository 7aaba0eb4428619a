//! Server and Channel API Tests

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::json;

use crate::common::{new_user, TestApp};

#[tokio::test]
async fn test_requests_without_token_are_unauthorized() {
    let app = TestApp::new();

    let (status, body) = app.request("GET", "/api/v1/servers", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["code"].is_number());
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let app = TestApp::new();

    let (status, _) = app.get("/api/v1/users/@me", "not-a-jwt").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_server_has_general_channel_and_owner_member() {
    let app = TestApp::new();
    let owner = new_user("owner");

    let (server_id, default_channel_id) = app.create_server(&owner, "Rustaceans").await;

    let (status, channels) = app
        .get(&format!("/api/v1/servers/{}/channels", server_id), &owner)
        .await;
    assert_eq!(status, StatusCode::OK);
    let channels = channels.as_array().unwrap();
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0]["name"], "general");
    assert_eq!(channels[0]["id"], default_channel_id.as_str());

    let (status, members) = app
        .get(&format!("/api/v1/servers/{}/members", server_id), &owner)
        .await;
    assert_eq!(status, StatusCode::OK);
    let members = members.as_array().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["username"], "owner");

    let (_, server) = app
        .get(&format!("/api/v1/servers/{}", server_id), &owner)
        .await;
    assert_eq!(server["default_channel_id"], default_channel_id.as_str());
}

#[tokio::test]
async fn test_non_member_is_forbidden() {
    let app = TestApp::new();
    let owner = new_user("owner");
    let stranger = new_user("stranger");
    let (server_id, channel_id) = app.create_server(&owner, "Private club").await;

    let (status, _) = app
        .get(&format!("/api/v1/servers/{}", server_id), &stranger)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .get(
            &format!("/api/v1/messages?kind=channel&id={}", channel_id),
            &stranger,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Membership is checked before the body
    for content in ["", "ok"] {
        let (status, _) = app
            .post(
                "/api/v1/messages",
                &stranger,
                json!({ "target": {"kind": "channel", "id": channel_id}, "content": content }),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    let (status, _) = app
        .post(
            &format!("/api/v1/servers/{}/channels", server_id),
            &stranger,
            json!({ "name": "" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post(
            &format!("/api/v1/servers/{}/invites", server_id),
            &stranger,
            json!({ "max_uses": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_server_requires_membership() {
    let app = TestApp::new();
    let user = new_user("user");

    let (status, _) = app.get("/api/v1/servers/12345", &user).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.delete("/api/v1/servers/12345", &user).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/v1/servers/not-a-number", &user).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_only_owner_creates_channels() {
    let app = TestApp::new();
    let owner = new_user("owner");
    let member = new_user("member");
    let (server_id, _) = app.create_server(&owner, "Guild").await;

    let (_, invite) = app
        .post(&format!("/api/v1/servers/{}/invites", server_id), &owner, json!({}))
        .await;
    let invite_id = invite["id"].as_str().unwrap();
    let (status, _) = app
        .post(&format!("/api/v1/invites/{}/join", invite_id), &member, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            &format!("/api/v1/servers/{}/channels", server_id),
            &member,
            json!({ "name": "random" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .post(
            &format!("/api/v1/servers/{}/channels", server_id),
            &owner,
            json!({ "name": "random" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].is_string());
}

#[tokio::test]
async fn test_default_channel_cannot_be_deleted() {
    let app = TestApp::new();
    let owner = new_user("owner");
    let (server_id, default_channel_id) = app.create_server(&owner, "Guild").await;

    let (status, _) = app
        .delete(&format!("/api/v1/channels/{}", default_channel_id), &owner)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, created) = app
        .post(
            &format!("/api/v1/servers/{}/channels", server_id),
            &owner,
            json!({ "name": "off-topic" }),
        )
        .await;
    let channel_id = created["id"].as_str().unwrap();

    let (status, _) = app
        .delete(&format!("/api/v1/channels/{}", channel_id), &owner)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .get(&format!("/api/v1/channels/{}", channel_id), &owner)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_server_removes_everything() {
    let app = TestApp::new();
    let owner = new_user("owner");
    let (server_id, channel_id) = app.create_server(&owner, "Doomed").await;

    let (status, _) = app
        .post(
            "/api/v1/messages",
            &owner,
            json!({ "target": {"kind": "channel", "id": channel_id}, "content": "bye" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .delete(&format!("/api/v1/servers/{}", server_id), &owner)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .get(&format!("/api/v1/servers/{}", server_id), &owner)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .get(&format!("/api/v1/channels/{}", channel_id), &owner)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, servers) = app.get("/api/v1/servers", &owner).await;
    assert_eq!(servers.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_only_owner_deletes_server() {
    let app = TestApp::new();
    let owner = new_user("owner");
    let other = new_user("other");
    let (server_id, _) = app.create_server(&owner, "Mine").await;

    let (status, _) = app
        .delete(&format!("/api/v1/servers/{}", server_id), &other)
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_duplicate_channel_name_conflicts() {
    let app = TestApp::new();
    let owner = new_user("owner");
    let (server_id, _) = app.create_server(&owner, "Guild").await;
    let uri = format!("/api/v1/servers/{}/channels", server_id);

    let (status, _) = app.post(&uri, &owner, json!({ "name": "random" })).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.post(&uri, &owner, json!({ "name": "random" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["code"].is_number());

    let (status, _) = app.post(&uri, &owner, json!({ "name": "general" })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .post(&uri, &owner, json!({ "name": "x".repeat(101) }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_channel_removes_messages_and_attachments() {
    let app = TestApp::new();
    let owner = new_user("owner");
    let (server_id, _) = app.create_server(&owner, "Guild").await;

    let (_, created) = app
        .post(
            &format!("/api/v1/servers/{}/channels", server_id),
            &owner,
            json!({ "name": "pictures" }),
        )
        .await;
    let channel_id = created["id"].as_str().unwrap().to_string();

    let storage_id = app.upload(&owner, b"holiday photo").await;
    let (status, _) = app
        .post(
            "/api/v1/messages",
            &owner,
            json!({
                "target": {"kind": "channel", "id": channel_id},
                "content": "look",
                "attachment_id": storage_id,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .delete(&format!("/api/v1/channels/{}", channel_id), &owner)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let response = app
        .send(
            Request::builder()
                .uri(format!("/files/{}", storage_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
