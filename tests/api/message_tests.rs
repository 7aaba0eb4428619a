//! Message, Typing and Storage API Tests

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chat_starter::application::jobs::JobOutcome;
use chat_starter::application::services::CreateMessageDto;
use chat_starter::domain::ConversationTarget;
use serde_json::json;

use crate::common::{new_user, TestApp, PUBLIC_URL};

#[tokio::test]
async fn test_message_lists_with_sender_and_attachment_url() {
    let app = TestApp::new();
    let owner = new_user("poster");
    let (_, channel_id) = app.create_server(&owner, "Gallery").await;
    let storage_id = app.upload(&owner, b"\x89PNG fake image").await;

    let (status, created) = app
        .post(
            "/api/v1/messages",
            &owner,
            json!({
                "target": {"kind": "channel", "id": channel_id},
                "content": "look at this",
                "attachment_id": storage_id,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let message_id = created["id"].as_str().unwrap();

    let (status, messages) = app
        .get(
            &format!("/api/v1/messages?kind=channel&id={}", channel_id),
            &owner,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let messages = messages.as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["id"], message_id);
    assert_eq!(messages[0]["content"], "look at this");
    assert_eq!(messages[0]["sender"]["username"], "poster");
    assert_eq!(
        messages[0]["attachment_url"],
        format!("{}/files/{}", PUBLIC_URL, storage_id).as_str()
    );

    let response = app
        .send(
            Request::builder()
                .uri(format!("/files/{}", storage_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_upload_ticket_is_single_use() {
    let app = TestApp::new();
    let user = new_user("uploader");

    let (_, body) = app
        .request("POST", "/api/v1/storage/upload-url", Some(&user), None)
        .await;
    let path = body["url"]
        .as_str()
        .unwrap()
        .strip_prefix(PUBLIC_URL)
        .unwrap()
        .to_string();

    let put = |data: &'static [u8]| {
        Request::builder()
            .method("PUT")
            .uri(path.clone())
            .body(Body::from(data))
            .unwrap()
    };

    assert_eq!(app.send(put(b"one")).await.status(), StatusCode::CREATED);
    assert_eq!(app.send(put(b"two")).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_file_is_not_found() {
    let app = TestApp::new();

    let response = app
        .send(
            Request::builder()
                .uri("/files/does-not-exist")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_message_is_rejected() {
    let app = TestApp::new();
    let owner = new_user("owner");
    let (_, channel_id) = app.create_server(&owner, "Quiet").await;

    let (status, _) = app
        .post(
            "/api/v1/messages",
            &owner,
            json!({ "target": {"kind": "channel", "id": channel_id}, "content": "" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_only_author_deletes_message() {
    let app = TestApp::new();
    let owner = new_user("owner");
    let (server_id, channel_id) = app.create_server(&owner, "Chat").await;

    let (_, created) = app
        .post(
            "/api/v1/messages",
            &owner,
            json!({ "target": {"kind": "channel", "id": channel_id}, "content": "mine" }),
        )
        .await;
    let message_id = created["id"].as_str().unwrap();

    let other = new_user("other");
    let (_, invite) = app
        .post(&format!("/api/v1/servers/{}/invites", server_id), &owner, json!({}))
        .await;
    app.post(
        &format!("/api/v1/invites/{}/join", invite["id"].as_str().unwrap()),
        &other,
        json!({}),
    )
    .await;

    let (status, _) = app
        .delete(&format!("/api/v1/messages/{}", message_id), &other)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .delete(&format!("/api/v1/messages/{}", message_id), &owner)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, messages) = app
        .get(
            &format!("/api/v1/messages?kind=channel&id={}", channel_id),
            &owner,
        )
        .await;
    assert!(messages.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_target_kind_is_rejected() {
    let app = TestApp::new();
    let user = new_user("user");

    let (status, _) = app.get("/api/v1/messages?kind=thread&id=1", &user).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_typing_indicator_is_visible_to_others_only() {
    let app = TestApp::new();
    let owner = new_user("typist");
    let (server_id, channel_id) = app.create_server(&owner, "Keyboard").await;

    let reader = new_user("reader");
    let (_, invite) = app
        .post(&format!("/api/v1/servers/{}/invites", server_id), &owner, json!({}))
        .await;
    app.post(
        &format!("/api/v1/invites/{}/join", invite["id"].as_str().unwrap()),
        &reader,
        json!({}),
    )
    .await;

    let (status, _) = app
        .request(
            "PUT",
            "/api/v1/typing",
            Some(&owner),
            Some(json!({ "target": {"kind": "channel", "id": channel_id} })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let uri = format!("/api/v1/typing?kind=channel&id={}", channel_id);
    let (status, typing) = app.get(&uri, &reader).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(typing, json!(["typist"]));

    let (_, typing) = app.get(&uri, &owner).await;
    assert_eq!(typing, json!([]));
}

#[tokio::test]
async fn test_attachment_must_be_own_unused_upload() {
    let app = TestApp::new();
    let victim = new_user("victim");
    let attacker = new_user("attacker");

    let icon_id = app.upload(&victim, b"victim icon").await;
    let (status, created) = app
        .post(
            "/api/v1/servers",
            &victim,
            json!({ "name": "Victim's place", "icon_id": icon_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let victim_server = created["server_id"].as_str().unwrap().to_string();

    let (_, invite) = app
        .post(&format!("/api/v1/servers/{}/invites", victim_server), &victim, json!({}))
        .await;
    let (_, preview) = app
        .request(
            "GET",
            &format!("/api/v1/invites/{}", invite["id"].as_str().unwrap()),
            None,
            None,
        )
        .await;
    assert!(preview["server"].get("icon_id").is_none());

    // Someone else's file cannot be attached
    let (_, attacker_channel) = app.create_server(&attacker, "Lair").await;
    let (status, _) = app
        .post(
            "/api/v1/messages",
            &attacker,
            json!({
                "target": {"kind": "channel", "id": attacker_channel},
                "content": "mine now",
                "attachment_id": icon_id,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Nor can the owner reuse a file that is already in use
    let (_, victim_view) = app
        .get(&format!("/api/v1/servers/{}", victim_server), &victim)
        .await;
    let (status, _) = app
        .post(
            "/api/v1/messages",
            &victim,
            json!({
                "target": {"kind": "channel", "id": victim_view["default_channel_id"]},
                "content": "same file again",
                "attachment_id": icon_id,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, server) = app
        .get(&format!("/api/v1/servers/{}", victim_server), &victim)
        .await;
    assert_eq!(
        server["icon_url"],
        format!("{}/files/{}", PUBLIC_URL, icon_id).as_str()
    );
}

#[tokio::test]
async fn test_flagged_message_is_soft_deleted_by_moderation_job() {
    let app = TestApp::new();
    let owner = new_user("owner");
    let (_, channel_id) = app.create_server(&owner, "Moderated").await;
    let (_, me) = app.get("/api/v1/users/@me", &owner).await;
    let user_id: i64 = me["id"].as_str().unwrap().parse().unwrap();
    let target = ConversationTarget::Channel(channel_id.parse().unwrap());

    let created = app
        .state
        .messages
        .create(
            user_id,
            CreateMessageDto {
                target,
                content: "this is Forbidden talk".into(),
                attachment_id: None,
            },
        )
        .await
        .unwrap();
    for ticket in created.jobs {
        assert_eq!(ticket.outcome().await, JobOutcome::Completed);
    }

    let (status, messages) = app
        .get(
            &format!("/api/v1/messages?kind=channel&id={}", channel_id),
            &owner,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(messages[0]["deleted"], true);
    assert_eq!(messages[0]["deleted_reason"], "Removed by moderation");
    assert_eq!(messages[0]["content"], "");
}
