//! Friend and Direct Message API Tests

use axum::http::StatusCode;
use serde_json::json;

use crate::common::{new_user, token_for, unique_subject, TestApp};

/// Provision the user behind `token` and return its id.
async fn user_id(app: &TestApp, token: &str) -> String {
    let (status, me) = app.get("/api/v1/users/@me", token).await;
    assert_eq!(status, StatusCode::OK);
    me["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_friend_request_accept_flow() {
    let app = TestApp::new();
    let alice = new_user("alice");
    let bob = new_user("bob");
    user_id(&app, &bob).await;

    let (status, request) = app
        .post("/api/v1/friends", &alice, json!({ "username": "bob" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request["status"], "pending");
    let friend_id = request["id"].as_str().unwrap();

    let (_, pending) = app.get("/api/v1/friends/pending", &bob).await;
    assert_eq!(pending.as_array().unwrap().len(), 1);
    assert_eq!(pending[0]["user"]["username"], "alice");

    // The requester cannot accept on the recipient's behalf
    let (status, _) = app
        .request(
            "PATCH",
            &format!("/api/v1/friends/{}", friend_id),
            Some(&alice),
            Some(json!({ "status": "accepted" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(
            "PATCH",
            &format!("/api/v1/friends/{}", friend_id),
            Some(&bob),
            Some(json!({ "status": "accepted" })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, friends) = app.get("/api/v1/friends", &alice).await;
    assert_eq!(friends.as_array().unwrap().len(), 1);
    assert_eq!(friends[0]["user"]["username"], "bob");

    let (_, pending) = app.get("/api/v1/friends/pending", &bob).await;
    assert!(pending.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_friend_request_errors() {
    let app = TestApp::new();
    let alice = new_user("alice");
    let bob = new_user("bob");
    user_id(&app, &alice).await;
    user_id(&app, &bob).await;

    let (status, _) = app
        .post("/api/v1/friends", &alice, json!({ "username": "nobody" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post("/api/v1/friends", &alice, json!({ "username": "alice" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/api/v1/friends", &alice, json!({ "username": "bob" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .post("/api/v1/friends", &bob, json!({ "username": "alice" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_direct_message_open_is_idempotent() {
    let app = TestApp::new();
    let alice = new_user("alice");
    let bob = new_user("bob");
    let bob_id = user_id(&app, &bob).await;
    let alice_id = user_id(&app, &alice).await;

    let (status, first) = app
        .post("/api/v1/dms", &alice, json!({ "user_id": bob_id }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["user"]["username"], "bob");

    let (_, second) = app
        .post("/api/v1/dms", &bob, json!({ "user_id": alice_id }))
        .await;
    assert_eq!(first["id"], second["id"]);

    let (_, list) = app.get("/api/v1/dms", &alice).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let dm_id = first["id"].as_str().unwrap();
    let (status, _) = app
        .post(
            "/api/v1/messages",
            &bob,
            json!({ "target": {"kind": "direct_message", "id": dm_id}, "content": "hey" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, messages) = app
        .get(
            &format!("/api/v1/messages?kind=direct_message&id={}", dm_id),
            &alice,
        )
        .await;
    assert_eq!(messages[0]["content"], "hey");
}

#[tokio::test]
async fn test_direct_message_outsider_is_forbidden() {
    let app = TestApp::new();
    let alice = new_user("alice");
    let bob = new_user("bob");
    let eve = new_user("eve");
    let bob_id = user_id(&app, &bob).await;

    let (_, dm) = app
        .post("/api/v1/dms", &alice, json!({ "user_id": bob_id }))
        .await;
    let dm_id = dm["id"].as_str().unwrap();

    let (status, _) = app.get(&format!("/api/v1/dms/{}", dm_id), &eve).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .get(
            &format!("/api/v1/messages?kind=dm&id={}", dm_id),
            &eve,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_cannot_open_direct_message_with_self() {
    let app = TestApp::new();
    let alice = new_user("alice");
    let alice_id = user_id(&app, &alice).await;

    let (status, _) = app
        .post("/api/v1/dms", &alice, json!({ "user_id": alice_id }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_direct_message_survives_deleted_participant() {
    let app = TestApp::new();
    let alice = new_user("alice");
    let bob_subject = unique_subject();
    let bob = token_for(&bob_subject, "bob", None);
    let bob_id = user_id(&app, &bob).await;

    let (_, dm) = app
        .post("/api/v1/dms", &alice, json!({ "user_id": bob_id }))
        .await;
    let dm_id = dm["id"].as_str().unwrap().to_string();
    app.post(
        "/api/v1/messages",
        &bob,
        json!({ "target": {"kind": "direct_message", "id": dm_id}, "content": "bye" }),
    )
    .await;

    assert!(app
        .state
        .users
        .remove_by_external_id(&bob_subject)
        .await
        .unwrap());

    let (status, dm) = app.get(&format!("/api/v1/dms/{}", dm_id), &alice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dm["user"]["id"], bob_id.as_str());
    assert_eq!(dm["user"]["username"], "Deleted User");

    let (_, list) = app.get("/api/v1/dms", &alice).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, messages) = app
        .get(
            &format!("/api/v1/messages?kind=direct_message&id={}", dm_id),
            &alice,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(messages[0]["content"], "bye");
}
