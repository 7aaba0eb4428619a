//! User Directory and Admin API Tests

use axum::http::StatusCode;
use serde_json::json;

use crate::common::{new_user, token_for, unique_subject, TestApp, ADMIN_EMAIL};

#[tokio::test]
async fn test_first_request_provisions_user() {
    let app = TestApp::new();
    let token = token_for(&unique_subject(), "Grace Hopper", Some("grace@example.com"));

    let (status, me) = app.get("/api/v1/users/@me", &token).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "Grace Hopper");
    assert_eq!(me["email"], "grace@example.com");
    assert_eq!(me["role"], "user");

    let (_, again) = app.get("/api/v1/users/@me", &token).await;
    assert_eq!(me["id"], again["id"]);
}

#[tokio::test]
async fn test_allow_listed_email_is_admin() {
    let app = TestApp::new();
    let admin = token_for(&unique_subject(), "root", Some(ADMIN_EMAIL));
    let user = new_user("plain");

    let (_, body) = app.get("/api/v1/users/@me/admin", &admin).await;
    assert_eq!(body["is_admin"], true);

    let (_, body) = app.get("/api/v1/users/@me/admin", &user).await;
    assert_eq!(body["is_admin"], false);

    let (status, _) = app.get("/api/v1/users", &user).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, users) = app.get("/api/v1/users", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_private_users_hidden_from_public_list() {
    let app = TestApp::new();
    let shy = new_user("shy");
    let open = new_user("open");
    app.get("/api/v1/users/@me", &open).await;

    let (status, me) = app
        .request(
            "PATCH",
            "/api/v1/users/@me/privacy",
            Some(&shy),
            Some(json!({ "is_private": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["is_private"], true);

    let (_, public) = app.get("/api/v1/users/public", &open).await;
    let names: Vec<_> = public
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["open".to_string()]);

    let (_, visible) = app.get("/api/v1/users/visible", &shy).await;
    assert_eq!(visible.as_array().unwrap().len(), 2);

    let (status, _) = app.get("/api/v1/users/private", &open).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_email_is_hidden_from_other_users() {
    let app = TestApp::new();
    let alice = token_for(&unique_subject(), "alice", Some("alice@example.com"));
    let bob = new_user("bob");
    app.get("/api/v1/users/@me", &alice).await;

    let (_, public) = app.get("/api/v1/users/public", &bob).await;
    let alice_entry = public
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["username"] == "alice")
        .cloned()
        .unwrap();

    assert!(alice_entry.get("email").is_none());
}

#[tokio::test]
async fn test_sync_email_requires_claim() {
    let app = TestApp::new();
    let no_email = new_user("anon");

    let (status, _) = app
        .request("POST", "/api/v1/users/@me/email/sync", Some(&no_email), None)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_sets_email_and_grants_role() {
    let app = TestApp::new();
    let admin = token_for(&unique_subject(), "root", Some(ADMIN_EMAIL));
    let user = new_user("promoted");
    let (_, me) = app.get("/api/v1/users/@me", &user).await;
    let user_id = me["id"].as_str().unwrap();

    let (status, updated) = app
        .request(
            "PUT",
            &format!("/api/v1/users/{}/email", user_id),
            Some(&admin),
            Some(json!({ "email": ADMIN_EMAIL })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["role"], "admin");

    let (status, _) = app
        .request(
            "PUT",
            &format!("/api/v1/users/{}/email", user_id),
            Some(&admin),
            Some(json!({ "email": "not-an-email" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_direct_message_lands_in_conversation() {
    let app = TestApp::new();
    let admin = token_for(&unique_subject(), "root", Some(ADMIN_EMAIL));
    let user = new_user("recipient");
    let (_, me) = app.get("/api/v1/users/@me", &user).await;

    let (status, created) = app
        .post(
            "/api/v1/admin/direct-messages",
            &admin,
            json!({ "user_id": me["id"], "content": "Welcome aboard" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created["id"].is_string());

    let (_, dms) = app.get("/api/v1/dms", &user).await;
    let dm_id = dms[0]["id"].as_str().unwrap();
    let (_, messages) = app
        .get(
            &format!("/api/v1/messages?kind=direct_message&id={}", dm_id),
            &user,
        )
        .await;
    assert_eq!(messages[0]["content"], "Welcome aboard");
    assert_eq!(messages[0]["sender"]["username"], "root");

    let (status, _) = app
        .post(
            "/api/v1/admin/direct-messages",
            &user,
            json!({ "user_id": me["id"], "content": "nope" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
