//! Identity Webhook API Tests

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

use crate::common::{token_for, TestApp, WEBHOOK_SECRET};

fn sign(body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

fn webhook(body: &serde_json::Value, signature: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhooks/identity")
        .header("Content-Type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header("x-webhook-signature", signature);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_unsigned_webhook_is_rejected() {
    let app = TestApp::new();
    let event = json!({ "type": "user.created", "data": { "id": "ext_1" } });

    let response = app.send(webhook(&event, None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.send(webhook(&event, Some("deadbeef".into()))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_created_user_is_visible_and_deleted_user_is_gone() {
    let app = TestApp::new();
    let viewer = token_for("ext_viewer", "viewer", None);

    let created = json!({
        "type": "user.created",
        "data": {
            "id": "ext_hook",
            "username": "hooked",
            "image_url": "https://img.test/hooked.png",
            "email_addresses": [{ "email_address": "hooked@example.com" }]
        }
    });
    let signature = sign(created.to_string().as_bytes());
    let response = app.send(webhook(&created, Some(signature))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let (_, public) = app.get("/api/v1/users/public", &viewer).await;
    assert!(public
        .as_array()
        .unwrap()
        .iter()
        .any(|u| u["username"] == "hooked" && u["image"] == "https://img.test/hooked.png"));

    let deleted = json!({ "type": "user.deleted", "data": { "id": "ext_hook" } });
    let signature = sign(deleted.to_string().as_bytes());
    let response = app.send(webhook(&deleted, Some(signature))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let (_, public) = app.get("/api/v1/users/public", &viewer).await;
    assert!(!public
        .as_array()
        .unwrap()
        .iter()
        .any(|u| u["username"] == "hooked"));
}

#[tokio::test]
async fn test_unknown_event_is_ignored() {
    let app = TestApp::new();
    let event = json!({ "type": "session.created", "data": { "id": "sess_1" } });
    let signature = sign(event.to_string().as_bytes());

    let response = app.send(webhook(&event, Some(signature))).await;

    assert_eq!(response.status(), StatusCode::OK);
}
