//! Voice Token API Tests

use axum::http::StatusCode;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::Value;

use crate::common::{new_user, test_settings, TestApp};

const API_KEY: &str = "APIkey123";
const API_SECRET: &str = "voice-secret-for-tests";

fn configured_app() -> TestApp {
    let mut settings = test_settings();
    settings.voice.api_key = Some(API_KEY.into());
    settings.voice.api_secret = Some(API_SECRET.into());
    TestApp::with_settings(settings)
}

#[tokio::test]
async fn test_missing_server_id_is_bad_request() {
    let app = configured_app();
    let user = new_user("caller");

    let (status, body) = app.get("/api/voice-token", &user).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing serverId");

    let (status, _) = app.get("/api/voice-token?serverId=abc", &user).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unconfigured_credentials_are_server_error() {
    let app = TestApp::new();
    let user = new_user("caller");
    let (server_id, _) = app.create_server(&user, "Voice").await;

    let (status, body) = app
        .get(&format!("/api/voice-token?serverId={}", server_id), &user)
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_voice_token_requires_membership() {
    let app = configured_app();
    let owner = new_user("owner");
    let stranger = new_user("stranger");
    let (server_id, _) = app.create_server(&owner, "Voice").await;

    let (status, _) = app
        .get(&format!("/api/voice-token?serverId={}", server_id), &stranger)
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_member_gets_token_for_server_room() {
    let app = configured_app();
    let owner = new_user("speaker");
    let (server_id, _) = app.create_server(&owner, "Voice").await;

    let (status, body) = app
        .get(&format!("/api/voice-token?serverId={}", server_id), &owner)
        .await;
    assert_eq!(status, StatusCode::OK);

    let token = body["token"].as_str().unwrap();
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[API_KEY]);
    let claims = decode::<Value>(
        token,
        &DecodingKey::from_secret(API_SECRET.as_bytes()),
        &validation,
    )
    .unwrap()
    .claims;

    assert_eq!(claims["name"], "speaker");
    assert_eq!(claims["video"]["room"], server_id.as_str());
    assert_eq!(claims["video"]["roomJoin"], true);
}
