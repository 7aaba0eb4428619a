//! Common Test Utilities
//!
//! Shared helpers, fixtures, and test infrastructure.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chat_starter::config::*;
use chat_starter::infrastructure::identity::IdentityClaims;
use chat_starter::infrastructure::storage::{MemoryFileStorage, TicketSigner};
use chat_starter::startup::{build_router, AppState};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use tower::ServiceExt;

pub const IDENTITY_SECRET: &str = "integration-test-identity-secret-0123456789";
pub const WEBHOOK_SECRET: &str = "integration-test-webhook-secret";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const PUBLIC_URL: &str = "http://chat.test";

/// Settings for the in-memory backend.
pub fn test_settings() -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".into(),
            port: 0,
            default_view: "/dms".into(),
            public_url: PUBLIC_URL.into(),
        },
        storage: StorageSettings {
            backend: StorageBackend::Memory,
            files_dir: PathBuf::from("data/files"),
            upload_ticket_ttl_secs: 300,
            signing_secret: "integration-test-signing-secret".into(),
        },
        database: DatabaseSettings {
            url: "postgres://unused".into(),
            max_connections: 1,
            min_connections: 1,
            acquire_timeout: 1,
        },
        redis: RedisSettings {
            url: "redis://unused".into(),
        },
        auth: AuthSettings {
            identity_secret: IDENTITY_SECRET.into(),
            issuer: None,
            webhook_secret: WEBHOOK_SECRET.into(),
        },
        admin: AdminSettings {
            emails: vec![ADMIN_EMAIL.into()],
        },
        voice: VoiceSettings {
            api_key: None,
            api_secret: None,
            token_ttl_secs: 3600,
        },
        typing: TypingSettings { ttl_secs: 5 },
        jobs: JobSettings { queue_capacity: 64 },
        moderation: ModerationSettings {
            blocked_terms: vec!["forbidden".into()],
            reason: "Removed by moderation".into(),
        },
        snowflake: SnowflakeSettings {
            machine_id: 1,
            epoch: 1_420_070_400_000,
        },
        cors: CorsSettings {
            allowed_origins: vec![],
        },
        environment: "test".into(),
    }
}

/// Test application builder
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Application over a fresh in-memory store
    pub fn new() -> Self {
        Self::with_settings(test_settings())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let signer = TicketSigner::new(
            &settings.storage.signing_secret,
            settings.storage.upload_ticket_ttl_secs,
        );
        let files = Arc::new(MemoryFileStorage::new(&settings.server.public_url, signer));
        let state = AppState::in_memory(settings, files);

        Self {
            router: build_router(state.clone()),
            state,
        }
    }

    /// Send a request and decode the JSON body (`Null` when empty).
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request("GET", uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request("DELETE", uri, Some(token), None).await
    }

    /// Raw request, for bodies that are not JSON.
    pub async fn send(&self, request: Request<Body>) -> axum::response::Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Upload `bytes` through the ticket flow and return the storage id.
    pub async fn upload(&self, token: &str, bytes: &'static [u8]) -> String {
        let (status, body) = self
            .request("POST", "/api/v1/storage/upload-url", Some(token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["expires_at"].is_string());
        let path = body["url"]
            .as_str()
            .unwrap()
            .strip_prefix(PUBLIC_URL)
            .unwrap()
            .to_string();

        let response = self
            .send(
                Request::builder()
                    .method("PUT")
                    .uri(path)
                    .body(Body::from(bytes))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let stored: Value = serde_json::from_slice(&body).unwrap();
        stored["storageId"].as_str().unwrap().to_string()
    }

    /// Create a server as `token`; returns (server_id, default_channel_id).
    pub async fn create_server(&self, token: &str, name: &str) -> (String, String) {
        let (status, body) = self
            .post("/api/v1/servers", token, serde_json::json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create server failed: {}", body);
        (
            body["server_id"].as_str().unwrap().to_string(),
            body["default_channel_id"].as_str().unwrap().to_string(),
        )
    }
}

/// Identity-provider session token for `subject`.
pub fn token_for(subject: &str, name: &str, email: Option<&str>) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = IdentityClaims {
        sub: subject.to_string(),
        exp: now + 3600,
        iat: Some(now),
        iss: None,
        email: email.map(str::to_string),
        name: Some(name.to_string()),
        picture: None,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(IDENTITY_SECRET.as_bytes()),
    )
    .unwrap()
}

/// Generate a unique provider subject
pub fn unique_subject() -> String {
    format!("ext_{}", uuid::Uuid::new_v4().simple())
}

/// Token for a fresh user called `name`
pub fn new_user(name: &str) -> String {
    token_for(&unique_subject(), name, None)
}
