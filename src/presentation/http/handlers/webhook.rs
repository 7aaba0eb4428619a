//! Identity Provider Webhook
//!
//! Receives user lifecycle events and mirrors them into the user table.
//! The request body is authenticated with a hex HMAC-SHA256 signature in
//! the `x-webhook-signature` header.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::application::services::UpsertUserDto;
use crate::shared::error::AppError;
use crate::startup::AppState;

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Deserialize)]
struct IdentityEvent {
    #[serde(rename = "type")]
    kind: String,
    data: IdentityEventData,
}

#[derive(Debug, Deserialize)]
struct IdentityEventData {
    id: String,
    username: Option<String>,
    first_name: Option<String>,
    image_url: Option<String>,
    #[serde(default)]
    email_addresses: Vec<EmailAddress>,
}

#[derive(Debug, Deserialize)]
struct EmailAddress {
    email_address: String,
}

impl IdentityEventData {
    fn into_profile(self) -> UpsertUserDto {
        let present = |name: &String| !name.trim().is_empty();
        let username = self
            .username
            .filter(present)
            .or_else(|| self.first_name.filter(present))
            .unwrap_or_else(|| "user".to_string());

        UpsertUserDto {
            external_id: self.id,
            username,
            image: self.image_url.unwrap_or_default(),
            email: self.email_addresses.into_iter().next().map(|e| e.email_address),
        }
    }
}

/// Check a hex HMAC-SHA256 signature of `body` in constant time.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Handle an identity-provider event
pub async fn identity_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing webhook signature".into()))?;

    if !verify_signature(&state.settings.auth.webhook_secret, &body, signature) {
        tracing::warn!("Rejected webhook with bad signature");
        return Err(AppError::Unauthorized("Invalid webhook signature".into()));
    }

    let event: IdentityEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::InvalidInput(format!("Malformed webhook payload: {}", e)))?;

    match event.kind.as_str() {
        "user.created" | "user.updated" => {
            let user = state.users.upsert(event.data.into_profile()).await?;
            tracing::info!(user_id = user.id, kind = %event.kind, "Identity synced");
        }
        "user.deleted" => {
            let removed = state.users.remove_by_external_id(&event.data.id).await?;
            tracing::info!(external_id = %event.data.id, removed, "Identity deleted");
        }
        other => {
            tracing::debug!(kind = %other, "Ignoring webhook event");
        }
    }

    Ok(StatusCode::OK)
}
