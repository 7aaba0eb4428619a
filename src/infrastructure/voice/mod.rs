//! LiveKit-style access token minting for voice rooms.

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::domain::traits::{VoiceGrant, VoiceTokenMinter};
use crate::shared::error::AppError;

/// Room permissions inside the token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoGrant {
    pub room: String,
    pub room_join: bool,
}

/// Access token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// API key
    pub iss: String,
    /// Participant identity
    pub sub: String,
    pub name: String,
    pub nbf: i64,
    pub exp: i64,
    pub video: VideoGrant,
}

/// Signs access tokens with the media provider's API secret.
pub struct LiveKitTokenMinter {
    api_key: String,
    key: EncodingKey,
    ttl: Duration,
}

impl LiveKitTokenMinter {
    pub fn new(api_key: &str, api_secret: &str, ttl_secs: u64) -> Self {
        Self {
            api_key: api_key.to_string(),
            key: EncodingKey::from_secret(api_secret.as_bytes()),
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }
}

impl VoiceTokenMinter for LiveKitTokenMinter {
    fn mint(&self, grant: &VoiceGrant) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            iss: self.api_key.clone(),
            sub: grant.identity.clone(),
            name: grant.name.clone(),
            nbf: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            video: VideoGrant {
                room: grant.room.clone(),
                room_join: true,
            },
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }
}
