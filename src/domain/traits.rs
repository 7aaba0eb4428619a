//! Contracts for the external collaborators the service talks to: the file
//! store, the identity provider and the media provider.
//!
//! Implementations live in the infrastructure layer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// A short-lived location a client may upload one file to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Blob storage for attachments and server icons.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Issue a signed upload location bound to the uploading user.
    async fn generate_upload_url(&self, owner_id: i64) -> Result<UploadUrl, AppError>;

    /// Accept the bytes for an upload ticket and return the new file id.
    async fn store(&self, ticket: &str, data: Vec<u8>) -> Result<String, AppError>;

    /// Bind an uploaded file to a single message or server icon.
    ///
    /// Returns `false` when the file is unknown, was uploaded by someone else,
    /// or has already been claimed.
    async fn claim(&self, file_id: &str, owner_id: i64) -> Result<bool, AppError>;

    /// Public URL of a stored file, `None` when the id is unknown.
    async fn get_url(&self, file_id: &str) -> Result<Option<String>, AppError>;

    /// Raw bytes of a stored file.
    async fn read(&self, file_id: &str) -> Result<Option<Vec<u8>>, AppError>;

    /// Remove a stored file. Unknown ids are ignored.
    async fn delete(&self, file_id: &str) -> Result<(), AppError>;
}

/// Verified claims of an identity-provider session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExternalIdentity {
    /// Provider subject, stable per account
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Verifies bearer tokens issued by the identity provider.
pub trait IdentityProvider: Send + Sync {
    fn verify(&self, token: &str) -> Result<ExternalIdentity, AppError>;
}

/// Grant placed into a media-room access token.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceGrant {
    /// Participant identity
    pub identity: String,
    /// Display name
    pub name: String,
    /// Room to join
    pub room: String,
}

/// Mints access tokens for the real-time media provider.
pub trait VoiceTokenMinter: Send + Sync {
    fn mint(&self, grant: &VoiceGrant) -> Result<String, AppError>;
}
