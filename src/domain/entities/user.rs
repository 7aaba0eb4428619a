//! User entity and repository trait.
//!
//! Maps to the `users` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// User role matching the `role` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl UserRole {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "admin" => Self::Admin,
            _ => Self::User,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents a user account in the chat system.
///
/// Users are provisioned from the identity provider; `external_id` is the
/// provider's subject and is unique.
///
/// Maps to the `users` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - username: VARCHAR(64) NOT NULL
/// - image: TEXT NOT NULL
/// - external_id: TEXT NOT NULL UNIQUE
/// - email: TEXT NULL
/// - role: VARCHAR(16) NOT NULL DEFAULT 'user'
/// - is_private: BOOLEAN NOT NULL DEFAULT FALSE
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Snowflake ID (primary key)
    pub id: i64,

    /// Display username
    pub username: String,

    /// Avatar image URL
    pub image: String,

    /// Identity provider subject
    pub external_id: String,

    /// Email address, when the provider shared one
    pub email: Option<String>,

    /// Application role
    #[serde(default)]
    pub role: UserRole,

    /// Hidden from the public user directory
    #[serde(default)]
    pub is_private: bool,

    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Display name used for accounts that no longer exist.
const DELETED_USERNAME: &str = "Deleted User";

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Stand-in for a participant whose account was deleted.
    pub fn deleted(id: i64) -> Self {
        Self {
            id,
            username: DELETED_USERNAME.to_string(),
            is_private: true,
            ..Default::default()
        }
    }
}

impl Default for User {
    fn default() -> Self {
        Self {
            id: 0,
            username: String::new(),
            image: String::new(),
            external_id: String::new(),
            email: None,
            role: UserRole::default(),
            is_private: false,
            created_at: Utc::now(),
        }
    }
}

/// Repository trait for User data access operations.
///
/// Implementations of this trait handle the actual storage interactions.
/// The trait is defined in the domain layer to maintain dependency inversion.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by their Snowflake ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    /// Find several users at once. Unknown ids are skipped.
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<User>, AppError>;

    /// Find a user by identity provider subject.
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, AppError>;

    /// Find a user by username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// List every user.
    async fn list_all(&self) -> Result<Vec<User>, AppError>;

    /// List users by privacy flag.
    async fn list_by_privacy(&self, is_private: bool) -> Result<Vec<User>, AppError>;

    /// Create a new user.
    async fn create(&self, user: &User) -> Result<User, AppError>;

    /// Persist the profile fields of a user: username, image, email and role.
    async fn update(&self, user: &User) -> Result<User, AppError>;

    /// Change only the privacy flag.
    async fn set_privacy(&self, id: i64, is_private: bool) -> Result<User, AppError>;

    /// Delete a user.
    async fn delete(&self, id: i64) -> Result<(), AppError>;
}
