//! Identity Service
//!
//! Resolves identity-provider bearer tokens to internal users, provisioning
//! an account the first time a subject is seen.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, instrument};

use crate::domain::services::AdminAllowList;
use crate::domain::traits::{ExternalIdentity, IdentityProvider};
use crate::domain::{User, UserRepository};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// A verified caller.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub identity: ExternalIdentity,
}

/// Identity service trait
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Verify a bearer token and return the caller.
    async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, IdentityError>;
}

/// Identity service errors
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Invalid or expired token")]
    InvalidToken,

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidToken => AppError::Unauthorized(err.to_string()),
            IdentityError::Store(e) => e,
        }
    }
}

/// IdentityService implementation
pub struct IdentityServiceImpl {
    provider: Arc<dyn IdentityProvider>,
    user_repo: Arc<dyn UserRepository>,
    admins: AdminAllowList,
    id_generator: Arc<SnowflakeGenerator>,
}

impl IdentityServiceImpl {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        user_repo: Arc<dyn UserRepository>,
        admins: AdminAllowList,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            provider,
            user_repo,
            admins,
            id_generator,
        }
    }

    async fn provision(&self, identity: &ExternalIdentity) -> Result<User, AppError> {
        let user = User {
            id: self.id_generator.generate(),
            username: derive_username(identity),
            image: identity.picture.clone().unwrap_or_default(),
            external_id: identity.subject.clone(),
            email: identity.email.clone(),
            role: self.admins.role_for(identity.email.as_deref()),
            is_private: false,
            created_at: Utc::now(),
        };

        match self.user_repo.create(&user).await {
            Ok(created) => {
                info!(user_id = created.id, "Provisioned user");
                Ok(created)
            }
            // Lost a race with a concurrent first request for the same subject
            Err(AppError::AlreadyExists(_)) => self
                .user_repo
                .find_by_external_id(&identity.subject)
                .await?
                .ok_or_else(|| AppError::Internal("user vanished after conflict".into())),
            Err(e) => Err(e),
        }
    }
}

/// Username for a freshly provisioned account.
pub fn derive_username(identity: &ExternalIdentity) -> String {
    if let Some(name) = identity.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        return name.to_string();
    }
    if let Some(local) = identity
        .email
        .as_deref()
        .and_then(|e| e.split('@').next())
        .filter(|l| !l.is_empty())
    {
        return local.to_string();
    }
    let prefix: String = identity.subject.chars().take(8).collect();
    format!("user-{}", prefix)
}

#[async_trait]
impl IdentityService for IdentityServiceImpl {
    #[instrument(skip_all)]
    async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, IdentityError> {
        let identity = self.provider.verify(token).map_err(|e| match e {
            AppError::Unauthorized(_) => IdentityError::InvalidToken,
            other => IdentityError::Store(other),
        })?;

        let user = match self.user_repo.find_by_external_id(&identity.subject).await? {
            Some(user) => user,
            None => self.provision(&identity).await?,
        };

        Ok(AuthenticatedUser { user, identity })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Some("Ada"), Some("ada@example.com"), "Ada" ; "name claim wins")]
    #[test_case(None, Some("grace@example.com"), "grace" ; "email local part")]
    #[test_case(Some("  "), None, "user-abcdefgh" ; "subject prefix")]
    fn test_derive_username(name: Option<&str>, email: Option<&str>, expected: &str) {
        let identity = ExternalIdentity {
            subject: "abcdefghijkl".into(),
            email: email.map(String::from),
            name: name.map(String::from),
            picture: None,
        };
        assert_eq!(derive_username(&identity), expected);
    }
}
