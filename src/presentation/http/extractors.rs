//! Custom Extractors
//!
//! Axum extractors for authentication and request parsing.

use axum::{extract::FromRequestParts, http::request::Parts, RequestPartsExt};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::domain::traits::ExternalIdentity;
use crate::domain::User;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Caller resolved from the bearer token, provisioned on first sight.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub identity: ExternalIdentity,
}

impl CurrentUser {
    pub fn id(&self) -> i64 {
        self.user.id
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::Unauthorized("Missing authorization header".into()))?;

        let authenticated = state.identity.authenticate(bearer.token()).await?;

        Ok(CurrentUser {
            user: authenticated.user,
            identity: authenticated.identity,
        })
    }
}
