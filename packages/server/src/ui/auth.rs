//! Bearer token authentication for the HTTP API.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::{
    domain::{IdentityError, UserId},
    ui::{error::ApiError, state::AppState},
};

/// The caller of an authenticated endpoint
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserId);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split_whitespace().nth(1))
            .ok_or(IdentityError::MissingCredential)?;

        let user = state
            .identity
            .verify_token(token)
            .await
            .inspect_err(|e| tracing::debug!(error = %e, "rejected bearer token"))?;
        Ok(Self(user))
    }
}
