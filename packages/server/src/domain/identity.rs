//! Identity port.

use async_trait::async_trait;

use super::{error::IdentityError, value_object::UserId};

/// Resolves credentials to users and enforces bans.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify a bearer token presented on an HTTP request.
    async fn verify_token(&self, token: &str) -> Result<UserId, IdentityError>;

    /// Resolve the user id presented when a realtime connection is opened.
    ///
    /// Fails for unknown and banned users.
    async fn resolve_user(&self, user_id: &str) -> Result<UserId, IdentityError>;
}
