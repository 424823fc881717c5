use std::sync::Arc;

use crate::auth::token::TokenIssuer;
use crate::error::AppError;
use crate::models::User;
use crate::store::UserStore;

/// The authenticated principal for one request, plus the token it presented.
///
/// Loaded once by `SessionVerifier::verify` and never refreshed for the rest
/// of the request.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

/// Decides whether a bearer token authenticates a user.
///
/// A token must carry a valid signature *and* still be listed in its
/// subject's active sessions. Revoking a session therefore invalidates the
/// token even though its signature still verifies.
#[derive(Clone)]
pub struct SessionVerifier {
    tokens: TokenIssuer,
    users: Arc<dyn UserStore>,
}

impl SessionVerifier {
    pub fn new(tokens: TokenIssuer, users: Arc<dyn UserStore>) -> Self {
        Self { tokens, users }
    }

    /// Every rejection is `AppError::Unauthorized`; store failures pass through.
    pub async fn verify(&self, token: &str) -> Result<AuthSession, AppError> {
        if token.is_empty() {
            return Err(AppError::Unauthorized);
        }

        let claims = self
            .tokens
            .decode(token)
            .map_err(|_| AppError::Unauthorized)?;

        let user = self
            .users
            .find_by_session(claims.sub, token)
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok(AuthSession {
            user,
            token: token.to_string(),
        })
    }
}
