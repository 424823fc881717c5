//! Authentication: password hashing, session tokens, and the per-request
//! session check.

pub mod extractors;
pub mod middleware;
pub mod password;
pub mod session;
pub mod token;

use serde::Serialize;

use crate::models::User;

pub use middleware::{bearer_token, AuthMiddleware};
pub use password::PasswordHasher;
pub use session::{AuthSession, SessionVerifier};
pub use token::{Claims, TokenError, TokenIssuer};

/// Response body after sign-up or login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    /// Bearer token for this device's session.
    pub token: String,
}
