//! Account operations: sign-up, login, logout, and everything a user may do
//! to their own profile.
//!
//! Self-service operations take the request's `AuthSession` and address the
//! store by that session's user id only; no caller-supplied id is accepted.

use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AuthResponse, AuthSession, PasswordHasher, TokenIssuer};
use crate::avatar::{validate_image, AvatarStorage};
use crate::error::AppError;
use crate::events::{AccountEvent, EventHooks};
use crate::models::{
    normalize_email, AvatarSet, LoginRequest, NewUser, ProfileUpdate, SignUpRequest, User,
    UserChanges,
};
use crate::store::{TaskStore, UserStore};

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".into())
}

pub struct AccountService {
    users: Arc<dyn UserStore>,
    tasks: Arc<dyn TaskStore>,
    avatars: Arc<dyn AvatarStorage>,
    tokens: TokenIssuer,
    passwords: PasswordHasher,
    hooks: EventHooks,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserStore>,
        tasks: Arc<dyn TaskStore>,
        avatars: Arc<dyn AvatarStorage>,
        tokens: TokenIssuer,
        passwords: PasswordHasher,
        hooks: EventHooks,
    ) -> Self {
        Self {
            users,
            tasks,
            avatars,
            tokens,
            passwords,
            hooks,
        }
    }

    /// Appends `token` to the user's active sessions.
    pub async fn add_session(&self, user_id: Uuid, token: &str) -> Result<User, AppError> {
        self.users
            .add_session(user_id, token)
            .await?
            .ok_or_else(user_not_found)
    }

    pub async fn remove_session(&self, user_id: Uuid, token: &str) -> Result<User, AppError> {
        self.users
            .remove_session(user_id, token)
            .await?
            .ok_or_else(user_not_found)
    }

    pub async fn remove_all_sessions(&self, user_id: Uuid) -> Result<User, AppError> {
        self.users
            .remove_all_sessions(user_id)
            .await?
            .ok_or_else(user_not_found)
    }

    async fn start_session(&self, user_id: Uuid) -> Result<AuthResponse, AppError> {
        let token = self.tokens.issue(user_id)?;
        let user = self.add_session(user_id, &token).await?;
        Ok(AuthResponse { user, token })
    }

    pub async fn sign_up(&self, request: SignUpRequest) -> Result<AuthResponse, AppError> {
        let request = request.normalized();
        request.validate()?;

        let user = self
            .users
            .create(NewUser {
                name: request.name,
                email: request.email,
                password_hash: self.passwords.hash(&request.password)?,
                age: request.age.unwrap_or(0),
            })
            .await?;

        let response = self.start_session(user.id).await?;
        self.hooks.emit(AccountEvent::SignedUp { user_id: user.id });
        Ok(response)
    }

    /// Unknown email and wrong password fail the same way.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AppError> {
        let user = self
            .users
            .find_by_email(&normalize_email(&request.email))
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !self.passwords.compare(&request.password, &user.password_hash) {
            return Err(AppError::Unauthorized);
        }

        let response = self.start_session(user.id).await?;
        self.hooks.emit(AccountEvent::LoggedIn { user_id: user.id });
        Ok(response)
    }

    /// Revokes only the token used for this request.
    pub async fn logout(&self, session: &AuthSession) -> Result<(), AppError> {
        self.remove_session(session.user.id, &session.token).await?;
        self.hooks.emit(AccountEvent::LoggedOut {
            user_id: session.user.id,
        });
        Ok(())
    }

    /// Revokes every token the user holds, on every device.
    pub async fn logout_all(&self, session: &AuthSession) -> Result<(), AppError> {
        self.remove_all_sessions(session.user.id).await?;
        self.hooks.emit(AccountEvent::LoggedOutAll {
            user_id: session.user.id,
        });
        Ok(())
    }

    pub async fn update_profile(
        &self,
        session: &AuthSession,
        update: ProfileUpdate,
    ) -> Result<User, AppError> {
        let update = update.normalized();
        update.validate()?;

        let password_hash = match update.password.as_deref() {
            Some(password) => Some(self.passwords.hash(password)?),
            None => None,
        };
        let changes = UserChanges {
            name: update.name,
            email: update.email,
            password_hash,
            age: update.age,
        };

        if changes.is_empty() {
            return Ok(session.user.clone());
        }

        self.users
            .update(session.user.id, changes)
            .await?
            .ok_or_else(user_not_found)
    }

    /// Deletes the user with its sessions, then its tasks and avatar.
    pub async fn delete_account(&self, session: &AuthSession) -> Result<User, AppError> {
        let user_id = session.user.id;
        let user = self.users.delete(user_id).await?.ok_or_else(user_not_found)?;
        self.tasks.delete_all(user_id).await?;
        if user.avatar.is_some() {
            self.avatars.remove(user_id).await?;
        }
        self.hooks.emit(AccountEvent::AccountDeleted { user_id });
        Ok(user)
    }

    pub async fn set_avatar(&self, session: &AuthSession, image: &[u8]) -> Result<User, AppError> {
        let kind = validate_image(image)?;
        let user_id = session.user.id;
        let avatar = self.avatars.save(user_id, kind, image).await?;
        self.users
            .set_avatar(user_id, Some(avatar))
            .await?
            .ok_or_else(user_not_found)
    }

    pub async fn remove_avatar(&self, session: &AuthSession) -> Result<User, AppError> {
        let user_id = session.user.id;
        let user = self
            .users
            .set_avatar(user_id, None)
            .await?
            .ok_or_else(user_not_found)?;
        self.avatars.remove(user_id).await?;
        Ok(user)
    }

    /// The caller's avatar as loaded with the session.
    pub fn avatar<'a>(&self, session: &'a AuthSession) -> Result<&'a AvatarSet, AppError> {
        session
            .user
            .avatar
            .as_ref()
            .ok_or_else(|| AppError::NotFound("Avatar not found".into()))
    }
}
