//! Persistence boundary.
//!
//! Every task operation takes the owner id as a required argument, so a store
//! call can never be made without the ownership constraint. Operations that
//! address a single record return `Ok(None)` when nothing matched; callers turn
//! that into a not-found error.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{AvatarSet, NewUser, Task, TaskListOptions, TaskUpdate, User, UserChanges};

pub use memory::{MemoryTaskStore, MemoryUserStore};
pub use postgres::{PgTaskStore, PgUserStore};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persists a new user with an empty session list.
    async fn create(&self, user: NewUser) -> Result<User, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Case-insensitive lookup.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Finds the user with this id whose session list contains `token`, in one lookup.
    async fn find_by_session(&self, id: Uuid, token: &str) -> Result<Option<User>, AppError>;

    /// Appends `token` unless it is already present.
    async fn add_session(&self, id: Uuid, token: &str) -> Result<Option<User>, AppError>;

    /// Removes every entry equal to `token`.
    async fn remove_session(&self, id: Uuid, token: &str) -> Result<Option<User>, AppError>;

    async fn remove_all_sessions(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, AppError>;

    async fn set_avatar(
        &self,
        id: Uuid,
        avatar: Option<AvatarSet>,
    ) -> Result<Option<User>, AppError>;

    /// Deletes the user together with its session list.
    async fn delete(&self, id: Uuid) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert(&self, task: Task) -> Result<Task, AppError>;

    async fn find(&self, owner: Uuid, options: &TaskListOptions) -> Result<Vec<Task>, AppError>;

    async fn find_by_id(&self, owner: Uuid, id: Uuid) -> Result<Option<Task>, AppError>;

    async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        update: TaskUpdate,
    ) -> Result<Option<Task>, AppError>;

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<Option<Task>, AppError>;

    /// Deletes every task owned by `owner`, returning how many were removed.
    async fn delete_all(&self, owner: Uuid) -> Result<u64, AppError>;
}
