//! Task operations scoped to the authenticated user.
//!
//! The owner id always comes from the request's `AuthSession` and is passed to
//! every store call. A task owned by someone else produces the same `NotFound`
//! as a task that does not exist.

use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthSession;
use crate::error::AppError;
use crate::models::{Task, TaskInput, TaskListOptions, TaskUpdate};
use crate::store::TaskStore;

fn task_not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

/// Parses a task id from a path segment. A malformed id cannot name an
/// existing task, so it is reported as not found.
pub fn parse_task_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| task_not_found())
}

pub struct TaskService {
    store: Arc<dyn TaskStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, session: &AuthSession, input: TaskInput) -> Result<Task, AppError> {
        let input = input.normalized();
        input.validate()?;
        self.store.insert(Task::new(input, session.user.id)).await
    }

    pub async fn list(
        &self,
        session: &AuthSession,
        options: TaskListOptions,
    ) -> Result<Vec<Task>, AppError> {
        self.store.find(session.user.id, &options).await
    }

    pub async fn get(&self, session: &AuthSession, id: Uuid) -> Result<Task, AppError> {
        self.store
            .find_by_id(session.user.id, id)
            .await?
            .ok_or_else(task_not_found)
    }

    pub async fn update(
        &self,
        session: &AuthSession,
        id: Uuid,
        update: TaskUpdate,
    ) -> Result<Task, AppError> {
        let update = update.normalized();
        update.validate()?;

        if update.is_empty() {
            return self.get(session, id).await;
        }

        self.store
            .update(session.user.id, id, update)
            .await?
            .ok_or_else(task_not_found)
    }

    pub async fn delete(&self, session: &AuthSession, id: Uuid) -> Result<Task, AppError> {
        self.store
            .delete(session.user.id, id)
            .await?
            .ok_or_else(task_not_found)
    }
}
