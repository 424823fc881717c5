//! In-process stores backed by `tokio::sync::RwLock`.
//!
//! Used by the test suite and by `STORE=memory`. Each method holds the lock for
//! a single read-modify-write, mirroring the per-row atomicity of the Postgres store.

use async_trait::async_trait;
use chrono::Utc;
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{TaskStore, UserStore};
use crate::error::AppError;
use crate::models::{
    AvatarSet, NewUser, Session, SortDirection, Task, TaskListOptions, TaskSortField, TaskUpdate,
    User, UserChanges,
};

fn email_taken(users: &HashMap<Uuid, User>, email: &str, except: Option<Uuid>) -> bool {
    users
        .values()
        .any(|user| Some(user.id) != except && user.email.eq_ignore_ascii_case(email))
}

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn modify<F>(&self, id: Uuid, change: F) -> Result<Option<User>, AppError>
    where
        F: FnOnce(&mut User) + Send,
    {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&id).map(|user| {
            change(user);
            user.updated_at = Utc::now();
            user.clone()
        }))
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if email_taken(&users, &user.email, None) {
            return Err(AppError::ValidationError("Email is already in use".into()));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            age: user.age,
            avatar: None,
            sessions: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_session(&self, id: Uuid, token: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .read()
            .await
            .get(&id)
            .filter(|user| user.has_session(token))
            .cloned())
    }

    async fn add_session(&self, id: Uuid, token: &str) -> Result<Option<User>, AppError> {
        self.modify(id, |user| {
            if !user.has_session(token) {
                user.sessions.push(Session {
                    token: token.to_string(),
                });
            }
        })
        .await
    }

    async fn remove_session(&self, id: Uuid, token: &str) -> Result<Option<User>, AppError> {
        self.modify(id, |user| user.sessions.retain(|session| session.token != token))
            .await
    }

    async fn remove_all_sessions(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.modify(id, |user| user.sessions.clear()).await
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, AppError> {
        let mut users = self.users.write().await;
        if let Some(email) = &changes.email {
            if email_taken(&users, email, Some(id)) {
                return Err(AppError::ValidationError("Email is already in use".into()));
            }
        }
        Ok(users.get_mut(&id).map(|user| {
            if let Some(name) = changes.name {
                user.name = name;
            }
            if let Some(email) = changes.email {
                user.email = email;
            }
            if let Some(password_hash) = changes.password_hash {
                user.password_hash = password_hash;
            }
            if let Some(age) = changes.age {
                user.age = age;
            }
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn set_avatar(
        &self,
        id: Uuid,
        avatar: Option<AvatarSet>,
    ) -> Result<Option<User>, AppError> {
        self.modify(id, |user| user.avatar = avatar).await
    }

    async fn delete(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.write().await.remove(&id))
    }
}

#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<Vec<Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn compare_tasks(a: &Task, b: &Task, field: TaskSortField) -> Ordering {
    match field {
        TaskSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        TaskSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        TaskSortField::Description => a.description.cmp(&b.description),
        TaskSortField::Completed => a.completed.cmp(&b.completed),
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn insert(&self, task: Task) -> Result<Task, AppError> {
        self.tasks.write().await.push(task.clone());
        Ok(task)
    }

    async fn find(&self, owner: Uuid, options: &TaskListOptions) -> Result<Vec<Task>, AppError> {
        let tasks = self.tasks.read().await;
        let mut owned: Vec<Task> = tasks
            .iter()
            .filter(|task| task.owner == owner)
            .filter(|task| options.completed.map_or(true, |done| task.completed == done))
            .cloned()
            .collect();

        // Ties fall back to ascending id, matching the Postgres store.
        owned.sort_by(|a, b| {
            let ordering = compare_tasks(a, b, options.sort.field);
            let ordering = match options.sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            ordering.then_with(|| a.id.cmp(&b.id))
        });

        let skip = usize::try_from(options.skip).unwrap_or(0);
        let limit = options
            .limit
            .and_then(|limit| usize::try_from(limit).ok())
            .unwrap_or(usize::MAX);
        Ok(owned.into_iter().skip(skip).take(limit).collect())
    }

    async fn find_by_id(&self, owner: Uuid, id: Uuid) -> Result<Option<Task>, AppError> {
        Ok(self
            .tasks
            .read()
            .await
            .iter()
            .find(|task| task.id == id && task.owner == owner)
            .cloned())
    }

    async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        update: TaskUpdate,
    ) -> Result<Option<Task>, AppError> {
        let mut tasks = self.tasks.write().await;
        Ok(tasks
            .iter_mut()
            .find(|task| task.id == id && task.owner == owner)
            .map(|task| {
                if let Some(description) = update.description {
                    task.description = description;
                }
                if let Some(completed) = update.completed {
                    task.completed = completed;
                }
                task.updated_at = Utc::now();
                task.clone()
            }))
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<Option<Task>, AppError> {
        let mut tasks = self.tasks.write().await;
        let position = tasks
            .iter()
            .position(|task| task.id == id && task.owner == owner);
        Ok(position.map(|index| tasks.remove(index)))
    }

    async fn delete_all(&self, owner: Uuid) -> Result<u64, AppError> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|task| task.owner != owner);
        Ok((before - tasks.len()) as u64)
    }
}
