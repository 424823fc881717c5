//! Postgres stores.
//!
//! The active-session list lives in the `users.tokens` `TEXT[]` column, so
//! append/remove/clear are single-row updates using `array_append` and
//! `array_remove` rather than whole-list replacement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{TaskStore, UserStore};
use crate::error::AppError;
use crate::models::{
    AvatarSet, NewUser, Session, SortDirection, Task, TaskListOptions, TaskUpdate, User,
    UserChanges,
};

const USER_COLUMNS: &str = "id, name, email, password_hash, age, \
     avatar_small, avatar_medium, avatar_large, tokens, created_at, updated_at";

const TASK_COLUMNS: &str = "id, description, completed, owner, created_at, updated_at";

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    age: i32,
    avatar_small: Option<String>,
    avatar_medium: Option<String>,
    avatar_large: Option<String>,
    tokens: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let avatar = match (row.avatar_small, row.avatar_medium, row.avatar_large) {
            (Some(small), Some(medium), Some(large)) => Some(AvatarSet {
                small,
                medium,
                large,
            }),
            _ => None,
        };
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            age: row.age,
            avatar,
            sessions: row
                .tokens
                .into_iter()
                .map(|token| Session { token })
                .collect(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        sql: String,
        id: Uuid,
        token: Option<&str>,
    ) -> Result<Option<User>, AppError> {
        let mut query = sqlx::query_as::<_, UserRow>(&sql).bind(id);
        if let Some(token) = token {
            query = query.bind(token);
        }
        let row = query.fetch_optional(&self.pool).await?;
        Ok(row.map(User::from))
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (id, name, email, password_hash, age) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.age)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.fetch_one_where(
            format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS),
            id,
            None,
        )
        .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE lower(email) = lower($1)",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn find_by_session(&self, id: Uuid, token: &str) -> Result<Option<User>, AppError> {
        self.fetch_one_where(
            format!(
                "SELECT {} FROM users WHERE id = $1 AND $2 = ANY(tokens)",
                USER_COLUMNS
            ),
            id,
            Some(token),
        )
        .await
    }

    async fn add_session(&self, id: Uuid, token: &str) -> Result<Option<User>, AppError> {
        self.fetch_one_where(
            format!(
                "UPDATE users SET tokens = CASE WHEN $2 = ANY(tokens) THEN tokens \
                 ELSE array_append(tokens, $2) END, updated_at = now() \
                 WHERE id = $1 RETURNING {}",
                USER_COLUMNS
            ),
            id,
            Some(token),
        )
        .await
    }

    async fn remove_session(&self, id: Uuid, token: &str) -> Result<Option<User>, AppError> {
        self.fetch_one_where(
            format!(
                "UPDATE users SET tokens = array_remove(tokens, $2), updated_at = now() \
                 WHERE id = $1 RETURNING {}",
                USER_COLUMNS
            ),
            id,
            Some(token),
        )
        .await
    }

    async fn remove_all_sessions(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.fetch_one_where(
            format!(
                "UPDATE users SET tokens = '{{}}', updated_at = now() \
                 WHERE id = $1 RETURNING {}",
                USER_COLUMNS
            ),
            id,
            None,
        )
        .await
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, AppError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE users SET updated_at = now()");
        if let Some(name) = changes.name {
            builder.push(", name = ").push_bind(name);
        }
        if let Some(email) = changes.email {
            builder.push(", email = ").push_bind(email);
        }
        if let Some(password_hash) = changes.password_hash {
            builder.push(", password_hash = ").push_bind(password_hash);
        }
        if let Some(age) = changes.age {
            builder.push(", age = ").push_bind(age);
        }
        builder
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(USER_COLUMNS);

        let row = builder
            .build_query_as::<UserRow>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn set_avatar(
        &self,
        id: Uuid,
        avatar: Option<AvatarSet>,
    ) -> Result<Option<User>, AppError> {
        let (small, medium, large) = match avatar {
            Some(set) => (Some(set.small), Some(set.medium), Some(set.large)),
            None => (None, None, None),
        };
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET avatar_small = $2, avatar_medium = $3, avatar_large = $4, \
             updated_at = now() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(small)
        .bind(medium)
        .bind(large)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.fetch_one_where(
            format!("DELETE FROM users WHERE id = $1 RETURNING {}", USER_COLUMNS),
            id,
            None,
        )
        .await
    }
}

#[derive(Debug, Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn insert(&self, task: Task) -> Result<Task, AppError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (id, description, completed, owner, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(task.id)
        .bind(&task.description)
        .bind(task.completed)
        .bind(task.owner)
        .bind(task.created_at)
        .bind(task.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(task)
    }

    async fn find(&self, owner: Uuid, options: &TaskListOptions) -> Result<Vec<Task>, AppError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT ");
        builder
            .push(TASK_COLUMNS)
            .push(" FROM tasks WHERE owner = ")
            .push_bind(owner);

        if let Some(completed) = options.completed {
            builder.push(" AND completed = ").push_bind(completed);
        }

        let direction = match options.sort.direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        builder.push(format!(
            " ORDER BY {} {}, id ASC",
            options.sort.field.column(),
            direction
        ));

        if let Some(limit) = options.limit {
            builder.push(" LIMIT ").push_bind(limit);
        }
        builder.push(" OFFSET ").push_bind(options.skip);

        let tasks = builder
            .build_query_as::<Task>()
            .fetch_all(&self.pool)
            .await?;
        Ok(tasks)
    }

    async fn find_by_id(&self, owner: Uuid, id: Uuid) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE id = $1 AND owner = $2",
            TASK_COLUMNS
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        update: TaskUpdate,
    ) -> Result<Option<Task>, AppError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE tasks SET updated_at = now()");
        if let Some(description) = update.description {
            builder.push(", description = ").push_bind(description);
        }
        if let Some(completed) = update.completed {
            builder.push(", completed = ").push_bind(completed);
        }
        builder
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND owner = ")
            .push_bind(owner)
            .push(" RETURNING ")
            .push(TASK_COLUMNS);

        let task = builder
            .build_query_as::<Task>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "DELETE FROM tasks WHERE id = $1 AND owner = $2 RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    async fn delete_all(&self, owner: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE owner = $1")
            .bind(owner)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
