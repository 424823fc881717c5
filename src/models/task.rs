use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

pub const MAX_PAGE_SIZE: i64 = 100;

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    pub description: String,
    pub completed: bool,
    /// Identifier of the owning user. Set once at creation.
    pub owner: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new `Task` owned by `owner`, timestamped now.
    pub fn new(input: TaskInput, owner: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            description: input.description,
            completed: input.completed,
            owner,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input structure for creating a task. The owner never comes from the client.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct TaskInput {
    /// Must be between 1 and 1000 characters once trimmed.
    #[validate(length(min = 1, max = 1000, message = "Description is required"))]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

impl TaskInput {
    pub fn normalized(self) -> Self {
        Self {
            description: self.description.trim().to_string(),
            ..self
        }
    }
}

/// The only task fields a user may change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct TaskUpdate {
    #[validate(length(min = 1, max = 1000, message = "Description is required"))]
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl TaskUpdate {
    pub fn normalized(self) -> Self {
        Self {
            description: self.description.map(|d| d.trim().to_string()),
            ..self
        }
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.completed.is_none()
    }
}

/// Raw query parameters accepted when listing tasks.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    pub completed: Option<bool>,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
    /// `<field>:<asc|desc>`, e.g. `createdAt:desc`.
    pub sort_by: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSortField {
    CreatedAt,
    UpdatedAt,
    Description,
    Completed,
}

impl TaskSortField {
    pub fn column(self) -> &'static str {
        match self {
            TaskSortField::CreatedAt => "created_at",
            TaskSortField::UpdatedAt => "updated_at",
            TaskSortField::Description => "description",
            TaskSortField::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSort {
    pub field: TaskSortField,
    pub direction: SortDirection,
}

impl Default for TaskSort {
    fn default() -> Self {
        Self {
            field: TaskSortField::CreatedAt,
            direction: SortDirection::Asc,
        }
    }
}

impl FromStr for TaskSort {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::ValidationError(format!("Invalid sort specification: {}", raw));
        let (field, direction) = raw.split_once(':').unwrap_or((raw, "asc"));
        let field = match field {
            "createdAt" => TaskSortField::CreatedAt,
            "updatedAt" => TaskSortField::UpdatedAt,
            "description" => TaskSortField::Description,
            "completed" => TaskSortField::Completed,
            _ => return Err(invalid()),
        };
        let direction = match direction {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            _ => return Err(invalid()),
        };
        Ok(Self { field, direction })
    }
}

/// Validated listing options, applied after the ownership filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskListOptions {
    pub completed: Option<bool>,
    pub limit: Option<i64>,
    pub skip: i64,
    pub sort: TaskSort,
}

impl TryFrom<TaskQuery> for TaskListOptions {
    type Error = AppError;

    fn try_from(query: TaskQuery) -> Result<Self, Self::Error> {
        if let Some(limit) = query.limit {
            if !(1..=MAX_PAGE_SIZE).contains(&limit) {
                return Err(AppError::ValidationError(format!(
                    "limit must be between 1 and {}",
                    MAX_PAGE_SIZE
                )));
            }
        }
        let skip = query.skip.unwrap_or(0);
        if skip < 0 {
            return Err(AppError::ValidationError("skip must not be negative".into()));
        }
        let sort = match query.sort_by.as_deref() {
            Some(raw) => raw.parse()?,
            None => TaskSort::default(),
        };
        Ok(Self {
            completed: query.completed,
            limit: query.limit,
            skip,
            sort,
        })
    }
}
