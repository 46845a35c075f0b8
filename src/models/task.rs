use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

const DEFAULT_STATUS: &str = "todo";
const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 10;

fn default_status() -> String {
    DEFAULT_STATUS.to_string()
}

fn default_page() -> i64 {
    DEFAULT_PAGE
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// Input structure for creating or updating a task.
/// Contains validation rules for its fields.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// The title of the task.
    /// Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200, message = "title is required"))]
    pub title: String,

    /// A description of the task.
    /// Must be between 1 and 1000 characters.
    #[validate(length(min = 1, max = 1000, message = "description is required"))]
    pub description: String,

    /// Free-form status such as "todo" or "completed". Defaults to "todo".
    #[serde(default = "default_status")]
    #[validate(length(max = 50))]
    pub status: String,
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: String,
    /// Identifier of the owning user. Never changes after creation.
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for paging through a user's tasks.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PageParams {
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    pub page: i64,
    #[serde(default = "default_limit")]
    #[validate(range(min = 0, max = 100))]
    pub limit: i64,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageParams {
    /// Number of rows to skip before this page starts. Saturates, so a page
    /// far past the end is simply empty.
    pub fn offset(&self) -> i64 {
        (self.page - 1).max(0).saturating_mul(self.limit.max(0))
    }
}
