//! Persistence seams for users and tasks.
//!
//! Handlers and flows only see the [`UserRepository`] and [`TaskRepository`]
//! traits. The binary wires in the Postgres implementations; tests use the
//! in-memory ones.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewUser, PageParams, Task, TaskInput, User};

pub use memory::{MemoryTaskRepository, MemoryUserRepository};
pub use postgres::{PgTaskRepository, PgUserRepository};

/// SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("{0}")]
    Conflict(String),
    #[error("store failure: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> StoreError {
        match &error {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                StoreError::Conflict(db.message().to_string())
            }
            _ => StoreError::Backend(error.to_string()),
        }
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a user. A duplicate email yields [`StoreError::Conflict`].
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    /// Looks a user up by email; absence is [`StoreError::NotFound`].
    async fn find_by_email(&self, email: &str) -> Result<User, StoreError>;
}

/// Every task operation is scoped by the owning user's id. A task owned by
/// someone else is indistinguishable from one that does not exist.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, user_id: i64, input: &TaskInput) -> Result<Task, StoreError>;

    async fn list_by_user(&self, user_id: i64, page: &PageParams) -> Result<Vec<Task>, StoreError>;

    async fn count_by_user(&self, user_id: i64) -> Result<i64, StoreError>;

    async fn find_by_id(&self, id: i64, user_id: i64) -> Result<Task, StoreError>;

    async fn update(&self, id: i64, user_id: i64, input: &TaskInput) -> Result<Task, StoreError>;

    /// Returns the number of rows removed (0 or 1).
    async fn delete(&self, id: i64, user_id: i64) -> Result<u64, StoreError>;
}
