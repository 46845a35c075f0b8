use async_trait::async_trait;
use sqlx::PgPool;

use super::{StoreError, TaskRepository, UserRepository};
use crate::models::{NewUser, PageParams, Task, TaskInput, User};

const TASK_COLUMNS: &str = "id, title, description, status, user_id, created_at, updated_at";

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email, password_hash)
             VALUES ($1, $2, $3)
             RETURNING id, name, email, password_hash, created_at",
        )
        .bind(user.name)
        .bind(user.email)
        .bind(user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::Conflict(_) => StoreError::Conflict("email already exists".into()),
            other => other,
        })
    }

    async fn find_by_email(&self, email: &str) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }
}

#[derive(Clone)]
pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn create(&self, user_id: i64, input: &TaskInput) -> Result<Task, StoreError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (title, description, status, user_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.status)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(task)
    }

    async fn list_by_user(&self, user_id: i64, page: &PageParams) -> Result<Vec<Task>, StoreError> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE user_id = $1
             ORDER BY id LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok(tasks)
    }

    async fn count_by_user(&self, user_id: i64) -> Result<i64, StoreError> {
        let (total,) = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM tasks WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn find_by_id(&self, id: i64, user_id: i64) -> Result<Task, StoreError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(task)
    }

    async fn update(&self, id: i64, user_id: i64, input: &TaskInput) -> Result<Task, StoreError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks
             SET title = $1, description = $2, status = $3, updated_at = NOW()
             WHERE id = $4 AND user_id = $5
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.status)
        .bind(id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(task)
    }

    async fn delete(&self, id: i64, user_id: i64) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// These run against a live database: `DATABASE_URL=... cargo test -- --ignored`.
#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    async fn pool() -> PgPool {
        dotenv::dotenv().ok();
        let pool = PgPool::connect(&env::var("DATABASE_URL").expect("DATABASE_URL not set"))
            .await
            .unwrap();
        sqlx::migrate!().run(&pool).await.unwrap();
        pool
    }

    #[ignore]
    #[actix_rt::test]
    async fn test_duplicate_email_is_a_conflict() {
        let pool = pool().await;
        let _ = sqlx::query("DELETE FROM users WHERE email = $1")
            .bind("pg_dup@example.com")
            .execute(&pool)
            .await;

        let users = PgUserRepository::new(pool.clone());
        let new_user = NewUser {
            name: "dup".into(),
            email: "pg_dup@example.com".into(),
            password_hash: "hash".into(),
        };
        let created = users.create(new_user.clone()).await.unwrap();
        assert!(created.id > 0);

        let err = users.create(new_user).await.unwrap_err();
        assert_eq!(err, StoreError::Conflict("email already exists".into()));

        let _ = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(created.id)
            .execute(&pool)
            .await;
    }

    #[ignore]
    #[actix_rt::test]
    async fn test_tasks_are_scoped_to_owner() {
        let pool = pool().await;
        let _ = sqlx::query("DELETE FROM users WHERE email IN ($1, $2)")
            .bind("pg_owner@example.com")
            .bind("pg_other@example.com")
            .execute(&pool)
            .await;

        let users = PgUserRepository::new(pool.clone());
        let tasks = PgTaskRepository::new(pool.clone());
        let owner = users
            .create(NewUser {
                name: "owner".into(),
                email: "pg_owner@example.com".into(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap();
        let other = users
            .create(NewUser {
                name: "other".into(),
                email: "pg_other@example.com".into(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap();

        let input = TaskInput {
            title: "owned".into(),
            description: "by owner".into(),
            status: "todo".into(),
        };
        let task = tasks.create(owner.id, &input).await.unwrap();

        assert_eq!(tasks.find_by_id(task.id, other.id).await.unwrap_err(), StoreError::NotFound);
        assert_eq!(tasks.update(task.id, other.id, &input).await.unwrap_err(), StoreError::NotFound);
        assert_eq!(tasks.delete(task.id, other.id).await.unwrap(), 0);
        assert_eq!(tasks.count_by_user(owner.id).await.unwrap(), 1);
        assert_eq!(tasks.delete(task.id, owner.id).await.unwrap(), 1);

        let _ = sqlx::query("DELETE FROM users WHERE id IN ($1, $2)")
            .bind(owner.id)
            .bind(other.id)
            .execute(&pool)
            .await;
    }
}
