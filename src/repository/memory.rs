//! In-process repositories backed by `DashMap`.
//!
//! They honour the same contracts as the Postgres implementations (unique
//! emails, owner-scoped task access, ascending id order) and are used by the
//! test-suite and for running the service without a database.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{StoreError, TaskRepository, UserRepository};
use crate::models::{NewUser, PageParams, Task, TaskInput, User};

#[derive(Default)]
pub struct MemoryUserRepository {
    by_email: DashMap<String, User>,
    next_id: AtomicI64,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        match self.by_email.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict("email already exists".into())),
            Entry::Vacant(slot) => {
                let created = User {
                    id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
                    name: user.name,
                    email: user.email,
                    password_hash: user.password_hash,
                    created_at: Utc::now(),
                };
                slot.insert(created.clone());
                Ok(created)
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.by_email
            .get(email)
            .map(|user| user.value().clone())
            .ok_or(StoreError::NotFound)
    }
}

#[derive(Default)]
pub struct MemoryTaskRepository {
    tasks: DashMap<i64, Task>,
    next_id: AtomicI64,
}

impl MemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for MemoryTaskRepository {
    async fn create(&self, user_id: i64, input: &TaskInput) -> Result<Task, StoreError> {
        let now = Utc::now();
        let task = Task {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            title: input.title.clone(),
            description: input.description.clone(),
            status: input.status.clone(),
            user_id,
            created_at: now,
            updated_at: now,
        };
        self.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn list_by_user(&self, user_id: i64, page: &PageParams) -> Result<Vec<Task>, StoreError> {
        let mut owned: Vec<Task> = self
            .tasks
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        owned.sort_by_key(|task| task.id);

        Ok(owned
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit.max(0) as usize)
            .collect())
    }

    async fn count_by_user(&self, user_id: i64) -> Result<i64, StoreError> {
        Ok(self.tasks.iter().filter(|entry| entry.user_id == user_id).count() as i64)
    }

    async fn find_by_id(&self, id: i64, user_id: i64) -> Result<Task, StoreError> {
        self.tasks
            .get(&id)
            .filter(|task| task.user_id == user_id)
            .map(|task| task.value().clone())
            .ok_or(StoreError::NotFound)
    }

    async fn update(&self, id: i64, user_id: i64, input: &TaskInput) -> Result<Task, StoreError> {
        let mut task = self
            .tasks
            .get_mut(&id)
            .filter(|task| task.user_id == user_id)
            .ok_or(StoreError::NotFound)?;
        task.title = input.title.clone();
        task.description = input.description.clone();
        task.status = input.status.clone();
        task.updated_at = Utc::now();
        Ok(task.value().clone())
    }

    async fn delete(&self, id: i64, user_id: i64) -> Result<u64, StoreError> {
        Ok(self
            .tasks
            .remove_if(&id, |_, task| task.user_id == user_id)
            .map_or(0, |_| 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str) -> TaskInput {
        TaskInput {
            title: title.to_string(),
            description: "description".to_string(),
            status: "todo".to_string(),
        }
    }

    #[actix_rt::test]
    async fn test_user_email_is_unique() {
        let users = MemoryUserRepository::new();
        let new_user = NewUser {
            name: "John".into(),
            email: "john@mail.com".into(),
            password_hash: "hash".into(),
        };

        let created = users.create(new_user.clone()).await.unwrap();
        assert_eq!(created.id, 1);
        assert!(matches!(users.create(new_user).await, Err(StoreError::Conflict(_))));

        assert_eq!(users.find_by_email("john@mail.com").await.unwrap().id, 1);
        assert_eq!(
            users.find_by_email("jane@mail.com").await.unwrap_err(),
            StoreError::NotFound
        );
    }

    #[actix_rt::test]
    async fn test_tasks_are_scoped_and_paged() {
        let tasks = MemoryTaskRepository::new();
        for i in 0..15 {
            tasks.create(1, &input(&format!("task {i}"))).await.unwrap();
        }
        let foreign = tasks.create(2, &input("not yours")).await.unwrap();

        let second_page = tasks
            .list_by_user(1, &PageParams { page: 2, limit: 10 })
            .await
            .unwrap();
        assert_eq!(second_page.len(), 5);
        assert_eq!(second_page[0].title, "task 10");
        assert_eq!(tasks.count_by_user(1).await.unwrap(), 15);

        assert_eq!(tasks.find_by_id(foreign.id, 1).await.unwrap_err(), StoreError::NotFound);
        assert_eq!(
            tasks.update(foreign.id, 1, &input("hijack")).await.unwrap_err(),
            StoreError::NotFound
        );
        assert_eq!(tasks.delete(foreign.id, 1).await.unwrap(), 0);
        assert_eq!(tasks.delete(foreign.id, 2).await.unwrap(), 1);
        assert_eq!(tasks.delete(foreign.id, 2).await.unwrap(), 0);
    }

    #[actix_rt::test]
    async fn test_update_keeps_owner_and_creation_time() {
        let tasks = MemoryTaskRepository::new();
        let created = tasks.create(7, &input("draft")).await.unwrap();

        let mut changed = input("final");
        changed.status = "completed".into();
        let updated = tasks.update(created.id, 7, &changed).await.unwrap();

        assert_eq!(updated.user_id, 7);
        assert_eq!(updated.title, "final");
        assert_eq!(updated.status, "completed");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }
}
