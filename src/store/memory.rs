use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use super::{TaskStore, UserStore};
use crate::error::AppError;
use crate::models::{NewTask, NewUser, Task, TaskChanges, User, UserChanges};

/// Process-local store keeping users and tasks in hash maps.
///
/// Locks are never held across an `.await`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> AppError {
    AppError::InternalServerError("In-memory store lock poisoned".into())
}

fn email_taken(users: &HashMap<Uuid, User>, email: &str, except: Option<Uuid>) -> bool {
    users
        .values()
        .any(|user| Some(user.id) != except && user.email.eq_ignore_ascii_case(email))
}

fn newest_first(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    tasks
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users.get(&id).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, AppError> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let users = self.users.read().map_err(poisoned)?;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(all)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.write().map_err(poisoned)?;
        if email_taken(&users, &new_user.email, None) {
            return Err(AppError::Conflict("User already exists".into()));
        }
        let user = new_user.into_user();
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, AppError> {
        let mut users = self.users.write().map_err(poisoned)?;
        if let Some(email) = &changes.email {
            if email_taken(&users, email, Some(id)) {
                return Err(AppError::Conflict("User already exists".into()));
            }
        }
        Ok(users.get_mut(&id).map(|user| {
            changes.apply_to(user);
            user.clone()
        }))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError> {
        let mut users = self.users.write().map_err(poisoned)?;
        match users.get_mut(&id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                user.updated_at = chrono::Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut users = self.users.write().map_err(poisoned)?;
        Ok(users.remove(&id).is_some())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list_all(&self) -> Result<Vec<Task>, AppError> {
        let tasks = self.tasks.read().map_err(poisoned)?;
        Ok(newest_first(tasks.values().cloned().collect()))
    }

    async fn list_assigned_to(&self, user_id: Uuid) -> Result<Vec<Task>, AppError> {
        let tasks = self.tasks.read().map_err(poisoned)?;
        Ok(newest_first(
            tasks
                .values()
                .filter(|task| task.is_assigned(user_id))
                .cloned()
                .collect(),
        ))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        let tasks = self.tasks.read().map_err(poisoned)?;
        Ok(tasks.get(&id).cloned())
    }

    async fn create(&self, new_task: NewTask) -> Result<Task, AppError> {
        let mut tasks = self.tasks.write().map_err(poisoned)?;
        let task = new_task.into_task();
        tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn update(&self, id: Uuid, changes: TaskChanges) -> Result<Option<Task>, AppError> {
        let mut tasks = self.tasks.write().map_err(poisoned)?;
        Ok(tasks.get_mut(&id).map(|task| {
            changes.apply_to(task);
            task.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tasks = self.tasks.write().map_err(poisoned)?;
        Ok(tasks.remove(&id).is_some())
    }
}
