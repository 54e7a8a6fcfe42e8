//! Persistence ports for users and tasks.
//!
//! Services only talk to these traits. [`PgStore`] is the production adapter;
//! [`MemoryStore`] backs the test suite and local runs without `DATABASE_URL`.
//! Both enforce email uniqueness and report it as `AppError::Conflict`.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{NewTask, NewUser, Task, TaskChanges, User, UserChanges};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
    /// Users with the given ids, in no particular order. Unknown ids are skipped.
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, AppError>;
    async fn list(&self) -> Result<Vec<User>, AppError>;
    async fn create(&self, new_user: NewUser) -> Result<User, AppError>;
    /// Returns `None` when no user has this id.
    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, AppError>;
    /// Returns `false` when no user has this id.
    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError>;
    /// Returns `false` when no user has this id.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Every task, newest first.
    async fn list_all(&self) -> Result<Vec<Task>, AppError>;
    /// Tasks whose assignee set contains `user_id`, newest first.
    async fn list_assigned_to(&self, user_id: Uuid) -> Result<Vec<Task>, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, AppError>;
    async fn create(&self, new_task: NewTask) -> Result<Task, AppError>;
    /// Applies `changes` and returns the row as stored afterwards.
    async fn update(&self, id: Uuid, changes: TaskChanges) -> Result<Option<Task>, AppError>;
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}
