use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::user::UserSummary;

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task has not been started.
    #[default]
    Pending,
    /// Task is being worked on.
    InProgress,
    /// Task is done.
    Completed,
}

/// Represents a task as stored in the database.
#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    /// Ids of the assigned users, in assignment order, without duplicates.
    pub assigned_to: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn is_assigned(&self, user_id: Uuid) -> bool {
        self.assigned_to.contains(&user_id)
    }
}

/// A task with its assignees resolved to user summaries, as returned by the API.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub assigned_to: Vec<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskView {
    pub fn new(task: Task, assignees: Vec<UserSummary>) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            status: task.status,
            assigned_to: assignees,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

/// Validated input for inserting a task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub assigned_to: Vec<Uuid>,
}

impl NewTask {
    pub fn into_task(self) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            title: self.title,
            description: self.description,
            status: self.status,
            assigned_to: self.assigned_to,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a task; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<Vec<Uuid>>,
}

impl TaskChanges {
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = Some(description.clone());
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(assigned_to) = &self.assigned_to {
            task.assigned_to = assigned_to.clone();
        }
        task.updated_at = Utc::now();
    }
}

/// Removes repeated ids while keeping first-seen order.
pub fn dedup_assignees(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_creation() {
        let assignee = Uuid::new_v4();
        let task = NewTask {
            title: "Test Task".to_string(),
            description: Some("Test Description".to_string()),
            status: TaskStatus::default(),
            assigned_to: vec![assignee],
        }
        .into_task();

        assert_eq!(task.title, "Test Task");
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.is_assigned(assignee));
        assert!(!task.is_assigned(Uuid::new_v4()));
    }

    #[test]
    fn test_task_serializes_camel_case() {
        let task = NewTask {
            title: "Serialize".to_string(),
            description: None,
            status: TaskStatus::InProgress,
            assigned_to: vec![Uuid::new_v4()],
        }
        .into_task();

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["status"], "in_progress");
        assert!(json["assignedTo"].is_array());
        assert!(json.get("assigned_to").is_none());
    }

    #[test]
    fn test_changes_keep_untouched_fields() {
        let mut task = NewTask {
            title: "Original".to_string(),
            description: Some("desc".to_string()),
            status: TaskStatus::Pending,
            assigned_to: vec![Uuid::new_v4()],
        }
        .into_task();
        let before = task.assigned_to.clone();

        TaskChanges {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        }
        .apply_to(&mut task);

        assert_eq!(task.title, "Original");
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.assigned_to, before);
    }

    #[test]
    fn test_dedup_assignees_keeps_order() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(dedup_assignees(&[b, a, b, c, a]), vec![b, a, c]);
    }
}
