//! Task operations.
//!
//! Create and update run in two phases: the store write commits first, then
//! newly assigned users are notified. Nothing in the second phase can fail the
//! request.

use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::auth::Claims;
use crate::error::AppError;
use crate::models::{
    dedup_assignees, NewTask, Role, Task, TaskChanges, TaskStatus, TaskView, UserSummary,
};
use crate::notify::{newly_assigned, AssignmentEvent};
use crate::state::AppState;

/// Body of `POST /api/tasks`.
///
/// Title and assignees default to empty so that their absence is reported as
/// a 400 with a single message rather than a deserialization error.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(default)]
    #[validate(length(max = 200))]
    pub title: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub assigned_to: Vec<Uuid>,
}

/// Body of `PATCH /api/tasks/{id}`. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<Vec<Uuid>>,
}

fn task_not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

fn ensure_can_modify(claims: &Claims, task: &Task) -> Result<(), AppError> {
    if claims.role == Role::Admin || task.is_assigned(claims.id) {
        Ok(())
    } else {
        Err(AppError::Forbidden("Not authorized".into()))
    }
}

/// Fails with `NotFound` naming the first id that has no user behind it.
async fn ensure_users_exist(state: &AppState, ids: &[Uuid]) -> Result<(), AppError> {
    if ids.is_empty() {
        return Ok(());
    }
    let found = state.users.find_many(ids).await?;
    if let Some(missing) = ids.iter().find(|id| !found.iter().any(|user| user.id == **id)) {
        return Err(AppError::NotFound(format!("Assigned user {} not found", missing)));
    }
    Ok(())
}

/// Replaces assignee ids with user summaries, dropping ids with no user behind them.
async fn populate(state: &AppState, tasks: Vec<Task>) -> Result<Vec<TaskView>, AppError> {
    let ids = dedup_assignees(
        &tasks
            .iter()
            .flat_map(|task| task.assigned_to.iter().copied())
            .collect::<Vec<_>>(),
    );
    let users: HashMap<Uuid, UserSummary> = state
        .users
        .find_many(&ids)
        .await?
        .iter()
        .map(|user| (user.id, UserSummary::from(user)))
        .collect();

    Ok(tasks
        .into_iter()
        .map(|task| {
            let assignees = task
                .assigned_to
                .iter()
                .filter_map(|id| users.get(id).cloned())
                .collect();
            TaskView::new(task, assignees)
        })
        .collect())
}

async fn populate_one(state: &AppState, task: Task) -> Result<TaskView, AppError> {
    populate(state, vec![task]).await?.pop().ok_or_else(task_not_found)
}

/// Admins see every task; everyone else sees the tasks they are assigned to.
pub async fn list_tasks(state: &AppState, claims: &Claims) -> Result<Vec<TaskView>, AppError> {
    let tasks = match claims.role {
        Role::Admin => state.tasks.list_all().await?,
        Role::User => state.tasks.list_assigned_to(claims.id).await?,
    };
    populate(state, tasks).await
}

pub async fn create_task(
    state: &AppState,
    claims: &Claims,
    request: CreateTaskRequest,
) -> Result<TaskView, AppError> {
    if request.title.trim().is_empty() || request.assigned_to.is_empty() {
        return Err(AppError::BadRequest(
            "Title and at least one assigned user are required!".into(),
        ));
    }
    request.validate()?;
    let assigned_to = dedup_assignees(&request.assigned_to);
    ensure_users_exist(state, &assigned_to).await?;

    let task = state
        .tasks
        .create(NewTask {
            title: request.title,
            description: request.description,
            status: request.status.unwrap_or_default(),
            assigned_to,
        })
        .await?;
    log::info!("User {} created task {}", claims.id, task.id);

    let recipients = newly_assigned(&[], &task.assigned_to);
    let report = state
        .notifier
        .notify_assignees(&task, &recipients, AssignmentEvent::Created)
        .await;
    log::debug!("Task {} creation notifications: {:?}", task.id, report);

    populate_one(state, task).await
}

pub async fn update_task(
    state: &AppState,
    claims: &Claims,
    task_id: Uuid,
    request: UpdateTaskRequest,
) -> Result<TaskView, AppError> {
    request.validate()?;

    let current = state.tasks.find_by_id(task_id).await?.ok_or_else(task_not_found)?;
    ensure_can_modify(claims, &current)?;

    let assigned_to = match &request.assigned_to {
        Some(ids) if ids.is_empty() => {
            return Err(AppError::BadRequest(
                "A task needs at least one assigned user".into(),
            ))
        }
        Some(ids) => {
            // Ids already on the task are kept as sent, even if their user is gone.
            let requested = dedup_assignees(ids);
            ensure_users_exist(state, &newly_assigned(&current.assigned_to, &requested)).await?;
            Some(requested)
        }
        None => None,
    };

    let before = current.assigned_to;
    let changes = TaskChanges {
        title: request.title,
        description: request.description,
        status: request.status,
        assigned_to,
    };
    let updated = state
        .tasks
        .update(task_id, changes)
        .await?
        .ok_or_else(task_not_found)?;
    log::info!("User {} updated task {}", claims.id, task_id);

    let added = newly_assigned(&before, &updated.assigned_to);
    if !added.is_empty() {
        let report = state
            .notifier
            .notify_assignees(&updated, &added, AssignmentEvent::Added)
            .await;
        log::debug!("Task {} assignment notifications: {:?}", task_id, report);
    }

    populate_one(state, updated).await
}

pub async fn delete_task(state: &AppState, claims: &Claims, task_id: Uuid) -> Result<(), AppError> {
    let task = state.tasks.find_by_id(task_id).await?.ok_or_else(task_not_found)?;
    ensure_can_modify(claims, &task)?;

    if !state.tasks.delete(task_id).await? {
        return Err(task_not_found());
    }
    log::info!("User {} deleted task {}", claims.id, task_id);
    Ok(())
}
