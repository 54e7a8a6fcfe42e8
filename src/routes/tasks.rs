use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    services::tasks::{self, CreateTaskRequest, UpdateTaskRequest},
    state::AppState,
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use serde_json::json;
use uuid::Uuid;

/// Lists tasks visible to the caller.
///
/// Admins get every task; other users get the tasks they are assigned to.
/// Assignees are returned as `{ id, username, email }` objects.
///
/// ## Responses:
/// - `200 OK`: `{ "tasks": [...] }`.
/// - `401 Unauthorized`: missing or invalid token.
#[get("")]
pub async fn get_tasks(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let tasks = tasks::list_tasks(&state, &caller.0).await?;
    Ok(HttpResponse::Ok().json(json!({ "tasks": tasks })))
}

/// Creates a task and emails every assignee.
///
/// ## Request Body:
/// - `title`: required.
/// - `description` (optional).
/// - `status` (optional): `pending` (default), `in_progress` or `completed`.
/// - `assignedTo`: at least one user id.
///
/// ## Responses:
/// - `201 Created`: the new task.
/// - `400 Bad Request`: title or assignees missing.
/// - `404 Not Found`: an assignee id does not exist.
/// - `422 Unprocessable Entity`: title or description too long.
#[post("")]
pub async fn create_task(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
    task_data: web::Json<CreateTaskRequest>,
) -> Result<impl Responder, AppError> {
    let task = tasks::create_task(&state, &caller.0, task_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(task))
}

/// Partially updates a task; users newly added to `assignedTo` are emailed.
///
/// ## Responses:
/// - `200 OK`: the updated task.
/// - `403 Forbidden`: caller is neither an assignee nor an admin.
/// - `404 Not Found`: no such task, or an unknown assignee id.
#[patch("/{id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
    task_id: web::Path<Uuid>,
    task_data: web::Json<UpdateTaskRequest>,
) -> Result<impl Responder, AppError> {
    let task = tasks::update_task(
        &state,
        &caller.0,
        task_id.into_inner(),
        task_data.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Deletes a task. Same authorization rule as updates.
#[delete("/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    tasks::delete_task(&state, &caller.0, task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Task deleted successfully" })))
}
