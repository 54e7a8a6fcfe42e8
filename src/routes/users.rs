//! Admin-only user management. Every handler takes an [`AdminUser`], so a
//! non-admin caller is rejected with 403 before the body is looked at.

use crate::{
    auth::{AdminUser, CreateUserRequest, UpdateUserRequest},
    error::AppError,
    services::accounts,
    state::AppState,
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use serde_json::json;
use uuid::Uuid;

#[get("/users")]
pub async fn list_users(
    state: web::Data<AppState>,
    _admin: AdminUser,
) -> Result<impl Responder, AppError> {
    let users = accounts::list_users(&state).await?;
    Ok(HttpResponse::Ok().json(json!({ "users": users })))
}

#[post("/users")]
pub async fn create_user(
    state: web::Data<AppState>,
    _admin: AdminUser,
    body: web::Json<CreateUserRequest>,
) -> Result<impl Responder, AppError> {
    let user = accounts::create_user(&state, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(user))
}

#[patch("/users/{id}")]
pub async fn update_user(
    state: web::Data<AppState>,
    _admin: AdminUser,
    user_id: web::Path<Uuid>,
    body: web::Json<UpdateUserRequest>,
) -> Result<impl Responder, AppError> {
    let user = accounts::update_user(&state, user_id.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": user })))
}

#[delete("/users/{id}")]
pub async fn delete_user(
    state: web::Data<AppState>,
    _admin: AdminUser,
    user_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    accounts::delete_user(&state, user_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "User deleted successfully" })))
}
