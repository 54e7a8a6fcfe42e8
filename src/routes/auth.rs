use crate::{
    auth::{AuthResponse, AuthenticatedUser, ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateProfileRequest},
    error::AppError,
    services::accounts,
    state::AppState,
};
use actix_web::{patch, post, web, HttpResponse, Responder};
use serde_json::json;

/// Register a new user
///
/// Creates a plain user account and returns an authentication token.
/// A `role` in the body is ignored.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let (user, token) = accounts::register(&state, register_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(AuthResponse::new(&user, token)))
}

/// Login user
///
/// Authenticates a user and returns an authentication token.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let (user, token) = accounts::login(&state, login_data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(AuthResponse::new(&user, token)))
}

#[post("/change-password")]
pub async fn change_password(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
    body: web::Json<ChangePasswordRequest>,
) -> Result<impl Responder, AppError> {
    accounts::change_password(&state, caller.0.id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Password updated successfully" })))
}

/// Update the caller's own username and email.
#[patch("/profile")]
pub async fn update_profile(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
    body: web::Json<UpdateProfileRequest>,
) -> Result<impl Responder, AppError> {
    let user = accounts::update_profile(&state, &caller.0, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": user })))
}
