//! Account operations: registration, login, password changes and the
//! admin-side user management.
//!
//! Role checks for admin operations happen at the edge (`AdminUser`); the
//! functions here assume the caller has already been authorized.

use lazy_static::lazy_static;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{
    generate_token, hash_password, verify_password, ChangePasswordRequest, Claims,
    CreateUserRequest, LoginRequest, RegisterRequest, UpdateProfileRequest, UpdateUserRequest,
};
use crate::error::AppError;
use crate::models::{NewUser, Role, User, UserChanges};
use crate::state::AppState;

lazy_static! {
    // Compared against when the email is unknown, so both login failures cost one bcrypt verify.
    static ref DUMMY_HASH: Option<String> = hash_password("taskmate-dummy-password").ok();
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid credentials".into())
}

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".into())
}

async fn ensure_email_free(state: &AppState, email: &str, owner: Option<Uuid>) -> Result<(), AppError> {
    match state.users.find_by_email(email).await? {
        Some(existing) if Some(existing.id) != owner => {
            Err(AppError::Conflict("User already exists".into()))
        }
        _ => Ok(()),
    }
}

/// Self-registration. Always creates a `Role::User` account and returns it with
/// a fresh session token.
pub async fn register(state: &AppState, request: RegisterRequest) -> Result<(User, String), AppError> {
    request.validate()?;
    ensure_email_free(state, &request.email, None).await?;

    let password_hash = hash_password(&request.password)?;
    let user = state
        .users
        .create(NewUser {
            username: request.username,
            email: request.email,
            password_hash,
            role: Role::User,
        })
        .await?;

    log::info!("Registered user {} ({})", user.id, user.email);
    let token = generate_token(&state.keys, user.id, user.role)?;
    Ok((user, token))
}

/// Exchanges email and password for a session token.
///
/// An unknown email and a wrong password fail with the same
/// `Unauthorized("Invalid credentials")`.
pub async fn login(state: &AppState, request: LoginRequest) -> Result<(User, String), AppError> {
    request.validate()?;

    let user = match state.users.find_by_email(&request.email).await? {
        Some(user) => user,
        None => {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify_password(&request.password, dummy);
            }
            return Err(invalid_credentials());
        }
    };

    if !verify_password(&request.password, &user.password_hash)? {
        return Err(invalid_credentials());
    }

    let token = generate_token(&state.keys, user.id, user.role)?;
    Ok((user, token))
}

/// Replaces the caller's password after checking the current one.
///
/// Tokens issued before the change stay valid until they expire.
pub async fn change_password(
    state: &AppState,
    user_id: Uuid,
    request: ChangePasswordRequest,
) -> Result<(), AppError> {
    request.validate()?;

    let user = state.users.find_by_id(user_id).await?.ok_or_else(user_not_found)?;
    if !verify_password(&request.current_password, &user.password_hash)? {
        return Err(AppError::BadRequest("Current password is incorrect".into()));
    }

    let password_hash = hash_password(&request.new_password)?;
    if !state.users.update_password(user_id, &password_hash).await? {
        return Err(user_not_found());
    }
    log::info!("Password changed for user {}", user_id);
    Ok(())
}

pub async fn list_users(state: &AppState) -> Result<Vec<User>, AppError> {
    state.users.list().await
}

/// Admin-provisioned account with a caller-chosen role. No token is issued.
pub async fn create_user(state: &AppState, request: CreateUserRequest) -> Result<User, AppError> {
    request.validate()?;
    ensure_email_free(state, &request.email, None).await?;

    let password_hash = hash_password(&request.password)?;
    let user = state
        .users
        .create(NewUser {
            username: request.username,
            email: request.email,
            password_hash,
            role: request.role,
        })
        .await?;

    log::info!("Admin created user {} with role {}", user.id, user.role);
    Ok(user)
}

/// Updates the caller's own username and email. The role cannot change here.
pub async fn update_profile(
    state: &AppState,
    claims: &Claims,
    request: UpdateProfileRequest,
) -> Result<User, AppError> {
    request.validate()?;

    let (username, email) = match (request.username, request.email) {
        (Some(username), Some(email)) => (username, email),
        _ => return Err(AppError::BadRequest("Username and email are required!".into())),
    };
    ensure_email_free(state, &email, Some(claims.id)).await?;

    let changes = UserChanges {
        username: Some(username),
        email: Some(email),
        role: None,
    };
    state
        .users
        .update(claims.id, changes)
        .await?
        .ok_or_else(user_not_found)
}

/// Admin update of any account; the only path through which a role changes.
pub async fn update_user(
    state: &AppState,
    user_id: Uuid,
    request: UpdateUserRequest,
) -> Result<User, AppError> {
    request.validate()?;

    if let Some(email) = &request.email {
        ensure_email_free(state, email, Some(user_id)).await?;
    }

    let changes = UserChanges {
        username: request.username,
        email: request.email,
        role: request.role,
    };
    let user = state
        .users
        .update(user_id, changes)
        .await?
        .ok_or_else(user_not_found)?;

    if let Some(role) = request.role {
        log::info!("Role of user {} set to {}", user.id, role);
    }
    Ok(user)
}

pub async fn delete_user(state: &AppState, user_id: Uuid) -> Result<(), AppError> {
    if !state.users.delete(user_id).await? {
        return Err(user_not_found());
    }
    log::info!("Deleted user {}", user_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_token;
    use crate::notify::LogMailer;
    use std::sync::Arc;

    fn state() -> AppState {
        AppState::in_memory("accounts-test-secret", Arc::new(LogMailer))
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            username: "alice".to_string(),
            email: email.to_string(),
            password: "correct-horse".to_string(),
        }
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[actix_rt::test]
    async fn test_register_issues_token_for_new_user() {
        let state = state();
        let (user, token) = register(&state, register_request("alice@example.com"))
            .await
            .unwrap();

        let claims = verify_token(&state.keys, &token).unwrap();
        assert_eq!(claims.id, user.id);
        assert_eq!(claims.role, Role::User);
        assert_ne!(user.password_hash, "correct-horse");
    }

    #[actix_rt::test]
    async fn test_register_duplicate_email_conflicts() {
        let state = state();
        register(&state, register_request("alice@example.com")).await.unwrap();

        let err = register(&state, register_request("alice@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[actix_rt::test]
    async fn test_login_failures_are_indistinguishable() {
        let state = state();
        register(&state, register_request("alice@example.com")).await.unwrap();

        let wrong_password = login(&state, login_request("alice@example.com", "wrong"))
            .await
            .unwrap_err();
        let unknown_email = login(&state, login_request("nobody@example.com", "correct-horse"))
            .await
            .unwrap_err();

        assert_eq!(wrong_password, unknown_email);
        assert_eq!(wrong_password, AppError::Unauthorized("Invalid credentials".into()));
    }

    #[actix_rt::test]
    async fn test_change_password_round_trip() {
        let state = state();
        let (user, _) = register(&state, register_request("alice@example.com"))
            .await
            .unwrap();

        let bad = change_password(
            &state,
            user.id,
            ChangePasswordRequest {
                current_password: "not-it".to_string(),
                new_password: "new-password".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(bad, AppError::BadRequest(_)));

        change_password(
            &state,
            user.id,
            ChangePasswordRequest {
                current_password: "correct-horse".to_string(),
                new_password: "new-password".to_string(),
            },
        )
        .await
        .unwrap();

        assert!(login(&state, login_request("alice@example.com", "new-password"))
            .await
            .is_ok());
        assert!(matches!(
            login(&state, login_request("alice@example.com", "correct-horse")).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[actix_rt::test]
    async fn test_profile_update_cannot_take_another_email() {
        let state = state();
        let (alice, token) = register(&state, register_request("alice@example.com"))
            .await
            .unwrap();
        register(&state, register_request("bob@example.com")).await.unwrap();
        let claims = verify_token(&state.keys, &token).unwrap();

        let err = update_profile(
            &state,
            &claims,
            UpdateProfileRequest {
                username: Some("alice".to_string()),
                email: Some("bob@example.com".to_string()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let missing = update_profile(
            &state,
            &claims,
            UpdateProfileRequest {
                username: Some("alice".to_string()),
                email: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(missing, AppError::BadRequest(_)));

        let updated = update_profile(
            &state,
            &claims,
            UpdateProfileRequest {
                username: Some("alice_b".to_string()),
                email: Some("alice@example.com".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.id, alice.id);
        assert_eq!(updated.username, "alice_b");
        assert_eq!(updated.role, Role::User);
    }

    #[actix_rt::test]
    async fn test_admin_paths() {
        let state = state();
        let admin = create_user(
            &state,
            CreateUserRequest {
                username: "root".to_string(),
                email: "root@example.com".to_string(),
                password: "password123".to_string(),
                role: Role::Admin,
            },
        )
        .await
        .unwrap();
        assert_eq!(admin.role, Role::Admin);

        let (user, _) = register(&state, register_request("alice@example.com"))
            .await
            .unwrap();
        let promoted = update_user(
            &state,
            user.id,
            UpdateUserRequest {
                username: None,
                email: None,
                role: Some(Role::Admin),
            },
        )
        .await
        .unwrap();
        assert_eq!(promoted.role, Role::Admin);
        assert_eq!(promoted.username, "alice");

        assert_eq!(list_users(&state).await.unwrap().len(), 2);
        delete_user(&state, user.id).await.unwrap();
        assert!(matches!(
            delete_user(&state, user.id).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(list_users(&state).await.unwrap().len(), 1);
    }
}
