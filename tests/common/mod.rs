//! Shared helpers for the integration tests.
//!
//! Tests run against `MemoryStore` and a mailer that records instead of
//! sending, so no database or mail relay is needed.

#![allow(dead_code)]

use actix_cors::Cors;
use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::middleware::Logger;
use actix_web::{test, web, App};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use taskmate::auth::{generate_token, hash_password, AuthMiddleware};
use taskmate::models::{NewUser, Role};
use taskmate::notify::{Email, MailError, Mailer};
use taskmate::routes::{self, health};
use taskmate::AppState;

pub const JWT_SECRET: &str = "integration-test-secret";

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<Email>>,
}

impl RecordingMailer {
    pub fn recipients(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|e| e.to.clone()).collect()
    }

    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// Rejects every message, counting the attempts.
#[derive(Default)]
pub struct FailingMailer {
    attempts: Mutex<usize>,
}

impl FailingMailer {
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _email: &Email) -> Result<(), MailError> {
        *self.attempts.lock().unwrap() += 1;
        Err(MailError::Unavailable("relay refused connection".to_string()))
    }
}

/// Helper struct to hold auth details
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> (header::HeaderName, String) {
        (header::AUTHORIZATION, format!("Bearer {}", self.token))
    }
}

pub fn test_state() -> (web::Data<AppState>, Arc<RecordingMailer>) {
    let mailer = Arc::new(RecordingMailer::default());
    (test_state_with(mailer.clone()), mailer)
}

pub fn test_state_with(mailer: Arc<dyn Mailer>) -> web::Data<AppState> {
    web::Data::new(AppState::in_memory(JWT_SECRET, mailer))
}

pub async fn init_app(
    state: web::Data<AppState>,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(state)
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            ),
    )
    .await
}

/// Calls the app and returns the status with the JSON body (`Null` when empty).
pub async fn send<S, B>(app: &S, req: Request) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let bytes = test::read_body(resp).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}

pub async fn register_user<S, B>(app: &S, username: &str, password: &str) -> TestUser
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let email = format!("{}@example.com", username);
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": username,
            "email": email,
            "password": password
        }))
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "registration failed: {}", body);

    TestUser {
        id: serde_json::from_value(body["user_id"].clone()).expect("user_id in response"),
        email,
        token: body["token"].as_str().expect("token in response").to_string(),
    }
}

/// Admins cannot self-register, so they are written straight to the store.
pub async fn seed_admin(state: &AppState, username: &str) -> TestUser {
    let email = format!("{}@example.com", username);
    let user = state
        .users
        .create(NewUser {
            username: username.to_string(),
            email: email.clone(),
            password_hash: hash_password("admin-password").unwrap(),
            role: Role::Admin,
        })
        .await
        .unwrap();
    let token = generate_token(&state.keys, user.id, user.role).unwrap();
    TestUser {
        id: user.id,
        email,
        token,
    }
}
