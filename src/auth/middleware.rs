use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::token::{verify_token, Claims};
use crate::error::AppError;
use crate::state::AppState;

/// Paths under the protected scope that are reachable without a token.
const PUBLIC_PATHS: [&str; 2] = ["/api/auth/login", "/api/auth/register"];

/// Verifies the bearer token on every request it wraps and stores the decoded
/// [`Claims`] in the request extensions.
///
/// Requires `web::Data<AppState>` to be registered on the app. Rejections are
/// rendered as JSON error responses right here and never reach the handler.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if PUBLIC_PATHS.iter().any(|path| req.path() == *path) {
            let fut = self.service.call(req);
            return Box::pin(async move { Ok(fut.await?.map_into_left_body()) });
        }

        match authenticate(&req) {
            Ok(claims) => {
                log::debug!("authenticated user {} ({})", claims.id, claims.role);
                req.extensions_mut().insert(claims);
                let fut = self.service.call(req);
                Box::pin(async move { Ok(fut.await?.map_into_left_body()) })
            }
            Err(app_err) => {
                log::debug!("rejected {} {}: {}", req.method(), req.path(), app_err);
                let response = req.into_response(app_err.error_response());
                Box::pin(async move { Ok(response.map_into_right_body()) })
            }
        }
    }
}

fn authenticate(req: &ServiceRequest) -> Result<Claims, AppError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::InternalServerError("Application state is not configured".into()))?;

    let token = bearer_token(req)
        .ok_or_else(|| AppError::Unauthorized("You are not authorized to access this route".into()))?;

    verify_token(&state.keys, token)
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::{generate_token, JwtKeys};
    use crate::models::Role;
    use crate::notify::LogMailer;
    use std::sync::Arc;
    use actix_web::{get, http::StatusCode, test, App, HttpRequest, HttpResponse};
    use uuid::Uuid;

    #[get("/api/whoami")]
    async fn whoami(req: HttpRequest) -> HttpResponse {
        match req.extensions().get::<Claims>() {
            Some(claims) => HttpResponse::Ok().body(claims.id.to_string()),
            None => HttpResponse::InternalServerError().finish(),
        }
    }

    #[get("/api/auth/login")]
    async fn open_login() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    const SECRET: &str = "middleware-test-secret";

    fn keys() -> JwtKeys {
        JwtKeys::from_secret(SECRET)
    }

    fn state() -> web::Data<AppState> {
        web::Data::new(AppState::in_memory(SECRET, Arc::new(LogMailer)))
    }

    #[actix_rt::test]
    async fn test_valid_token_attaches_claims() {
        let app = test::init_service(
            App::new()
                .app_data(state())
                .wrap(AuthMiddleware)
                .service(whoami),
        )
        .await;

        let user_id = Uuid::new_v4();
        let token = generate_token(&keys(), user_id, Role::User).unwrap();
        let req = test::TestRequest::get()
            .uri("/api/whoami")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(body, user_id.to_string());
    }

    #[actix_rt::test]
    async fn test_missing_and_bad_tokens_are_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(state())
                .wrap(AuthMiddleware)
                .service(whoami),
        )
        .await;

        let foreign = generate_token(
            &JwtKeys::from_secret("someone-else"),
            Uuid::new_v4(),
            Role::Admin,
        )
        .unwrap();

        let headers = [
            None,
            Some("Bearer ".to_string()),
            Some("Basic dXNlcjpwYXNz".to_string()),
            Some("Bearer garbage".to_string()),
            Some(format!("Bearer {}", foreign)),
        ];

        for header_value in headers {
            let mut req = test::TestRequest::get().uri("/api/whoami");
            if let Some(value) = &header_value {
                req = req.insert_header((header::AUTHORIZATION, value.clone()));
            }
            let resp = test::call_service(&app, req.to_request()).await;
            assert_eq!(
                resp.status(),
                StatusCode::UNAUTHORIZED,
                "header {:?} should be rejected",
                header_value
            );
        }
    }

    #[actix_rt::test]
    async fn test_public_paths_skip_verification() {
        let app = test::init_service(
            App::new()
                .app_data(state())
                .wrap(AuthMiddleware)
                .service(open_login),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/auth/login").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
