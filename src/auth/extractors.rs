use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::{require_role, Claims};
use crate::error::AppError;
use crate::models::Role;

/// The verified claims of the caller, as attached by `AuthMiddleware`.
///
/// Fails with `AppError::Unauthorized` when no claims are present, which only
/// happens if the route is not wrapped by the middleware.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Claims);

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from(req).map(AuthenticatedUser).map_err(Into::into))
    }
}

/// Like [`AuthenticatedUser`], but additionally requires the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Claims);

impl FromRequest for AdminUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = claims_from(req).and_then(|claims| {
            require_role(&claims, Role::Admin)?;
            Ok(AdminUser(claims))
        });
        ready(result.map_err(Into::into))
    }
}

fn claims_from(req: &HttpRequest) -> Result<Claims, AppError> {
    req.extensions().get::<Claims>().cloned().ok_or_else(|| {
        AppError::Unauthorized("Claims not found in request. Ensure AuthMiddleware is active.".into())
    })
}
