pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;

use actix_web::web;

use crate::error::AppError;

/// Registers everything that lives under `/api`. The caller wraps the scope
/// with `AuthMiddleware`.
pub fn config(cfg: &mut web::ServiceConfig) {
    configure_extractors(cfg);
    cfg.service(
        web::scope("/auth")
            .service(auth::login)
            .service(auth::register)
            .service(auth::change_password)
            .service(auth::update_profile)
            .service(users::list_users)
            .service(users::create_user)
            .service(users::update_user)
            .service(users::delete_user),
    )
    .service(
        web::scope("/tasks")
            .service(tasks::get_tasks)
            .service(tasks::create_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    );
}

/// Body and path extraction failures come back as `AppError::BadRequest`, so
/// they carry the same `{ "error": ... }` body as every other failure.
pub fn configure_extractors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, post, test, App, HttpResponse};
    use serde::Deserialize;
    use uuid::Uuid;

    #[derive(Deserialize)]
    struct Payload {
        #[allow(dead_code)]
        name: String,
    }

    #[post("/things/{id}")]
    async fn create_thing(_id: web::Path<Uuid>, _body: web::Json<Payload>) -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    #[actix_web::test]
    async fn test_extraction_errors_are_json() {
        let app = test::init_service(
            App::new().service(web::scope("").configure(configure_extractors).service(create_thing)),
        )
        .await;

        let cases = [
            (format!("/things/{}", Uuid::new_v4()), serde_json::json!({})),
            ("/things/not-a-uuid".to_string(), serde_json::json!({ "name": "x" })),
        ];
        for (uri, body) in cases {
            let req = test::TestRequest::post().uri(&uri).set_json(body).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);

            let json: serde_json::Value = test::read_body_json(resp).await;
            assert!(json["error"].is_string(), "{}: {}", uri, json);
        }
    }
}
