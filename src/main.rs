use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::sync::Arc;

use taskmate::auth::{AuthMiddleware, JwtKeys};
use taskmate::config::Config;
use taskmate::notify::{LogMailer, Mailer, SmtpMailer};
use taskmate::routes::{self, health};
use taskmate::store::{MemoryStore, PgStore};
use taskmate::AppState;

async fn build_state(config: &Config) -> std::io::Result<AppState> {
    let keys = JwtKeys::from_secret(&config.jwt_secret);

    let mailer: Arc<dyn Mailer> = match &config.smtp {
        Some(smtp) => {
            let mailer = SmtpMailer::new(smtp).map_err(to_io)?;
            match mailer.verify().await {
                Ok(()) => log::info!("SMTP connection to {} verified", smtp.host),
                Err(e) => log::error!("SMTP connection error: {}", e),
            }
            Arc::new(mailer)
        }
        None => {
            log::warn!("SMTP_HOST not set; assignment emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url).await.map_err(to_io)?;
            store.migrate().await.map_err(to_io)?;
            let store = Arc::new(store);
            Ok(AppState::new(store.clone(), store, keys, mailer))
        }
        None => {
            log::warn!("DATABASE_URL not set; using the in-memory store");
            let store = Arc::new(MemoryStore::new());
            Ok(AppState::new(store.clone(), store, keys, mailer))
        }
    }
}

fn to_io(err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(to_io)?;
    let state = web::Data::new(build_state(&config).await?);

    log::info!("Starting taskmate server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
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
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
