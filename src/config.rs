use std::env;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Runtime settings read from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. When unset the server runs on the in-memory store.
    pub database_url: Option<String>,
    pub server_port: u16,
    pub server_host: String,
    /// HMAC secret used to sign and verify session tokens.
    pub jwt_secret: String,
    /// Outgoing mail server. Without `SMTP_HOST` mail is only logged.
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// `SMTP_SECURE=true` selects implicit TLS.
    pub secure: bool,
    /// SMTP login, also used as the sender address.
    pub username: String,
    pub password: Option<String>,
}

impl SmtpConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let host = match non_empty("SMTP_HOST") {
            Some(host) => host,
            None => return Ok(None),
        };
        let secure = env::var("SMTP_SECURE").map(|v| v == "true").unwrap_or(false);
        let port = parse_port("SMTP_PORT")?.unwrap_or(if secure { 465 } else { 587 });

        Ok(Some(Self {
            host,
            port,
            secure,
            username: non_empty("SMTP_USER").ok_or(ConfigError::Missing("SMTP_USER"))?,
            password: non_empty("SMTP_PASS"),
        }))
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = non_empty("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        Ok(Self {
            database_url: non_empty("DATABASE_URL"),
            server_port: parse_port("SERVER_PORT")?.unwrap_or(8080),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            jwt_secret,
            smtp: SmtpConfig::from_env()?,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_port(name: &'static str) -> Result<Option<u16>, ConfigError> {
    non_empty(name)
        .map(|port| {
            port.parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                name,
                reason: e.to_string(),
            })
        })
        .transpose()
}
