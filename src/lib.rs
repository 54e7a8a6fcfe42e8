#![doc = "The `taskmate` library crate."]
#![doc = ""]
#![doc = "Session tokens and role checks (`auth`), account and task operations"]
#![doc = "(`services`), assignment notifications (`notify`), persistence adapters"]
#![doc = "(`store`) and the HTTP routes that expose them. The binary in `main.rs`"]
#![doc = "wires these together from `config::Config`."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

pub use error::AppError;
pub use state::AppState;
