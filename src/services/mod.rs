//! Business operations behind the HTTP routes. Every function takes the shared
//! [`AppState`](crate::state::AppState) and returns `Result<_, AppError>`.

pub mod accounts;
pub mod tasks;
