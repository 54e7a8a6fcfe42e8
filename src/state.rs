use std::sync::Arc;

use crate::auth::JwtKeys;
use crate::notify::{Mailer, Notifier};
use crate::store::{MemoryStore, TaskStore, UserStore};

/// Shared application state, registered once as `web::Data<AppState>`.
///
/// Everything inside is either immutable or internally synchronised, so
/// cloning per worker is cheap.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub keys: JwtKeys,
    pub notifier: Notifier,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserStore>,
        tasks: Arc<dyn TaskStore>,
        keys: JwtKeys,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let notifier = Notifier::new(mailer, users.clone());
        Self {
            users,
            tasks,
            keys,
            notifier,
        }
    }

    /// State backed by a fresh [`MemoryStore`] serving both users and tasks.
    pub fn in_memory(jwt_secret: &str, mailer: Arc<dyn Mailer>) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(
            store.clone(),
            store,
            JwtKeys::from_secret(jwt_secret),
            mailer,
        )
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("keys", &self.keys)
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}
