mod auth;
mod db;
mod monitor;
mod sessions;
mod util;

use std::sync::Arc;

pub use auth::*;
pub use db::*;
pub use monitor::*;
pub use sessions::*;
pub use util::slugify;

/// The manual system, bundling storage, authentication, and resource monitoring.
pub struct Manual {
    pub database: BoxedDatabase,
    pub auth: Auth,
    pub monitor: Arc<Monitor>,
}

impl Manual {
    pub fn new(
        database: BoxedDatabase,
        sampler: Arc<dyn Sampler>,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        Self {
            auth: Auth::new(&database),
            monitor: Arc::new(Monitor::new(&database, sampler, notifier)),
            database,
        }
    }
}
