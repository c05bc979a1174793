use crate::auth::SessionStore;
use crate::config::{Config, SpentConvention};
use crate::db::DbPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
            sessions: SessionStore::new(),
        }
    }

    pub fn spent_convention(&self) -> SpentConvention {
        self.config.spent_convention
    }
}
