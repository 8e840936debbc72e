use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::config::Config;
use crate::ingest::{IdSource, IngestSettings, RandomIds};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
    pub ingest: Arc<IngestSettings>,
    pub ids: Arc<dyn IdSource>,
    /// Bounds how many uplinks are decoded and stored at once
    pub ingest_permits: Arc<Semaphore>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        Self::with_id_source(db, config, Arc::new(RandomIds))
    }

    pub fn with_id_source(db: DatabaseConnection, config: Config, ids: Arc<dyn IdSource>) -> Self {
        Self {
            db,
            ingest: Arc::new(config.ingest_settings()),
            ingest_permits: Arc::new(Semaphore::new(config.ingest_concurrent_limit)),
            config: Arc::new(config),
            ids,
        }
    }
}
