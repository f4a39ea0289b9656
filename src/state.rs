use crate::config::VitalsConfig;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub config: VitalsConfig,
    pub db: SqlitePool,
}
