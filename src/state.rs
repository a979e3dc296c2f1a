use crate::config::Config;
use crate::services::Engagement;
use axum::extract::FromRef;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub engine: Engagement,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        let engine = Engagement::new(pool.clone(), config.engine);
        Self {
            pool,
            config,
            engine,
        }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Engagement {
    fn from_ref(state: &AppState) -> Self {
        state.engine.clone()
    }
}
