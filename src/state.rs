use crate::config::Config;
use axum::extract::FromRef;
use sqlx::PgPool;

/// Shared application state: the database pool and the loaded config.
/// The `FromRef` impls let handlers extract either piece directly.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
