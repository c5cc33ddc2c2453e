use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn},
    rate_limit::AttemptLimiter,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub limiter: Arc<AttemptLimiter>,
}

impl AppState {
    pub fn new(pool: DbPool, orm: OrmConn, config: AppConfig) -> Self {
        let limiter = AttemptLimiter::new(
            config.sensitive_max_attempts,
            std::time::Duration::from_secs(config.sensitive_window_secs),
        );
        Self {
            pool,
            orm,
            config: Arc::new(config),
            limiter: Arc::new(limiter),
        }
    }
}
