//! Shared application state for all routes.

use crate::resource::Registry;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// Validated at startup; read-only afterwards.
    pub registry: Arc<Registry>,
}

impl AppState {
    pub fn new(pool: PgPool, registry: Registry) -> Self {
        Self {
            pool,
            registry: Arc::new(registry),
        }
    }
}
