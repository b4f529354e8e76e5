use sqlx::PgPool;

use crate::config::AppConfig;
use crate::database::{DatabaseError, DatabaseManager};

/// Shared by every handler; cloning only clones the pool handle
#[derive(Debug, Clone)]
pub struct AppState {
    pub pool: PgPool,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to the configured database, running migrations if enabled
    pub async fn from_config(config: &AppConfig) -> Result<Self, DatabaseError> {
        let pool = DatabaseManager::connect(&config.database).await?;
        if config.database.run_migrations {
            DatabaseManager::migrate(&pool).await?;
        }
        Ok(Self::new(pool))
    }

    /// State whose pool connects on first use; nothing is opened up front
    pub fn lazy(config: &AppConfig) -> Result<Self, DatabaseError> {
        Ok(Self::new(DatabaseManager::connect_lazy(&config.database)?))
    }
}
