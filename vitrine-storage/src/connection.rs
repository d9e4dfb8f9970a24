use sea_orm::{ConnectOptions, Database, DatabaseConnection as SeaConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use thiserror::Error;
use tracing::{debug, info};
use vitrine_config::DatabaseConfig;

/// Database connection wrapper with configuration
#[derive(Clone)]
pub struct DatabaseConnection {
    connection: SeaConnection,
    config: DatabaseConfig,
}

/// Storage-level errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DbError(#[from] DbErr),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl DatabaseConnection {
    /// Create a new database connection with configuration
    pub async fn new(config: DatabaseConfig) -> Result<Self, StorageError> {
        info!("Connecting to database");

        let mut opts = ConnectOptions::new(&config.url);
        opts.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(config.connection_timeout)
            .acquire_timeout(config.connection_timeout)
            .sqlx_logging(false);

        let connection = Database::connect(opts).await?;

        debug!(
            "Database connection established with {} max connections",
            config.max_connections
        );

        Ok(Self { connection, config })
    }

    /// Run pending migrations
    pub async fn migrate(&self) -> Result<(), StorageError> {
        crate::migrations::Migrator::up(&self.connection, None)
            .await
            .map_err(|e| StorageError::MigrationError(e.to_string()))?;
        Ok(())
    }

    pub fn get_connection(&self) -> &SeaConnection {
        &self.connection
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }
}
