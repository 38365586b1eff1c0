use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::Settings;
use crate::errors::AppError;

#[tracing::instrument(name = "Initialize database pool", skip(settings))]
pub async fn init_db(settings: &Settings) -> Result<PgPool, AppError> {
    tracing::info!(
        max_connections = settings.database_max_connections,
        "Connecting to metadata store"
    );

    let pool = PgPoolOptions::new()
        .max_connections(settings.database_max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&settings.database_url)
        .await
        .map_err(|e| {
            AppError::Configuration(format!("Could not connect to metadata store: {}", e))
        })?;

    tracing::info!("Metadata store pool ready");
    Ok(pool)
}
