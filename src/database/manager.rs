use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::database::record::RecordError;
use crate::filter::FilterError;
use crate::tenant::TenantError;

/// Errors surfaced by the data layer.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Tenant(#[from] TenantError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Opens the shared application pool from `DATABASE_URL`.
///
/// Every tenant's rows live in the same database. Isolation is logical,
/// enforced per query by the scope layer, never by separate schemas or
/// per-tenant pools.
pub async fn connect() -> Result<PgPool, DatabaseError> {
    let url = database_url()?;
    let settings = &crate::config::config().database;

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.connection_timeout))
        .connect(&url)
        .await?;

    info!(max_connections = settings.max_connections, "database pool ready");
    Ok(pool)
}

/// Pings the pool with a trivial query.
pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

fn database_url() -> Result<String, DatabaseError> {
    std::env::var("DATABASE_URL").map_err(|_| DatabaseError::ConfigMissing("DATABASE_URL"))
}
