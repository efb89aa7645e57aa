use crate::config::{DatabaseConfig, DbDriver};
use crate::domain::task_state::errors::TaskStateError;
use sqlx::{AnyConnection, Connection};

/// Open a single connection using the runtime-selected driver.
///
/// Default driver timeouts apply. The caller owns the connection and must close it; prefer
/// [`with_connection`], which does so on every exit path.
pub async fn connect(config: &DatabaseConfig) -> Result<AnyConnection, TaskStateError> {
    sqlx::any::install_default_drivers();
    let driver = config.driver()?;
    tracing::debug!(url = %config.redacted_url(), ?driver, "Opening database connection");
    AnyConnection::connect(&config.url()?)
        .await
        .map_err(|e| TaskStateError::Connection(e.to_string()))
}

/// Run `f` with a freshly opened connection, closing it afterwards whether `f` succeeded or
/// not. The closure's result is returned unchanged; a failure to close is only logged.
pub async fn with_connection<T, F>(config: &DatabaseConfig, f: F) -> Result<T, TaskStateError>
where
    F: AsyncFnOnce(&mut AnyConnection, DbDriver) -> Result<T, TaskStateError>,
{
    let driver = config.driver()?;
    let mut conn = connect(config).await?;
    let result = f(&mut conn, driver).await;

    if let Err(e) = conn.close().await {
        tracing::warn!(error = %e, "Failed to close database connection cleanly");
    } else {
        tracing::debug!("Database connection closed");
    }
    result
}

/// Bind parameter markers for `driver`, numbered from `start`.
pub fn placeholders(driver: DbDriver, start: usize, count: usize) -> Vec<String> {
    (start..start + count)
        .map(|n| match driver {
            DbDriver::Postgres => format!("${n}"),
            DbDriver::MySql | DbDriver::Sqlite => "?".to_string(),
        })
        .collect()
}

/// Classify a driver error as a connectivity problem or a statement failure.
pub fn map_sqlx_error(err: sqlx::Error) -> TaskStateError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => TaskStateError::Connection(err.to_string()),
        other => TaskStateError::Query(other.to_string()),
    }
}
