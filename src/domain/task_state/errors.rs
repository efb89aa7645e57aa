use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskStateError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Query error: {0}")]
    Query(String),
    #[error("Invalid date key: {0}")]
    InvalidDateKey(String),
    #[error("Validation error: {0}")]
    Validation(String),
}
