use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SqlGenerationError {
    #[error("SELECT list is empty (a query must project at least one column)")]
    EmptyProjection,
    #[error("Invalid PostgreSQL identifier: {0:?}")]
    InvalidIdentifier(String),
}
