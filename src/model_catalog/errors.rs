//! # Model Error Types
//!
//! Errors raised while loading entity definitions and resolving host members
//! against them.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelError {
    #[error("No entity named `{entity}` in the model")]
    Entity { entity: String },
    #[error("Entity `{entity}` has no property `{property}`")]
    Property { entity: String, property: String },
    #[error("Entity `{entity}` declares property `{property}` more than once")]
    DuplicateProperty { entity: String, property: String },
    #[error("Entity `{entity}` is declared more than once")]
    DuplicateEntity { entity: String },
    #[error("Key property `{key}` is not declared on entity `{entity}`")]
    MissingKey { entity: String, key: String },
    #[error("Invalid type for `{entity}.{property}`: {message}")]
    InvalidType {
        entity: String,
        property: String,
        message: String,
    },
    #[error("Failed to read model file: {error}")]
    ConfigReadError { error: String },
    #[error("Failed to parse model: {error}")]
    ConfigParseError { error: String },
}

impl ModelError {
    /// Attach the file or operation the error surfaced in.
    pub fn config_error_with_context(error: impl Into<String>, context: impl Into<String>) -> Self {
        ModelError::ConfigReadError {
            error: format!("{}\n  Context: {}", error.into(), context.into()),
        }
    }
}
