//! Error types for host → SQL translation.
//!
//! "Not translatable" is not an error: the translator reports it as `None`
//! and the caller decides whether to evaluate client-side. These errors are
//! for shapes that are wrong rather than merely unsupported.

use thiserror::Error;

use super::client_eval::ClientEvalError;
use crate::model_catalog::ModelError;
use crate::query_model::HostType;
use crate::sql_generator::SqlGenerationError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TranslationError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Expression references `{name}`, but the query's parameter is `{expected}`")]
    UnboundEntityReference { name: String, expected: String },

    #[error("Type mismatch in `{expression}`: expected {expected}, found {actual}")]
    TypeMismatch {
        expression: String,
        expected: HostType,
        actual: HostType,
    },

    #[error("Cannot bind variable `{variable}` as {ty}: value {value} does not convert")]
    Binding {
        variable: String,
        ty: HostType,
        value: String,
    },

    #[error("Query needs more than {limit} parameters")]
    TooManyParameters { limit: usize },

    #[error("`{expression}` cannot be translated to SQL and client evaluation is disabled ({context})")]
    ClientEvaluationDisallowed { expression: String, context: String },

    #[error("Failed to evaluate `{expression}` before binding: {source}")]
    Evaluation {
        expression: String,
        source: ClientEvalError,
    },

    #[error(transparent)]
    SqlGeneration(#[from] SqlGenerationError),
}
