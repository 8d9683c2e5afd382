//! pgarray - PostgreSQL array translation for host query expressions
//!
//! This crate compiles host predicates and projections over array-typed
//! columns into PostgreSQL:
//! - 0-based host indexing to 1-based array subscripts
//! - `get_byte` for byte arrays stored as `bytea`
//! - `SequenceEqual` to array equality, `Length` to `array_length`
//! - captured variables to named parameters
//!
//! Untranslatable parts of a query are evaluated on the client.

pub mod config;
pub mod executor;
pub mod model_catalog;
pub mod query_model;
pub mod session;
pub mod sql_generator;
pub mod translator;

pub use config::{ClientEvaluation, TranslatorConfig};
pub use session::{DbSession, SessionError};
pub use translator::{translate_query, CompiledQuery, TranslationError};
