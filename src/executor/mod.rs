//! Statement execution.
//!
//! The translator produces [`SqlCommand`]s; something has to run them. A
//! real deployment implements [`SqlExecutor`] over a PostgreSQL driver. The
//! crate ships [`MemoryExecutor`], which evaluates the statement tree with
//! PostgreSQL's semantics over in-memory tables.

use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod sql_log;

pub use crate::query_model::Row;
pub use memory::MemoryExecutor;
pub use sql_log::{LoggedCommand, LoggedParameter, SqlLog};

use crate::sql_generator::SqlCommand;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExecutorError {
    #[error("relation \"{0}\" does not exist")]
    UnknownTable(String),

    #[error("column \"{column}\" does not exist")]
    UnknownColumn { column: String },

    #[error("no value bound for parameter {name} (slot {slot})")]
    MissingParameter { name: String, slot: usize },

    #[error("function {0} does not exist")]
    UnsupportedFunction(String),

    /// A runtime error raised by the database, e.g. `get_byte` out of range.
    #[error("{0}")]
    Evaluation(String),

    #[error("executor failure: {0}")]
    Backend(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Run a command and return its rows, cells named by the SELECT items.
    async fn execute(&self, command: &SqlCommand) -> Result<Vec<Row>, ExecutorError>;
}
