//! PostgreSQL SQL generation.
//!
//! Holds the SQL expression tree the translator produces, renders it to
//! text, and maps host array members to PostgreSQL functions.

pub mod common;
mod errors;
mod function_registry;
mod sql_expr;
mod statement;
mod to_sql;

pub use errors::SqlGenerationError;
pub use function_registry::{get_function_mapping, is_function_supported, FunctionMapping};
pub use sql_expr::{
    ArrayIndex, ColumnRef, FunctionCall, IndexKind, ParameterRef, SqlBinary, SqlExpr, SqlFragment,
    SqlLiteral, SqlOperator, SqlParameter,
};
pub use statement::{generate_sql, Projection, SelectItem, SelectStatement, SqlCommand, TableRef};
pub use to_sql::ToSql;
