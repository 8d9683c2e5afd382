//! Index origin conversion.
//!
//! Host arrays are 0-based; PostgreSQL array subscripts are 1-based. A
//! constant index is adjusted once, here, and lands in the SQL as a literal.
//! A variable index is only known when the query runs, so the `+ 1` is
//! emitted into the SQL instead of being folded.
//!
//! `get_byte` is 0-based like the host; byte-array indexing never comes
//! through this module.

use crate::sql_generator::{SqlExpr, SqlOperator};

/// Subscript for a constant host index, or `None` when the index can never
/// address an element (negative, or overflowing on adjustment).
pub fn constant_subscript(host_index: i64) -> Option<i64> {
    if host_index < 0 {
        return None;
    }
    host_index.checked_add(1)
}

/// Subscript expression for a host index known only at execution time.
pub fn runtime_subscript(host_index: SqlExpr) -> SqlExpr {
    SqlExpr::binary(SqlOperator::Add, host_index, SqlExpr::integer(1))
}
