//! Integration tests - Queries compiled, logged, and executed end to end
//!
//! These tests run a `DbSession` over the in-memory executor, so they check
//! both the SQL that is sent and the rows that come back.

mod array_query_tests;
mod client_evaluation_tests;
mod fixture;
