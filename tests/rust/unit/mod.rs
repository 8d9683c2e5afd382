//! Unit tests - Translation through the public API, no execution
//!
//! Each test compiles a query and asserts on the generated SQL and
//! parameters only.

mod index_translation_tests;
mod model_config_tests;
