//! Entity model catalog.
//!
//! Maps host entities and properties to PostgreSQL tables and columns. The
//! model is built once (from code or YAML) and is immutable afterwards;
//! translation only reads it.

pub mod config;
pub mod descriptor;
pub mod errors;

pub use config::{EntityConfig, EntityModelConfig, PropertyConfig};
pub use descriptor::{
    ArrayColumnDescriptor, ArrayStore, EntityDescriptor, EntityModel, PropertyDescriptor,
};
pub use errors::ModelError;
