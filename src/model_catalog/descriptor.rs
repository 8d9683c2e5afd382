//! Immutable entity and column descriptors produced by the model builder.

use serde::Serialize;
use std::collections::HashMap;

use super::errors::ModelError;
use crate::query_model::{HostType, ScalarType};

/// How an array-typed property is stored in PostgreSQL.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize)]
pub enum ArrayStore {
    /// A native PostgreSQL array (`integer[]`, `text[]`), subscripted 1-based.
    PgArray,
    /// A `bytea` value, read with the 0-based `get_byte`.
    Bytea,
}

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct PropertyDescriptor {
    pub name: String,
    pub column: String,
    pub ty: HostType,
}

impl PropertyDescriptor {
    pub fn as_array_column(&self) -> Option<ArrayColumnDescriptor> {
        let element_type = self.ty.element_type()?;
        Some(ArrayColumnDescriptor {
            property: self.name.clone(),
            column: self.column.clone(),
            element_type,
            store: if element_type == ScalarType::Byte {
                ArrayStore::Bytea
            } else {
                ArrayStore::PgArray
            },
        })
    }
}

/// Maps a host array property to its SQL column and element type.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct ArrayColumnDescriptor {
    pub property: String,
    pub column: String,
    pub element_type: ScalarType,
    pub store: ArrayStore,
}

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct EntityDescriptor {
    pub name: String,
    pub table: String,
    pub key: String,
    /// Declaration order; also the SELECT column order.
    pub properties: Vec<PropertyDescriptor>,
}

impl EntityDescriptor {
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn require_property(&self, name: &str) -> Result<&PropertyDescriptor, ModelError> {
        self.property(name).ok_or_else(|| ModelError::Property {
            entity: self.name.clone(),
            property: name.to_string(),
        })
    }

    pub fn array_column(&self, name: &str) -> Option<ArrayColumnDescriptor> {
        self.property(name)?.as_array_column()
    }
}

/// The set of entities a session can query.
#[derive(Debug, Default, Clone)]
pub struct EntityModel {
    entities: HashMap<String, EntityDescriptor>,
}

impl EntityModel {
    pub(crate) fn from_descriptors(descriptors: Vec<EntityDescriptor>) -> Self {
        Self {
            entities: descriptors
                .into_iter()
                .map(|d| (d.name.clone(), d))
                .collect(),
        }
    }

    pub fn entity(&self, name: &str) -> Result<&EntityDescriptor, ModelError> {
        self.entities.get(name).ok_or_else(|| ModelError::Entity {
            entity: name.to_string(),
        })
    }

    pub fn entity_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entities.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn property(name: &str, ty: HostType) -> PropertyDescriptor {
        PropertyDescriptor {
            name: name.to_string(),
            column: name.to_string(),
            ty,
        }
    }

    #[test]
    fn test_store_routes_on_element_type() {
        let ints = property("SomeArray", HostType::INTEGER_ARRAY).as_array_column().unwrap();
        assert_eq!(ints.store, ArrayStore::PgArray);
        assert_eq!(ints.element_type, ScalarType::Integer);

        let bytes = property("SomeBytea", HostType::BYTE_ARRAY).as_array_column().unwrap();
        assert_eq!(bytes.store, ArrayStore::Bytea);
    }

    #[test]
    fn test_scalar_is_not_array_column() {
        assert!(property("SomeText", HostType::TEXT).as_array_column().is_none());
    }
}
