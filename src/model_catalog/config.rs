/// Entity model configuration.
///
/// Entities are declared in YAML:
///
/// ```yaml
/// entities:
///   - name: SomeEntity          # Host entity name
///     table: SomeEntities       # PostgreSQL table
///     key: Id                   # Key property
///     properties:
///       - { name: Id, type: integer }
///       - { name: SomeArray, type: "integer[]" }
///       - { name: SomeBytea, type: bytea }
///       - { name: SomeText, type: text, column: some_text }
/// ```
///
/// `column` defaults to the property name. Types are `integer`, `byte`,
/// `text`, `boolean`, an array of those (`integer[]`), or `bytea` (same as
/// `byte[]`).
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use super::descriptor::{EntityDescriptor, EntityModel, PropertyDescriptor};
use super::errors::ModelError;
use crate::query_model::HostType;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityModelConfig {
    #[serde(default)]
    pub entities: Vec<EntityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityConfig {
    pub name: String,
    pub table: String,
    pub key: String,
    #[serde(default)]
    pub properties: Vec<PropertyConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub column: Option<String>,
}

impl EntityConfig {
    pub fn new(name: &str, table: &str, key: &str) -> Self {
        Self {
            name: name.to_string(),
            table: table.to_string(),
            key: key.to_string(),
            properties: Vec::new(),
        }
    }

    pub fn property(mut self, name: &str, type_name: &str) -> Self {
        self.properties.push(PropertyConfig {
            name: name.to_string(),
            type_name: type_name.to_string(),
            column: None,
        });
        self
    }

    pub fn property_with_column(mut self, name: &str, type_name: &str, column: &str) -> Self {
        self.properties.push(PropertyConfig {
            name: name.to_string(),
            type_name: type_name.to_string(),
            column: Some(column.to_string()),
        });
        self
    }

    fn to_descriptor(&self) -> Result<EntityDescriptor, ModelError> {
        let mut seen = HashSet::new();
        let mut properties = Vec::with_capacity(self.properties.len());
        for prop in &self.properties {
            if !seen.insert(prop.name.as_str()) {
                return Err(ModelError::DuplicateProperty {
                    entity: self.name.clone(),
                    property: prop.name.clone(),
                });
            }
            let ty = prop
                .type_name
                .parse::<HostType>()
                .map_err(|e| ModelError::InvalidType {
                    entity: self.name.clone(),
                    property: prop.name.clone(),
                    message: e.to_string(),
                })?;
            if ty == HostType::Entity {
                return Err(ModelError::InvalidType {
                    entity: self.name.clone(),
                    property: prop.name.clone(),
                    message: "entity-typed properties are not supported".to_string(),
                });
            }
            properties.push(PropertyDescriptor {
                name: prop.name.clone(),
                column: prop.column.clone().unwrap_or_else(|| prop.name.clone()),
                ty,
            });
        }

        if !seen.contains(self.key.as_str()) {
            return Err(ModelError::MissingKey {
                entity: self.name.clone(),
                key: self.key.clone(),
            });
        }

        Ok(EntityDescriptor {
            name: self.name.clone(),
            table: self.table.clone(),
            key: self.key.clone(),
            properties,
        })
    }
}

impl EntityModelConfig {
    pub fn with_entity(mut self, entity: EntityConfig) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ModelError> {
        serde_yaml::from_str(yaml).map_err(|e| ModelError::ConfigParseError {
            error: e.to_string(),
        })
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ModelError::config_error_with_context(e.to_string(), path.display().to_string())
        })?;
        Self::from_yaml_str(&content)
    }

    /// Validate every entity and build the immutable model.
    pub fn to_model(&self) -> Result<EntityModel, ModelError> {
        let mut names = HashSet::new();
        let mut descriptors = Vec::with_capacity(self.entities.len());
        for entity in &self.entities {
            if !names.insert(entity.name.as_str()) {
                return Err(ModelError::DuplicateEntity {
                    entity: entity.name.clone(),
                });
            }
            descriptors.push(entity.to_descriptor()?);
        }
        log::debug!("Built entity model with {} entities", descriptors.len());
        Ok(EntityModel::from_descriptors(descriptors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_catalog::ArrayStore;
    use std::io::Write;

    const MODEL_YAML: &str = r#"
entities:
  - name: SomeEntity
    table: SomeEntities
    key: Id
    properties:
      - { name: Id, type: integer }
      - { name: SomeArray, type: "integer[]" }
      - { name: SomeBytea, type: bytea }
      - { name: SomeText, type: text, column: some_text }
"#;

    #[test]
    fn test_load_model_from_yaml() {
        let model = EntityModelConfig::from_yaml_str(MODEL_YAML)
            .unwrap()
            .to_model()
            .unwrap();
        let entity = model.entity("SomeEntity").unwrap();
        assert_eq!(entity.table, "SomeEntities");
        assert_eq!(entity.property("SomeText").unwrap().column, "some_text");
        assert!(entity.array_column("SomeText").is_none());
        assert_eq!(entity.array_column("SomeBytea").unwrap().store, ArrayStore::Bytea);
    }

    #[test]
    fn test_load_model_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MODEL_YAML.as_bytes()).unwrap();
        let model = EntityModelConfig::from_yaml_file(file.path())
            .unwrap()
            .to_model()
            .unwrap();
        assert_eq!(model.entity_names(), vec!["SomeEntity"]);
    }

    #[test]
    fn test_missing_key_is_rejected() {
        let config = EntityModelConfig::default()
            .with_entity(EntityConfig::new("SomeEntity", "SomeEntities", "Id").property("Name", "text"));
        assert_eq!(
            config.to_model().unwrap_err(),
            ModelError::MissingKey {
                entity: "SomeEntity".to_string(),
                key: "Id".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let config = EntityModelConfig::default().with_entity(
            EntityConfig::new("SomeEntity", "SomeEntities", "Id")
                .property("Id", "integer")
                .property("When", "timestamp"),
        );
        assert!(matches!(
            config.to_model(),
            Err(ModelError::InvalidType { property, .. }) if property == "When"
        ));
    }

    #[test]
    fn test_duplicate_property_is_rejected() {
        let config = EntityModelConfig::default().with_entity(
            EntityConfig::new("SomeEntity", "SomeEntities", "Id")
                .property("Id", "integer")
                .property("Id", "text"),
        );
        assert!(matches!(
            config.to_model(),
            Err(ModelError::DuplicateProperty { .. })
        ));
    }
}
