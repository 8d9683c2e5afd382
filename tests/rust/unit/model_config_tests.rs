//! Unit tests for entity model loading
//!
//! Tests YAML parsing and validation of entity definitions without
//! compiling any query.

use pgarray::model_catalog::{ArrayStore, EntityConfig, EntityModelConfig, ModelError};

#[test]
fn test_array_columns_get_their_store() {
    let yaml = r#"
entities:
  - name: Post
    table: posts
    key: Id
    properties:
      - { name: Id, type: int }
      - { name: Tags, type: "text[]", column: tags }
      - { name: Digest, type: "byte[]" }
"#;
    let model = EntityModelConfig::from_yaml_str(yaml).unwrap().to_model().unwrap();
    let post = model.entity("Post").unwrap();
    let tags = post.array_column("Tags").unwrap();
    assert_eq!(tags.column, "tags");
    assert_eq!(tags.store, ArrayStore::PgArray);
    assert_eq!(post.array_column("Digest").unwrap().store, ArrayStore::Bytea);
    assert!(post.array_column("Id").is_none());
}

#[test]
fn test_unknown_type_is_rejected() {
    let yaml = r#"
entities:
  - name: Post
    table: posts
    key: Id
    properties:
      - { name: Id, type: integer }
      - { name: Shape, type: polygon }
"#;
    let result = EntityModelConfig::from_yaml_str(yaml).unwrap().to_model();
    assert!(matches!(result, Err(ModelError::InvalidType { property, .. }) if property == "Shape"));
}

#[test]
fn test_missing_key_is_rejected() {
    let yaml = r#"
entities:
  - name: Post
    table: posts
    key: Id
    properties:
      - { name: Title, type: text }
"#;
    let result = EntityModelConfig::from_yaml_str(yaml).unwrap().to_model();
    assert!(matches!(result, Err(ModelError::MissingKey { .. })));
}

#[test]
fn test_builder_with_column_override() {
    let model = EntityModelConfig::default()
        .with_entity(
            EntityConfig::new("Post", "posts", "Id")
                .property("Id", "integer")
                .property_with_column("Tags", "text[]", "tag_list"),
        )
        .to_model()
        .unwrap();
    let tags = model.entity("Post").unwrap().array_column("Tags").unwrap();
    assert_eq!(tags.column, "tag_list");
}

#[test]
fn test_malformed_yaml() {
    assert!(matches!(
        EntityModelConfig::from_yaml_str("entities: [name: ]]"),
        Err(ModelError::ConfigParseError { .. })
    ));
}
