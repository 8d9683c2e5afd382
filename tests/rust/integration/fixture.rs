use std::sync::Arc;

use pgarray::config::{ClientEvaluation, TranslatorConfig};
use pgarray::executor::{MemoryExecutor, Row};
use pgarray::model_catalog::EntityModelConfig;
use pgarray::query_model::{EntityQuery, HostExpr, HostType, Value};
use pgarray::DbSession;

pub const MODEL_YAML: &str = r#"
entities:
  - name: SomeEntity
    table: SomeEntities
    key: Id
    properties:
      - { name: Id, type: integer }
      - { name: SomeArray, type: "integer[]" }
      - { name: SomeBytea, type: bytea }
      - { name: SomeText, type: text }
"#;

/// Two rows: {Id=1, [3,4]} and {Id=2, [5,6,7]}.
pub fn seeded_executor() -> MemoryExecutor {
    let executor = MemoryExecutor::new();
    executor.insert(
        "SomeEntities",
        Row::new()
            .with("Id", 1)
            .with("SomeArray", Value::integer_array([3, 4]))
            .with("SomeBytea", Value::byte_array(&[3, 4]))
            .with("SomeText", "abc"),
    );
    executor.insert(
        "SomeEntities",
        Row::new()
            .with("Id", 2)
            .with("SomeArray", Value::integer_array([5, 6, 7]))
            .with("SomeBytea", Value::byte_array(&[5, 6, 7]))
            .with("SomeText", "de"),
    );
    executor
}

pub fn session_with(config: TranslatorConfig) -> DbSession {
    let model = EntityModelConfig::from_yaml_str(MODEL_YAML)
        .and_then(|c| c.to_model())
        .expect("fixture model is valid");
    DbSession::new(Arc::new(model), Arc::new(seeded_executor()), config)
}

pub fn session() -> DbSession {
    session_with(TranslatorConfig {
        client_evaluation: ClientEvaluation::Allow,
        ..Default::default()
    })
}

pub fn query() -> EntityQuery {
    EntityQuery::new("SomeEntity")
}

pub fn some_array(query: &EntityQuery) -> HostExpr {
    query.param().member("SomeArray", HostType::INTEGER_ARRAY)
}

pub fn some_bytea(query: &EntityQuery) -> HostExpr {
    query.param().member("SomeBytea", HostType::BYTE_ARRAY)
}

pub fn id_of(row: &Row) -> i64 {
    row.get("Id")
        .and_then(Value::as_integer)
        .expect("row has an integer Id")
}
