//! Index origin properties of the generated SQL.

use pgarray::config::TranslatorConfig;
use pgarray::model_catalog::{EntityConfig, EntityModel, EntityModelConfig};
use pgarray::query_model::{EntityQuery, HostExpr, HostType, Value};
use pgarray::translate_query;
use test_case::test_case;

fn model() -> EntityModel {
    EntityModelConfig::default()
        .with_entity(
            EntityConfig::new("SomeEntity", "SomeEntities", "Id")
                .property("Id", "integer")
                .property("SomeArray", "integer[]")
                .property("SomeBytea", "bytea"),
        )
        .to_model()
        .unwrap()
}

fn where_clause(query: &EntityQuery) -> String {
    let compiled = translate_query(query, &model(), &TranslatorConfig::default()).unwrap();
    compiled
        .command
        .sql
        .lines()
        .find_map(|line| line.strip_prefix("WHERE "))
        .unwrap_or_default()
        .to_string()
}

#[test_case(0, 1 ; "first element")]
#[test_case(1, 2 ; "second element")]
#[test_case(41, 42 ; "far element")]
fn test_constant_index_is_shifted_at_compile_time(host: i64, subscript: i64) {
    let q = EntityQuery::new("SomeEntity");
    let predicate = q
        .param()
        .member("SomeArray", HostType::INTEGER_ARRAY)
        .index(HostExpr::int(host))
        .equal(HostExpr::int(9));
    assert_eq!(
        where_clause(&q.filter(predicate)),
        format!(r#"("e"."SomeArray"[{}]) = 9"#, subscript)
    );
}

#[test_case(0 ; "zero")]
#[test_case(5 ; "non-zero")]
fn test_variable_index_is_shifted_in_sql(value: i64) {
    let q = EntityQuery::new("SomeEntity");
    let x = HostExpr::variable("x", Value::Integer(value), HostType::INTEGER);
    let predicate = q
        .param()
        .member("SomeArray", HostType::INTEGER_ARRAY)
        .index(x)
        .equal(HostExpr::int(9));
    assert_eq!(
        where_clause(&q.filter(predicate)),
        r#"("e"."SomeArray"[@__x_0 + 1]) = 9"#
    );
}

#[test_case(HostExpr::int(0) ; "constant")]
#[test_case(HostExpr::variable("i", Value::Integer(0), HostType::INTEGER) ; "variable")]
fn test_byte_index_is_never_shifted(index: HostExpr) {
    let q = EntityQuery::new("SomeEntity");
    let predicate = q
        .param()
        .member("SomeBytea", HostType::BYTE_ARRAY)
        .index(index)
        .equal(HostExpr::int(3));
    let sql = where_clause(&q.filter(predicate));
    assert!(sql.starts_with(r#"(get_byte("e"."SomeBytea", "#));
    assert!(!sql.contains("+ 1"));
    assert!(!sql.contains(", 1)"));
}

#[test]
fn test_negative_constant_index_falls_back_to_client() {
    let q = EntityQuery::new("SomeEntity");
    let predicate = q
        .param()
        .member("SomeArray", HostType::INTEGER_ARRAY)
        .index(HostExpr::int(-1))
        .equal(HostExpr::int(9));
    let compiled = translate_query(&q.filter(predicate), &model(), &TranslatorConfig::default())
        .unwrap();
    assert!(compiled.residual_predicate.is_some());
    assert!(!compiled.command.sql.contains("WHERE"));
}
