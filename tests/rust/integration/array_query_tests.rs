//! Array index, SequenceEqual and Length queries against the seeded rows.

use super::fixture::{
    id_of, query, seeded_executor, session, session_with, some_array, some_bytea,
};
use pgarray::config::TranslatorConfig;
use pgarray::executor::ExecutorError;
use pgarray::query_model::{HostExpr, HostType, ScalarType, Value};
use pgarray::SessionError;
use std::sync::Arc;

#[tokio::test]
async fn test_roundtrip_preserves_order_and_values() {
    assert_eq!(seeded_executor().row_count("SomeEntities"), 2);
    let session = session();
    let q = query();
    let predicate = q.param().member("Id", HostType::INTEGER).equal(HostExpr::int(1));
    let row = session.single(&q.filter(predicate)).await.unwrap();
    assert_eq!(row.get("SomeArray"), Some(&Value::integer_array([3, 4])));
    assert_eq!(row.get("SomeBytea"), Some(&Value::byte_array(&[3, 4])));
}

#[tokio::test]
async fn test_array_index_with_constant() {
    let session = session();
    let q = query();
    let predicate = some_array(&q).index(HostExpr::int(0)).equal(HostExpr::int(3));
    let row = session.single(&q.filter(predicate)).await.unwrap();
    assert_eq!(id_of(&row), 1);
    assert_eq!(
        session.sql_log().statements(),
        vec![concat!(
            r#"SELECT "e"."Id", "e"."SomeArray", "e"."SomeBytea", "e"."SomeText""#,
            "\n",
            r#"FROM "SomeEntities" AS "e""#,
            "\n",
            r#"WHERE ("e"."SomeArray"[1]) = 3"#,
            "\n",
            "LIMIT 2"
        )]
    );
}

#[tokio::test]
async fn test_array_index_with_non_constant() {
    let session = session();
    let q = query();
    let x = HostExpr::variable("x", Value::Integer(0), HostType::INTEGER);
    let predicate = some_array(&q).index(x).equal(HostExpr::int(3));
    let row = session.single(&q.filter(predicate)).await.unwrap();
    assert_eq!(id_of(&row), 1);
    assert!(session.sql_log().contains(r#"WHERE ("e"."SomeArray"[@__x_0 + 1]) = 3"#));
}

#[tokio::test]
async fn test_bytea_index() {
    let session = session();
    let q = query();
    let predicate = some_bytea(&q).index(HostExpr::int(0)).equal(HostExpr::int(3));
    let row = session.single(&q.filter(predicate)).await.unwrap();
    assert_eq!(id_of(&row), 1);
    assert!(session.sql_log().contains(r#"WHERE (get_byte("e"."SomeBytea", 0)) = 3"#));
}

#[tokio::test]
async fn test_sequence_equal_with_parameter() {
    let session = session();
    let q = query();
    let arr = HostExpr::variable("arr", Value::integer_array([3, 4]), HostType::INTEGER_ARRAY);
    let row = session
        .single(&q.clone().filter(some_array(&q).sequence_equal(arr)))
        .await
        .unwrap();
    assert_eq!(id_of(&row), 1);
    assert!(session.sql_log().contains(r#"WHERE "e"."SomeArray" = @__arr_0"#));
    assert_eq!(session.sql_log().last().unwrap().parameters.len(), 1);
}

#[tokio::test]
async fn test_sequence_equal_with_literal() {
    let session = session();
    let q = query();
    let literal = HostExpr::new_array(ScalarType::Integer, vec![HostExpr::int(3), HostExpr::int(4)]);
    let row = session
        .single(&q.clone().filter(some_array(&q).sequence_equal(literal)))
        .await
        .unwrap();
    assert_eq!(id_of(&row), 1);
    assert!(session.sql_log().contains(r#"WHERE "e"."SomeArray" = ARRAY[3,4]"#));
    assert!(session.sql_log().last().unwrap().parameters.is_empty());
}

#[tokio::test]
async fn test_array_length() {
    let session = session();
    let q = query();
    let predicate = some_array(&q).length().equal(HostExpr::int(2));
    let row = session.single(&q.filter(predicate)).await.unwrap();
    assert_eq!(id_of(&row), 1);
    assert!(session
        .sql_log()
        .contains(r#"WHERE array_length("e"."SomeArray", 1) = 2"#));
}

#[tokio::test]
async fn test_subscript_past_the_end_is_null_on_the_server() {
    let session = session();
    let q = query();
    // Row 1 has two elements; PostgreSQL yields NULL for [3] and the row drops out.
    let predicate = some_array(&q).index(HostExpr::int(2)).equal(HostExpr::int(7));
    let rows = session.to_list(&q.filter(predicate)).await.unwrap();
    assert_eq!(rows.iter().map(id_of).collect::<Vec<_>>(), vec![2]);
}

#[tokio::test]
async fn test_get_byte_past_the_end_is_a_server_error() {
    let session = session();
    let q = query();
    let predicate = some_bytea(&q).index(HostExpr::int(2)).equal(HostExpr::int(7));
    let result = session.to_list(&q.filter(predicate)).await;
    assert!(matches!(
        result,
        Err(SessionError::Executor(ExecutorError::Evaluation(message))) if message.contains("out of valid range")
    ));
}

#[tokio::test]
async fn test_projection_of_element() {
    let session = session();
    let q = query();
    let rows = session
        .to_list(&q.clone().select(some_array(&q).index(HostExpr::int(1))))
        .await
        .unwrap();
    let values: Vec<&Value> = rows.iter().filter_map(|row| row.get("Value")).collect();
    assert_eq!(values, vec![&Value::Integer(4), &Value::Integer(6)]);
}

#[tokio::test]
async fn test_count_by_length() {
    let session = session();
    let q = query();
    let predicate = some_array(&q).length().equal(HostExpr::int(3));
    assert_eq!(session.count(&q.filter(predicate)).await.unwrap(), 1);
    assert!(session.sql_log().contains("SELECT COUNT(*)::INT"));
}

#[tokio::test]
async fn test_sensitive_data_logging_shows_values() {
    let session = session_with(TranslatorConfig {
        sensitive_data_logging: true,
        ..Default::default()
    });
    let q = query();
    let x = HostExpr::variable("x", Value::Integer(1), HostType::INTEGER);
    let predicate = some_array(&q).index(x).equal(HostExpr::int(6));
    let row = session.first(&q.filter(predicate)).await.unwrap();
    assert_eq!(id_of(&row), 2);
    assert!(session.sql_log().sql().starts_with("-- @__x_0='1' (integer)\n"));
}

#[tokio::test]
async fn test_sessions_can_share_a_log() {
    let first = session();
    let second = session().with_log(Arc::clone(first.sql_log()));
    let q = query();

    first.count(&q).await.unwrap();
    second.to_list(&q).await.unwrap();
    assert_eq!(first.sql_log().len(), 2);
}
