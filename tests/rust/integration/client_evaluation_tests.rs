//! Predicates and projections that PostgreSQL cannot run.

use super::fixture::{id_of, query, session, session_with, some_array};
use pgarray::config::{ClientEvaluation, TranslatorConfig};
use pgarray::query_model::{BinaryOperator, HostExpr, HostType, Value};
use pgarray::{SessionError, TranslationError};

fn text_length_is(q: &pgarray::query_model::EntityQuery, n: i64) -> HostExpr {
    q.param()
        .member("SomeText", HostType::TEXT)
        .length()
        .equal(HostExpr::int(n))
}

#[tokio::test]
async fn test_untranslatable_predicate_matches_server_semantics() {
    let session = session();
    let q = query();

    // Client-side: text length. Server-side equivalent: array length.
    let client_rows = session
        .to_list(&q.clone().filter(text_length_is(&q, 3)))
        .await
        .unwrap();
    let server_rows = session
        .to_list(&q.clone().filter(some_array(&q).length().equal(HostExpr::int(2))))
        .await
        .unwrap();

    assert_eq!(client_rows, server_rows);
    let statements = session.sql_log().statements();
    assert!(!statements[0].contains("WHERE"));
    assert!(statements[1].contains("WHERE"));
}

#[tokio::test]
async fn test_mixed_predicate_splits_between_server_and_client() {
    let session = session();
    let q = query();
    let x = HostExpr::variable("x", Value::Integer(0), HostType::INTEGER);
    let predicate = some_array(&q)
        .index(x)
        .equal(HostExpr::int(5))
        .and(text_length_is(&q, 2));
    let row = session.single(&q.filter(predicate)).await.unwrap();
    assert_eq!(id_of(&row), 2);

    let sql = session.sql_log().statements().remove(0);
    assert!(sql.ends_with(r#"WHERE ("e"."SomeArray"[@__x_0 + 1]) = 5"#));
    assert!(!sql.contains("LIMIT"));
}

#[tokio::test]
async fn test_single_with_client_filter_still_checks_cardinality() {
    let session = session();
    let q = query();
    let predicate = HostExpr::binary(
        BinaryOperator::GreaterThan,
        q.param().member("SomeText", HostType::TEXT).length(),
        HostExpr::int(0),
    );
    let result = session.single(&q.filter(predicate)).await;
    assert_eq!(result, Err(SessionError::MoreThanOneElement));
}

#[tokio::test]
async fn test_throw_rejects_before_executing() {
    let session = session_with(TranslatorConfig {
        client_evaluation: ClientEvaluation::Throw,
        ..Default::default()
    });
    let q = query();
    let result = session.to_list(&q.clone().filter(text_length_is(&q, 3))).await;
    assert!(matches!(
        result,
        Err(SessionError::Translation(TranslationError::ClientEvaluationDisallowed { .. }))
    ));
    assert!(session.sql_log().is_empty());
}

#[tokio::test]
async fn test_client_projection() {
    let session = session();
    let q = query();
    let projection = q.param().member("SomeText", HostType::TEXT).length();
    let rows = session.to_list(&q.select(projection)).await.unwrap();
    let lengths: Vec<Option<&Value>> = rows.iter().map(|row| row.get("Value")).collect();
    assert_eq!(lengths, vec![Some(&Value::Integer(3)), Some(&Value::Integer(2))]);
}

#[tokio::test]
async fn test_count_with_client_filter() {
    let session = session();
    let q = query();
    assert_eq!(session.count(&q.clone().filter(text_length_is(&q, 2))).await.unwrap(), 1);
    assert!(!session.sql_log().contains("COUNT(*)"));
}
