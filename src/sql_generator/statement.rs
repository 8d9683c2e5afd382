use serde::Serialize;

use super::common::{is_valid_identifier, quote_identifier};
use super::errors::SqlGenerationError;
use super::sql_expr::{SqlExpr, SqlParameter};
use super::to_sql::ToSql;

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
    pub alias: String,
}

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct SelectItem {
    pub expr: SqlExpr,
    /// Host name the value is materialized under.
    pub name: String,
}

#[derive(Debug, PartialEq, Clone, Serialize)]
pub enum Projection {
    Items(Vec<SelectItem>),
    /// `COUNT(*)::INT`
    CountStar,
}

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct SelectStatement {
    pub projection: Projection,
    pub from: TableRef,
    pub predicate: Option<SqlExpr>,
    pub limit: Option<u64>,
}

/// A rendered statement ready for execution.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct SqlCommand {
    pub sql: String,
    #[serde(skip)]
    pub statement: SelectStatement,
    pub parameters: Vec<SqlParameter>,
}

/// Render a statement to PostgreSQL text.
///
/// ```text
/// SELECT "e"."Id", "e"."SomeArray"
/// FROM "SomeEntities" AS "e"
/// WHERE ("e"."SomeArray"[1]) = 3
/// LIMIT 2
/// ```
pub fn generate_sql(statement: &SelectStatement) -> Result<String, SqlGenerationError> {
    let mut sql = String::from("SELECT ");
    match &statement.projection {
        Projection::Items(items) => {
            if items.is_empty() {
                return Err(SqlGenerationError::EmptyProjection);
            }
            let rendered: Vec<String> = items.iter().map(|item| item.expr.to_sql()).collect();
            sql.push_str(&rendered.join(", "));
        }
        Projection::CountStar => sql.push_str("COUNT(*)::INT"),
    }

    sql.push_str("\nFROM ");
    sql.push_str(&render_table(&statement.from)?);

    if let Some(predicate) = &statement.predicate {
        sql.push_str("\nWHERE ");
        sql.push_str(&predicate.to_sql());
    }

    if let Some(limit) = statement.limit {
        sql.push_str(&format!("\nLIMIT {}", limit));
    }

    Ok(sql)
}

fn render_table(table: &TableRef) -> Result<String, SqlGenerationError> {
    for ident in [Some(&table.name), Some(&table.alias), table.schema.as_ref()]
        .into_iter()
        .flatten()
    {
        if !is_valid_identifier(ident) {
            return Err(SqlGenerationError::InvalidIdentifier(ident.clone()));
        }
    }
    let name = match &table.schema {
        Some(schema) => format!("{}.{}", quote_identifier(schema), quote_identifier(&table.name)),
        None => quote_identifier(&table.name),
    };
    Ok(format!("{} AS {}", name, quote_identifier(&table.alias)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(schema: Option<&str>) -> TableRef {
        TableRef {
            schema: schema.map(|s| s.to_string()),
            name: "SomeEntities".to_string(),
            alias: "e".to_string(),
        }
    }

    #[test]
    fn test_count_with_schema() {
        let statement = SelectStatement {
            projection: Projection::CountStar,
            from: table(Some("public")),
            predicate: None,
            limit: None,
        };
        assert_eq!(
            generate_sql(&statement).unwrap(),
            "SELECT COUNT(*)::INT\nFROM \"public\".\"SomeEntities\" AS \"e\""
        );
    }

    #[test]
    fn test_empty_projection_is_rejected() {
        let statement = SelectStatement {
            projection: Projection::Items(vec![]),
            from: table(None),
            predicate: None,
            limit: Some(1),
        };
        assert_eq!(generate_sql(&statement), Err(SqlGenerationError::EmptyProjection));
    }
}
