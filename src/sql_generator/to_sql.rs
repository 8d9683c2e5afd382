use super::common::{bytea_literal, qualified_column, quote_text};
use super::sql_expr::{IndexKind, SqlExpr, SqlLiteral};

/// Convert a SQL node to PostgreSQL text
pub trait ToSql {
    fn to_sql(&self) -> String;
}

impl ToSql for SqlLiteral {
    fn to_sql(&self) -> String {
        match self {
            SqlLiteral::Null => "NULL".to_string(),
            SqlLiteral::Boolean(true) => "TRUE".to_string(),
            SqlLiteral::Boolean(false) => "FALSE".to_string(),
            SqlLiteral::Integer(i) => i.to_string(),
            SqlLiteral::Text(s) => quote_text(s),
            SqlLiteral::Bytea(bytes) => bytea_literal(bytes),
        }
    }
}

impl ToSql for SqlExpr {
    fn to_sql(&self) -> String {
        match self {
            SqlExpr::Column(col) => qualified_column(&col.table_alias, &col.column),
            SqlExpr::Literal(lit) => lit.to_sql(),
            SqlExpr::Parameter(param) => param.name.clone(),
            SqlExpr::ArrayIndex(index) => match index.kind {
                // The subscript itself is never parenthesized: `"e"."SomeArray"[@__x_0 + 1]`
                IndexKind::Subscript => {
                    format!("{}[{}]", index.array.to_sql(), index.index.to_sql())
                }
                IndexKind::GetByte => {
                    format!("get_byte({}, {})", index.array.to_sql(), index.index.to_sql())
                }
            },
            SqlExpr::FunctionCall(call) => {
                let args: Vec<String> = call.args.iter().map(|a| a.to_sql()).collect();
                format!("{}({})", call.name, args.join(", "))
            }
            SqlExpr::ArrayLiteral(items) => {
                let items: Vec<String> = items.iter().map(|i| i.to_sql()).collect();
                format!("ARRAY[{}]", items.join(","))
            }
            SqlExpr::Binary(binary) => format!(
                "{} {} {}",
                render_operand(&binary.left),
                binary.operator.symbol(),
                render_operand(&binary.right)
            ),
            SqlExpr::Not(inner) => format!("NOT ({})", inner.to_sql()),
            SqlExpr::IsNull(inner) => format!("{} IS NULL", render_operand(inner)),
        }
    }
}

/// Operands that are themselves operations, and element accesses, are
/// parenthesized: `("e"."SomeArray"[1]) = 3`, `(a + b) = c`.
fn render_operand(expr: &SqlExpr) -> String {
    match expr {
        SqlExpr::Binary(_) | SqlExpr::ArrayIndex(_) => format!("({})", expr.to_sql()),
        _ => expr.to_sql(),
    }
}
