//! SQL expression tree produced by translation.
//!
//! Nodes are immutable once built. Rendering lives in `to_sql.rs`; evaluation
//! against in-memory rows lives in the executor.

use serde::Serialize;

use crate::query_model::{HostType, Value};

#[derive(Debug, PartialEq, Clone, Serialize)]
pub enum SqlExpr {
    /// `"alias"."column"`
    Column(ColumnRef),

    Literal(SqlLiteral),

    /// A bound parameter, e.g. `@__x_0`.
    Parameter(ParameterRef),

    /// Element access on an array-valued expression.
    ArrayIndex(ArrayIndex),

    FunctionCall(FunctionCall),

    /// `ARRAY[v1,v2,...]`
    ArrayLiteral(Vec<SqlExpr>),

    Binary(SqlBinary),

    Not(Box<SqlExpr>),

    /// `x IS NULL`; `= NULL` never matches in SQL.
    IsNull(Box<SqlExpr>),
}

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct ColumnRef {
    pub table_alias: String,
    pub column: String,
}

#[derive(Debug, PartialEq, Clone, Serialize)]
pub enum SqlLiteral {
    Null,
    Boolean(bool),
    Integer(i64),
    Text(String),
    Bytea(Vec<u8>),
}

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct ParameterRef {
    pub name: String,
    /// Position in the statement's parameter list.
    pub slot: usize,
}

/// How an element is extracted from an array value.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub enum IndexKind {
    /// `array[index]`, 1-based.
    Subscript,
    /// `get_byte(bytes, index)`, 0-based.
    GetByte,
}

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct ArrayIndex {
    pub array: Box<SqlExpr>,
    /// Already in the convention of `kind`.
    pub index: Box<SqlExpr>,
    pub kind: IndexKind,
}

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<SqlExpr>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub enum SqlOperator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Add,
    Subtract,
    Multiply,
    And,
    Or,
}

impl SqlOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            SqlOperator::Equal => "=",
            SqlOperator::NotEqual => "<>",
            SqlOperator::LessThan => "<",
            SqlOperator::LessThanOrEqual => "<=",
            SqlOperator::GreaterThan => ">",
            SqlOperator::GreaterThanOrEqual => ">=",
            SqlOperator::Add => "+",
            SqlOperator::Subtract => "-",
            SqlOperator::Multiply => "*",
            SqlOperator::And => "AND",
            SqlOperator::Or => "OR",
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct SqlBinary {
    pub operator: SqlOperator,
    pub left: Box<SqlExpr>,
    pub right: Box<SqlExpr>,
}

impl SqlExpr {
    pub fn column(table_alias: &str, column: &str) -> Self {
        SqlExpr::Column(ColumnRef {
            table_alias: table_alias.to_string(),
            column: column.to_string(),
        })
    }

    pub fn integer(i: i64) -> Self {
        SqlExpr::Literal(SqlLiteral::Integer(i))
    }

    pub fn binary(operator: SqlOperator, left: SqlExpr, right: SqlExpr) -> Self {
        SqlExpr::Binary(SqlBinary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn function(name: &str, args: Vec<SqlExpr>) -> Self {
        SqlExpr::FunctionCall(FunctionCall {
            name: name.to_string(),
            args,
        })
    }

    /// Number of parameter references in this tree.
    pub fn parameter_count(&self) -> usize {
        match self {
            SqlExpr::Parameter(_) => 1,
            SqlExpr::Column(_) | SqlExpr::Literal(_) => 0,
            SqlExpr::ArrayIndex(index) => {
                index.array.parameter_count() + index.index.parameter_count()
            }
            SqlExpr::FunctionCall(call) => call.args.iter().map(|a| a.parameter_count()).sum(),
            SqlExpr::ArrayLiteral(items) => items.iter().map(|i| i.parameter_count()).sum(),
            SqlExpr::Binary(binary) => {
                binary.left.parameter_count() + binary.right.parameter_count()
            }
            SqlExpr::Not(inner) | SqlExpr::IsNull(inner) => inner.parameter_count(),
        }
    }
}

/// A parameter value bound at execution time.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct SqlParameter {
    pub name: String,
    pub value: Value,
    pub ty: HostType,
}

/// A SQL expression together with the parameters it references.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct SqlFragment {
    pub expr: SqlExpr,
    pub parameters: Vec<SqlParameter>,
}
