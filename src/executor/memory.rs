//! In-memory reference executor.
//!
//! Evaluates a [`SelectStatement`] over rows held in memory, following what
//! PostgreSQL does for the constructs the translator emits:
//!
//! - array subscripts are 1-based and yield NULL out of range;
//! - `get_byte` is 0-based and raises an error out of range;
//! - `array_length` of an empty array is NULL;
//! - comparisons and logic use three-valued logic;
//! - arrays compare element-wise.
//!
//! Rows are returned in insertion order; the translator never emits ORDER BY.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use super::{ExecutorError, Row, SqlExecutor};
use crate::query_model::Value;
use crate::sql_generator::{
    ArrayIndex, IndexKind, Projection, SelectStatement, SqlCommand, SqlExpr, SqlLiteral,
    SqlOperator, SqlParameter,
};

#[derive(Debug, Default)]
pub struct MemoryExecutor {
    tables: RwLock<HashMap<String, Vec<Row>>>,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row; cells are keyed by column name.
    pub fn insert(&self, table: &str, row: Row) {
        let mut tables = match self.tables.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        tables.entry(table.to_string()).or_default().push(row);
    }

    pub fn row_count(&self, table: &str) -> usize {
        let tables = match self.tables.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        tables.get(table).map_or(0, Vec::len)
    }

    fn run(&self, statement: &SelectStatement, params: &[SqlParameter]) -> Result<Vec<Row>, ExecutorError> {
        let tables = self
            .tables
            .read()
            .map_err(|e| ExecutorError::Backend(e.to_string()))?;
        let rows = tables
            .get(&statement.from.name)
            .ok_or_else(|| ExecutorError::UnknownTable(statement.from.name.clone()))?;

        let eval = Evaluator { params };
        let mut matched = Vec::new();
        for row in rows {
            let keep = match &statement.predicate {
                Some(predicate) => eval.eval(predicate, row)? == Value::Boolean(true),
                None => true,
            };
            if keep {
                matched.push(row);
            }
        }

        let mut output = match &statement.projection {
            Projection::CountStar => {
                vec![Row::new().with("count", Value::Integer(matched.len() as i64))]
            }
            Projection::Items(items) => matched
                .into_iter()
                .map(|row| {
                    let mut out = Row::new();
                    for item in items {
                        out.set(&item.name, eval.eval(&item.expr, row)?);
                    }
                    Ok(out)
                })
                .collect::<Result<Vec<_>, ExecutorError>>()?,
        };

        if let Some(limit) = statement.limit {
            output.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        Ok(output)
    }
}

#[async_trait]
impl SqlExecutor for MemoryExecutor {
    async fn execute(&self, command: &SqlCommand) -> Result<Vec<Row>, ExecutorError> {
        let rows = self.run(&command.statement, &command.parameters)?;
        log::debug!("Memory executor returned {} row(s)", rows.len());
        Ok(rows)
    }
}

struct Evaluator<'a> {
    params: &'a [SqlParameter],
}

impl Evaluator<'_> {
    fn eval(&self, expr: &SqlExpr, row: &Row) -> Result<Value, ExecutorError> {
        match expr {
            SqlExpr::Column(column) => {
                row.get(&column.column)
                    .cloned()
                    .ok_or_else(|| ExecutorError::UnknownColumn {
                        column: column.column.clone(),
                    })
            }
            SqlExpr::Literal(literal) => Ok(match literal {
                SqlLiteral::Null => Value::Null,
                SqlLiteral::Boolean(b) => Value::Boolean(*b),
                SqlLiteral::Integer(i) => Value::Integer(*i),
                SqlLiteral::Text(s) => Value::Text(s.clone()),
                SqlLiteral::Bytea(bytes) => Value::byte_array(bytes),
            }),
            SqlExpr::Parameter(param) => self
                .params
                .get(param.slot)
                .map(|p| p.value.clone())
                .ok_or_else(|| ExecutorError::MissingParameter {
                    name: param.name.clone(),
                    slot: param.slot,
                }),
            SqlExpr::ArrayIndex(index) => self.eval_index(index, row),
            SqlExpr::FunctionCall(call) => {
                let args = call
                    .args
                    .iter()
                    .map(|arg| self.eval(arg, row))
                    .collect::<Result<Vec<_>, _>>()?;
                call_function(&call.name, &args)
            }
            SqlExpr::ArrayLiteral(items) => items
                .iter()
                .map(|item| self.eval(item, row))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            SqlExpr::Binary(binary) => {
                let left = self.eval(&binary.left, row)?;
                let right = self.eval(&binary.right, row)?;
                apply_operator(binary.operator, left, right)
            }
            SqlExpr::Not(inner) => Ok(match self.eval(inner, row)? {
                Value::Boolean(b) => Value::Boolean(!b),
                Value::Null => Value::Null,
                other => {
                    return Err(ExecutorError::Evaluation(format!(
                        "argument of NOT must be type boolean, not {}",
                        other
                    )))
                }
            }),
            SqlExpr::IsNull(inner) => Ok(Value::Boolean(self.eval(inner, row)?.is_null())),
        }
    }

    fn eval_index(&self, index: &ArrayIndex, row: &Row) -> Result<Value, ExecutorError> {
        let array = self.eval(&index.array, row)?;
        let position = self.eval(&index.index, row)?;
        let (Value::Array(items), Value::Integer(position)) = (&array, &position) else {
            // NULL array or NULL index.
            return Ok(Value::Null);
        };

        match index.kind {
            IndexKind::Subscript => Ok(position
                .checked_sub(1)
                .and_then(|i| usize::try_from(i).ok())
                .and_then(|i| items.get(i))
                .cloned()
                .unwrap_or(Value::Null)),
            IndexKind::GetByte => usize::try_from(*position)
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .ok_or_else(|| {
                    ExecutorError::Evaluation(format!(
                        "index {} out of valid range, 0..{}",
                        position,
                        items.len() as i64 - 1
                    ))
                }),
        }
    }
}

fn call_function(name: &str, args: &[Value]) -> Result<Value, ExecutorError> {
    match (name, args) {
        ("array_length", [Value::Array(items), Value::Integer(1)]) => Ok(if items.is_empty() {
            Value::Null
        } else {
            Value::Integer(items.len() as i64)
        }),
        // One-dimensional arrays only; other dimensions have no length.
        ("array_length", [_, _]) => Ok(Value::Null),
        ("length", [Value::Array(items)]) => Ok(Value::Integer(items.len() as i64)),
        ("length", [Value::Text(text)]) => Ok(Value::Integer(text.chars().count() as i64)),
        ("length", [Value::Null]) => Ok(Value::Null),
        _ => Err(ExecutorError::UnsupportedFunction(format!(
            "{}({} argument(s))",
            name,
            args.len()
        ))),
    }
}

fn apply_operator(operator: SqlOperator, left: Value, right: Value) -> Result<Value, ExecutorError> {
    match operator {
        SqlOperator::And => Ok(match (left.as_bool(), right.as_bool()) {
            (Some(false), _) | (_, Some(false)) => Value::Boolean(false),
            (Some(true), Some(true)) => Value::Boolean(true),
            _ => Value::Null,
        }),
        SqlOperator::Or => Ok(match (left.as_bool(), right.as_bool()) {
            (Some(true), _) | (_, Some(true)) => Value::Boolean(true),
            (Some(false), Some(false)) => Value::Boolean(false),
            _ => Value::Null,
        }),
        _ if left.is_null() || right.is_null() => Ok(Value::Null),
        SqlOperator::Equal => Ok(Value::Boolean(left == right)),
        SqlOperator::NotEqual => Ok(Value::Boolean(left != right)),
        SqlOperator::LessThan
        | SqlOperator::LessThanOrEqual
        | SqlOperator::GreaterThan
        | SqlOperator::GreaterThanOrEqual => {
            let ordering = match (&left, &right) {
                (Value::Integer(l), Value::Integer(r)) => l.cmp(r),
                (Value::Text(l), Value::Text(r)) => l.cmp(r),
                _ => {
                    return Err(ExecutorError::Evaluation(format!(
                        "operator does not exist: {} {} {}",
                        left,
                        operator.symbol(),
                        right
                    )))
                }
            };
            Ok(Value::Boolean(match operator {
                SqlOperator::LessThan => ordering.is_lt(),
                SqlOperator::LessThanOrEqual => ordering.is_le(),
                SqlOperator::GreaterThan => ordering.is_gt(),
                _ => ordering.is_ge(),
            }))
        }
        SqlOperator::Add | SqlOperator::Subtract | SqlOperator::Multiply => {
            let (Value::Integer(l), Value::Integer(r)) = (&left, &right) else {
                return Err(ExecutorError::Evaluation(format!(
                    "operator does not exist: {} {} {}",
                    left,
                    operator.symbol(),
                    right
                )));
            };
            let result = match operator {
                SqlOperator::Add => l.checked_add(*r),
                SqlOperator::Subtract => l.checked_sub(*r),
                _ => l.checked_mul(*r),
            };
            result
                .map(Value::Integer)
                .ok_or_else(|| ExecutorError::Evaluation("integer out of range".to_string()))
        }
    }
}
