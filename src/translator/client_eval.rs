//! In-process evaluation of host expressions.
//!
//! Used for two things: closed sub-expressions the translator evaluates once
//! and binds as a parameter (no row), and predicates or projections that
//! could not be translated, evaluated against each fetched row.
//!
//! Semantics are the host's, not PostgreSQL's: indexing is 0-based and an
//! out-of-range index is an error rather than NULL.

use thiserror::Error;

use crate::query_model::{BinaryOperator, HostExpr, MethodCall, Row, Value};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClientEvalError {
    #[error("Row has no member `{member}`")]
    UnknownMember { member: String },

    #[error("Index {index} is outside the bounds of the array (length {length})")]
    IndexOutOfRange { index: i64, length: usize },

    #[error("Null value in `{expression}`")]
    NullReference { expression: String },

    #[error("Cannot evaluate `{expression}`: {message}")]
    TypeError { expression: String, message: String },

    #[error("Arithmetic overflow in `{expression}`")]
    Overflow { expression: String },

    #[error("Method `{method}` is not supported in client evaluation")]
    UnsupportedMethod { method: String },

    #[error("`{expression}` reads the row, but no row is available")]
    UnboundRow { expression: String },
}

fn type_error(expr: &HostExpr, message: &str) -> ClientEvalError {
    ClientEvalError::TypeError {
        expression: expr.to_string(),
        message: message.to_string(),
    }
}

/// Evaluate `expr`. Member reads on the lambda parameter come from `row`.
pub fn evaluate(expr: &HostExpr, row: Option<&Row>) -> Result<Value, ClientEvalError> {
    match expr {
        HostExpr::EntityRef(_) => Err(type_error(expr, "an entity is not a value")),
        HostExpr::Constant(constant) => Ok(constant.value.clone()),
        HostExpr::Variable(variable) => Ok(variable.value.clone()),
        HostExpr::NewArray(array) => array
            .elements
            .iter()
            .map(|element| evaluate(element, row))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        HostExpr::Member(member) => {
            if let HostExpr::EntityRef(_) = member.target.as_ref() {
                let row = row.ok_or_else(|| ClientEvalError::UnboundRow {
                    expression: expr.to_string(),
                })?;
                return row
                    .get(&member.member)
                    .cloned()
                    .ok_or_else(|| ClientEvalError::UnknownMember {
                        member: member.member.clone(),
                    });
            }
            let target = evaluate(&member.target, row)?;
            match member.member.as_str() {
                "Length" | "Count" => length_of(&target, expr),
                other => Err(ClientEvalError::UnknownMember {
                    member: other.to_string(),
                }),
            }
        }
        HostExpr::Index(index) => {
            let array = evaluate(&index.array, row)?;
            let position = evaluate(&index.index, row)?;
            element_at(&array, &position, expr)
        }
        HostExpr::MethodCall(call) => evaluate_call(call, expr, row),
        HostExpr::Binary(binary) => {
            let left = evaluate(&binary.left, row)?;
            match binary.operator {
                BinaryOperator::AndAlso | BinaryOperator::OrElse => {
                    let left = left
                        .as_bool()
                        .ok_or_else(|| type_error(expr, "logical operand is not a boolean"))?;
                    let short_circuit = binary.operator == BinaryOperator::OrElse;
                    if left == short_circuit {
                        return Ok(Value::Boolean(left));
                    }
                    let right = evaluate(&binary.right, row)?;
                    right
                        .as_bool()
                        .map(Value::Boolean)
                        .ok_or_else(|| type_error(expr, "logical operand is not a boolean"))
                }
                operator => {
                    let right = evaluate(&binary.right, row)?;
                    apply_binary(operator, &left, &right, expr)
                }
            }
        }
        HostExpr::Not(inner) => evaluate(inner, row)?
            .as_bool()
            .map(|b| Value::Boolean(!b))
            .ok_or_else(|| type_error(expr, "operand of ! is not a boolean")),
    }
}

/// Evaluate a predicate; a NULL result filters the row out.
pub fn evaluate_predicate(expr: &HostExpr, row: &Row) -> Result<bool, ClientEvalError> {
    match evaluate(expr, Some(row))? {
        Value::Boolean(b) => Ok(b),
        Value::Null => Ok(false),
        _ => Err(type_error(expr, "predicate is not a boolean")),
    }
}

fn length_of(value: &Value, expr: &HostExpr) -> Result<Value, ClientEvalError> {
    match value {
        Value::Array(items) => Ok(Value::Integer(items.len() as i64)),
        Value::Text(text) => Ok(Value::Integer(text.chars().count() as i64)),
        Value::Null => Err(ClientEvalError::NullReference {
            expression: expr.to_string(),
        }),
        _ => Err(type_error(expr, "value has no length")),
    }
}

fn element_at(array: &Value, position: &Value, expr: &HostExpr) -> Result<Value, ClientEvalError> {
    let items = match array {
        Value::Array(items) => items,
        Value::Null => {
            return Err(ClientEvalError::NullReference {
                expression: expr.to_string(),
            })
        }
        _ => return Err(type_error(expr, "indexed value is not an array")),
    };
    let index = position
        .as_integer()
        .ok_or_else(|| type_error(expr, "index is not an integer"))?;
    usize::try_from(index)
        .ok()
        .and_then(|i| items.get(i))
        .cloned()
        .ok_or(ClientEvalError::IndexOutOfRange {
            index,
            length: items.len(),
        })
}

fn evaluate_call(
    call: &MethodCall,
    expr: &HostExpr,
    row: Option<&Row>,
) -> Result<Value, ClientEvalError> {
    let operands = call
        .operands()
        .into_iter()
        .map(|operand| evaluate(operand, row))
        .collect::<Result<Vec<_>, _>>()?;

    match (call.method.as_str(), operands.as_slice()) {
        ("SequenceEqual", [left, right]) => match (left, right) {
            (Value::Array(left), Value::Array(right)) => Ok(Value::Boolean(left == right)),
            (Value::Null, _) | (_, Value::Null) => Err(ClientEvalError::NullReference {
                expression: expr.to_string(),
            }),
            _ => Err(type_error(expr, "SequenceEqual operands must be arrays")),
        },
        ("Length" | "Count", [source]) => length_of(source, expr),
        _ => Err(ClientEvalError::UnsupportedMethod {
            method: call.method.clone(),
        }),
    }
}

fn apply_binary(
    operator: BinaryOperator,
    left: &Value,
    right: &Value,
    expr: &HostExpr,
) -> Result<Value, ClientEvalError> {
    match operator {
        BinaryOperator::Equal => Ok(Value::Boolean(left == right)),
        BinaryOperator::NotEqual => Ok(Value::Boolean(left != right)),
        BinaryOperator::LessThan
        | BinaryOperator::LessThanOrEqual
        | BinaryOperator::GreaterThan
        | BinaryOperator::GreaterThanOrEqual => {
            // Lifted comparisons: anything against null is false.
            let ordering = match (left, right) {
                (Value::Null, _) | (_, Value::Null) => return Ok(Value::Boolean(false)),
                (Value::Integer(l), Value::Integer(r)) => l.cmp(r),
                (Value::Text(l), Value::Text(r)) => l.cmp(r),
                _ => return Err(type_error(expr, "operands are not comparable")),
            };
            let result = match operator {
                BinaryOperator::LessThan => ordering.is_lt(),
                BinaryOperator::LessThanOrEqual => ordering.is_le(),
                BinaryOperator::GreaterThan => ordering.is_gt(),
                _ => ordering.is_ge(),
            };
            Ok(Value::Boolean(result))
        }
        BinaryOperator::Add | BinaryOperator::Subtract | BinaryOperator::Multiply => {
            let (l, r) = match (left, right) {
                (Value::Null, _) | (_, Value::Null) => return Ok(Value::Null),
                (Value::Integer(l), Value::Integer(r)) => (*l, *r),
                _ => return Err(type_error(expr, "arithmetic on non-integers")),
            };
            let result = match operator {
                BinaryOperator::Add => l.checked_add(r),
                BinaryOperator::Subtract => l.checked_sub(r),
                _ => l.checked_mul(r),
            };
            result.map(Value::Integer).ok_or_else(|| ClientEvalError::Overflow {
                expression: expr.to_string(),
            })
        }
        BinaryOperator::AndAlso | BinaryOperator::OrElse => {
            Err(type_error(expr, "logical operators short-circuit"))
        }
    }
}
