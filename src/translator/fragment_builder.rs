//! SQL fragment construction for matched array shapes.
//!
//! Every rule that reaches this module has already been validated by the
//! matcher. Sub-expressions (index operands, the other side of a
//! `SequenceEqual`) are translated through [`super::translate_expr`]; if one
//! of them cannot be translated the whole shape falls back to `None`.

use super::context::TranslationContext;
use super::errors::TranslationError;
use super::index_adjuster::{constant_subscript, runtime_subscript};
use super::matcher::{IndexOperand, SequenceOperand, TranslationRule};
use super::parameter_binder::{bind_evaluated, bind_variable};
use super::translate_expr;
use crate::model_catalog::ArrayColumnDescriptor;
use crate::query_model::{HostExpr, HostType, NewArray, ScalarType, Value};
use crate::sql_generator::{
    get_function_mapping, ArrayIndex, IndexKind, SqlExpr, SqlLiteral, SqlOperator,
};

pub fn build(
    rule: TranslationRule<'_>,
    ctx: &mut TranslationContext<'_>,
) -> Result<Option<SqlExpr>, TranslationError> {
    match rule {
        TranslationRule::ArraySubscript { column, index } => {
            let index = match index {
                IndexOperand::Constant(host_index) => match constant_subscript(host_index) {
                    Some(subscript) => SqlExpr::integer(subscript),
                    None => return Ok(None),
                },
                IndexOperand::Runtime(expr) => match translate_expr(expr, ctx)? {
                    Some(sql) => runtime_subscript(sql),
                    None => return Ok(None),
                },
            };
            Ok(Some(element_access(ctx, &column, index, IndexKind::Subscript)))
        }
        TranslationRule::ByteIndex { column, index } => {
            let Some(index) = translate_expr(index, ctx)? else {
                return Ok(None);
            };
            Ok(Some(element_access(ctx, &column, index, IndexKind::GetByte)))
        }
        TranslationRule::SequenceEqual { column, other } => {
            let right = match other {
                SequenceOperand::Variable(variable) => Some(bind_variable(ctx, variable)?),
                SequenceOperand::Literal(array) => inline_new_array(ctx, array)?,
                SequenceOperand::Constant(constant) => {
                    let shown = HostExpr::Constant(constant.clone());
                    check_conforms(&shown, &constant.value, constant.ty)?;
                    match literal_for_value(&constant.value, constant.ty) {
                        Some(sql) => Some(sql),
                        None => {
                            let key = format!("const:{}:{}", constant.ty, constant.value);
                            Some(bind_evaluated(ctx, &key, &constant.value, constant.ty)?)
                        }
                    }
                }
                SequenceOperand::Column(other) => Some(column_ref(ctx, &other)),
                SequenceOperand::Other(expr) => translate_expr(expr, ctx)?,
            };
            let Some(right) = right else {
                return Ok(None);
            };
            let left = column_ref(ctx, &column);
            log::debug!("SequenceEqual on `{}` lowered to equality", column.property);
            Ok(Some(SqlExpr::binary(SqlOperator::Equal, left, right)))
        }
        TranslationRule::Length { column, member } => {
            let Some(mapping) = get_function_mapping(member, column.store) else {
                return Ok(None);
            };
            Ok(Some(mapping.apply(vec![column_ref(ctx, &column)])))
        }
    }
}

fn column_ref(ctx: &TranslationContext<'_>, column: &ArrayColumnDescriptor) -> SqlExpr {
    SqlExpr::column(ctx.table_alias(), &column.column)
}

fn element_access(
    ctx: &TranslationContext<'_>,
    column: &ArrayColumnDescriptor,
    index: SqlExpr,
    kind: IndexKind,
) -> SqlExpr {
    SqlExpr::ArrayIndex(ArrayIndex {
        array: Box::new(column_ref(ctx, column)),
        index: Box::new(index),
        kind,
    })
}

/// `new[] { 3, 4 }` compared against a column. All-constant arrays are
/// inlined; anything else goes through normal translation.
fn inline_new_array(
    ctx: &mut TranslationContext<'_>,
    array: &NewArray,
) -> Result<Option<SqlExpr>, TranslationError> {
    let constants: Option<Vec<Value>> = array
        .elements
        .iter()
        .map(|element| match element {
            HostExpr::Constant(constant) => Some(constant.value.clone()),
            _ => None,
        })
        .collect();

    let ty = HostType::Array(array.element_type);
    match constants {
        // `ARRAY[]` has no element type in PostgreSQL; bind empty arrays instead.
        Some(values) if values.is_empty() => {
            let value = Value::Array(values);
            let key = format!("const:{}:{}", ty, value);
            Ok(Some(bind_evaluated(ctx, &key, &value, ty)?))
        }
        Some(values) => {
            let value = Value::Array(values);
            check_conforms(&HostExpr::NewArray(array.clone()), &value, ty)?;
            Ok(literal_for_value(&value, ty))
        }
        None => translate_expr(&HostExpr::NewArray(array.clone()), ctx),
    }
}

/// A constant must hold a value of its declared type before it is inlined or bound.
pub fn check_conforms(
    expr: &HostExpr,
    value: &Value,
    ty: HostType,
) -> Result<(), TranslationError> {
    if value.conforms_to(&ty) {
        return Ok(());
    }
    Err(TranslationError::Binding {
        variable: expr.to_string(),
        ty,
        value: value.to_string(),
    })
}

/// Inline SQL literal for a host value, or `None` if it has no literal form.
pub fn literal_for_value(value: &Value, ty: HostType) -> Option<SqlExpr> {
    match (value, ty) {
        (Value::Null, _) => Some(SqlExpr::Literal(SqlLiteral::Null)),
        (Value::Boolean(b), _) => Some(SqlExpr::Literal(SqlLiteral::Boolean(*b))),
        (Value::Integer(i), _) => Some(SqlExpr::integer(*i)),
        (Value::Text(s), _) => Some(SqlExpr::Literal(SqlLiteral::Text(s.clone()))),
        (Value::Array(_), HostType::Array(ScalarType::Byte)) => value
            .to_bytes()
            .map(|bytes| SqlExpr::Literal(SqlLiteral::Bytea(bytes))),
        (Value::Array(items), HostType::Array(element)) if !items.is_empty() => items
            .iter()
            .map(|item| literal_for_value(item, HostType::Scalar(element)))
            .collect::<Option<Vec<_>>>()
            .map(SqlExpr::ArrayLiteral),
        _ => None,
    }
}
