//! Expression Matcher
//!
//! Recognizes the host shapes that have a dedicated array lowering:
//!
//! | Host shape                        | Rule              |
//! |-----------------------------------|-------------------|
//! | `e.Arr[i]` on a typed array       | `ArraySubscript`  |
//! | `e.Bytes[i]` on a byte array      | `ByteIndex`       |
//! | `e.Arr.SequenceEqual(other)`      | `SequenceEqual`   |
//! | `e.Arr.Length`, `e.Arr.Count()`   | `Length`          |
//!
//! Matching is side-effect free. Shapes with the wrong operand types
//! (non-integer index, negative constant index, element-type mismatch,
//! length over a non-array) do not match, so the fragment builder only ever
//! sees valid shapes.

use crate::model_catalog::{ArrayColumnDescriptor, ArrayStore, EntityDescriptor};
use crate::query_model::{
    CapturedVariable, Constant, HostExpr, HostType, MemberAccess, MethodCall, NewArray,
};
use crate::sql_generator::is_function_supported;

use super::index_adjuster::constant_subscript;

#[derive(Debug, PartialEq, Clone)]
pub enum IndexOperand<'a> {
    /// A constant host (0-based) index, already known to be addressable.
    Constant(i64),
    /// Any other integer-typed index expression.
    Runtime(&'a HostExpr),
}

#[derive(Debug, PartialEq, Clone)]
pub enum SequenceOperand<'a> {
    Variable(&'a CapturedVariable),
    /// A compile-time array construction; rendered inline.
    Literal(&'a NewArray),
    /// An array-valued constant; rendered inline.
    Constant(&'a Constant),
    Column(ArrayColumnDescriptor),
    /// Any other array-typed expression, translated as-is.
    Other(&'a HostExpr),
}

#[derive(Debug, PartialEq, Clone)]
pub enum TranslationRule<'a> {
    ArraySubscript {
        column: ArrayColumnDescriptor,
        index: IndexOperand<'a>,
    },
    ByteIndex {
        column: ArrayColumnDescriptor,
        index: &'a HostExpr,
    },
    SequenceEqual {
        column: ArrayColumnDescriptor,
        other: SequenceOperand<'a>,
    },
    Length {
        column: ArrayColumnDescriptor,
        member: &'a str,
    },
}

/// Match `expr` against the array shapes. `parameter` is the query's lambda
/// parameter name; only members read from it are columns.
pub fn match_expr<'a>(
    expr: &'a HostExpr,
    entity: &EntityDescriptor,
    parameter: &str,
) -> Option<TranslationRule<'a>> {
    match expr {
        HostExpr::Index(index) => match_index(&index.array, &index.index, entity, parameter),
        HostExpr::Member(member) => match_length_member(member, entity, parameter),
        HostExpr::MethodCall(call) => match call.method.as_str() {
            "SequenceEqual" => match_sequence_equal(call, entity, parameter),
            "Length" | "Count" => match_length_call(call, entity, parameter),
            _ => None,
        },
        _ => None,
    }
}

/// Resolve `e.Member` to an array column whose declared type agrees with
/// the node's static type.
pub fn array_column_of(
    expr: &HostExpr,
    entity: &EntityDescriptor,
    parameter: &str,
) -> Option<ArrayColumnDescriptor> {
    let HostExpr::Member(member) = expr else {
        return None;
    };
    let HostExpr::EntityRef(target) = member.target.as_ref() else {
        return None;
    };
    if target.name != parameter {
        return None;
    }
    let property = entity.property(&member.member)?;
    if property.ty != member.ty {
        return None;
    }
    property.as_array_column()
}

fn match_index<'a>(
    array: &'a HostExpr,
    index: &'a HostExpr,
    entity: &EntityDescriptor,
    parameter: &str,
) -> Option<TranslationRule<'a>> {
    let column = array_column_of(array, entity, parameter)?;
    if !index.ty().is_integer() {
        return None;
    }

    match column.store {
        ArrayStore::Bytea => {
            if let HostExpr::Constant(constant) = index {
                // get_byte is 0-based; only negativity needs checking.
                if constant.value.as_integer()? < 0 {
                    return None;
                }
            }
            Some(TranslationRule::ByteIndex { column, index })
        }
        ArrayStore::PgArray => {
            let operand = match index {
                HostExpr::Constant(constant) => {
                    let host_index = constant.value.as_integer()?;
                    constant_subscript(host_index)?;
                    IndexOperand::Constant(host_index)
                }
                other => IndexOperand::Runtime(other),
            };
            Some(TranslationRule::ArraySubscript {
                column,
                index: operand,
            })
        }
    }
}

fn match_length_member<'a>(
    member: &'a MemberAccess,
    entity: &EntityDescriptor,
    parameter: &str,
) -> Option<TranslationRule<'a>> {
    if member.member != "Length" || !member.ty.is_integer() {
        return None;
    }
    length_rule(&member.target, &member.member, entity, parameter)
}

fn match_length_call<'a>(
    call: &'a MethodCall,
    entity: &EntityDescriptor,
    parameter: &str,
) -> Option<TranslationRule<'a>> {
    let operands = call.operands();
    if operands.len() != 1 || !call.ty.is_integer() {
        return None;
    }
    length_rule(operands[0], &call.method, entity, parameter)
}

fn length_rule<'a>(
    source: &HostExpr,
    member: &'a str,
    entity: &EntityDescriptor,
    parameter: &str,
) -> Option<TranslationRule<'a>> {
    let column = array_column_of(source, entity, parameter)?;
    if !is_function_supported(member, column.store) {
        return None;
    }
    Some(TranslationRule::Length { column, member })
}

fn match_sequence_equal<'a>(
    call: &'a MethodCall,
    entity: &EntityDescriptor,
    parameter: &str,
) -> Option<TranslationRule<'a>> {
    let operands = call.operands();
    if operands.len() != 2 || !call.ty.is_comparable_with(&HostType::BOOLEAN) {
        return None;
    }
    let (left, right) = (operands[0], operands[1]);
    if !left.ty().is_array() || left.ty() != right.ty() {
        return None;
    }

    // Put the column on the left; `new[] { 3, 4 }.SequenceEqual(e.Arr)` is symmetric.
    let (column, other) = match array_column_of(left, entity, parameter) {
        Some(column) => (column, right),
        None => (array_column_of(right, entity, parameter)?, left),
    };

    let other = match other {
        HostExpr::Variable(variable) => SequenceOperand::Variable(variable),
        HostExpr::NewArray(array) => SequenceOperand::Literal(array),
        HostExpr::Constant(constant) => SequenceOperand::Constant(constant),
        expr => match array_column_of(expr, entity, parameter) {
            Some(other_column) => SequenceOperand::Column(other_column),
            None => SequenceOperand::Other(expr),
        },
    };
    Some(TranslationRule::SequenceEqual { column, other })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_model::{ScalarType, Value};
    use crate::translator::tests::fixture_entity;

    fn e() -> HostExpr {
        HostExpr::entity("e", "SomeEntity")
    }

    fn some_array() -> HostExpr {
        e().member("SomeArray", HostType::INTEGER_ARRAY)
    }

    fn some_bytea() -> HostExpr {
        e().member("SomeBytea", HostType::BYTE_ARRAY)
    }

    #[test]
    fn test_constant_subscript_matches() {
        let entity = fixture_entity();
        let expr = some_array().index(HostExpr::int(0));
        assert!(matches!(
            match_expr(&expr, &entity, "e"),
            Some(TranslationRule::ArraySubscript {
                index: IndexOperand::Constant(0),
                ..
            })
        ));
    }

    #[test]
    fn test_variable_subscript_matches_as_runtime() {
        let entity = fixture_entity();
        let x = HostExpr::variable("x", Value::Integer(0), HostType::INTEGER);
        let expr = some_array().index(x);
        assert!(matches!(
            match_expr(&expr, &entity, "e"),
            Some(TranslationRule::ArraySubscript {
                index: IndexOperand::Runtime(_),
                ..
            })
        ));
    }

    #[test]
    fn test_byte_array_routes_to_byte_index() {
        let entity = fixture_entity();
        let expr = some_bytea().index(HostExpr::int(0));
        assert!(matches!(
            match_expr(&expr, &entity, "e"),
            Some(TranslationRule::ByteIndex { .. })
        ));
    }

    #[test]
    fn test_negative_constant_index_does_not_match() {
        let entity = fixture_entity();
        assert_eq!(match_expr(&some_array().index(HostExpr::int(-1)), &entity, "e"), None);
        assert_eq!(match_expr(&some_bytea().index(HostExpr::int(-1)), &entity, "e"), None);
    }

    #[test]
    fn test_text_index_does_not_match() {
        let entity = fixture_entity();
        assert_eq!(match_expr(&some_array().index(HostExpr::text("0")), &entity, "e"), None);
    }

    #[test]
    fn test_length_over_text_does_not_match() {
        let entity = fixture_entity();
        let expr = e().member("SomeText", HostType::TEXT).length();
        assert_eq!(match_expr(&expr, &entity, "e"), None);
    }

    #[test]
    fn test_declared_type_must_agree_with_model() {
        let entity = fixture_entity();
        // SomeBytea declared as integer[] on the node: rejected, not misrouted.
        let expr = e()
            .member("SomeBytea", HostType::INTEGER_ARRAY)
            .index(HostExpr::int(0));
        assert_eq!(match_expr(&expr, &entity, "e"), None);
    }

    #[test]
    fn test_sequence_equal_element_type_mismatch() {
        let entity = fixture_entity();
        let bytes = HostExpr::variable("b", Value::byte_array(&[3, 4]), HostType::BYTE_ARRAY);
        assert_eq!(match_expr(&some_array().sequence_equal(bytes), &entity, "e"), None);
    }

    #[test]
    fn test_sequence_equal_is_symmetric() {
        let entity = fixture_entity();
        let literal = HostExpr::new_array(ScalarType::Integer, vec![HostExpr::int(3), HostExpr::int(4)]);
        let expr = literal.sequence_equal(some_array());
        match match_expr(&expr, &entity, "e") {
            Some(TranslationRule::SequenceEqual { column, other }) => {
                assert_eq!(column.property, "SomeArray");
                assert!(matches!(other, SequenceOperand::Literal(_)));
            }
            other => panic!("unexpected match: {:?}", other),
        }
    }

    #[test]
    fn test_count_call_matches_length() {
        let entity = fixture_entity();
        let expr = HostExpr::MethodCall(MethodCall {
            method: "Count".to_string(),
            receiver: Some(Box::new(some_array())),
            args: vec![],
            ty: HostType::INTEGER,
        });
        assert!(matches!(
            match_expr(&expr, &entity, "e"),
            Some(TranslationRule::Length { member: "Count", .. })
        ));
    }

    #[test]
    fn test_other_lambda_parameter_is_not_a_column() {
        let entity = fixture_entity();
        let expr = HostExpr::entity("other", "SomeEntity")
            .member("SomeArray", HostType::INTEGER_ARRAY)
            .index(HostExpr::int(0));
        assert_eq!(match_expr(&expr, &entity, "e"), None);
    }
}
