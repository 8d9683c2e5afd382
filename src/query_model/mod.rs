//! Host query model.
//!
//! A [`HostExpr`] is the in-memory form of a host predicate or projection,
//! e.g. `e => e.SomeArray[0] == 3`, before SQL translation. Every node
//! exposes a static [`HostType`] through [`HostExpr::ty`]; the translator
//! selects lowering rules from it.
//!
//! Trees are serde-serializable so the CLI can read them from YAML or JSON.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod row;
pub mod types;
pub mod value;
pub mod visitors;

pub use row::Row;
pub use types::{HostType, ParseHostTypeError, ScalarType};
pub use value::Value;

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostExpr {
    /// The query's lambda parameter, e.g. `e` in `e => e.Id == 1`.
    EntityRef(EntityRef),

    /// Member access, e.g. `e.SomeArray` or `e.SomeArray.Length`.
    Member(MemberAccess),

    /// Indexer access, e.g. `e.SomeArray[0]`.
    Index(IndexAccess),

    /// Method call, e.g. `e.SomeArray.SequenceEqual(arr)`.
    MethodCall(MethodCall),

    /// A literal known at translation time.
    Constant(Constant),

    /// A captured host variable. Its value is known only when the query runs,
    /// so it is bound as a SQL parameter.
    Variable(CapturedVariable),

    /// A compile-time array construction, e.g. `new[] { 3, 4 }`.
    NewArray(NewArray),

    Binary(BinaryExpr),

    Not(Box<HostExpr>),
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct EntityRef {
    pub name: String,
    pub entity: String,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct MemberAccess {
    pub target: Box<HostExpr>,
    pub member: String,
    pub ty: HostType,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct IndexAccess {
    pub array: Box<HostExpr>,
    pub index: Box<HostExpr>,
}

/// A method call. Extension methods such as `SequenceEqual` are written with
/// `receiver: None` and the source as the first argument; instance calls put
/// the source in `receiver`.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub receiver: Option<Box<HostExpr>>,
    #[serde(default)]
    pub args: Vec<HostExpr>,
    pub ty: HostType,
}

impl MethodCall {
    /// The source operand followed by the remaining arguments.
    pub fn operands(&self) -> Vec<&HostExpr> {
        self.receiver
            .as_deref()
            .into_iter()
            .chain(self.args.iter())
            .collect()
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Constant {
    pub value: Value,
    pub ty: HostType,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct CapturedVariable {
    pub name: String,
    pub value: Value,
    pub ty: HostType,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct NewArray {
    pub element_type: ScalarType,
    pub elements: Vec<HostExpr>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct BinaryExpr {
    pub operator: BinaryOperator,
    pub left: Box<HostExpr>,
    pub right: Box<HostExpr>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOperator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Add,
    Subtract,
    Multiply,
    AndAlso,
    OrElse,
}

impl BinaryOperator {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Equal
                | BinaryOperator::NotEqual
                | BinaryOperator::LessThan
                | BinaryOperator::LessThanOrEqual
                | BinaryOperator::GreaterThan
                | BinaryOperator::GreaterThanOrEqual
        )
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Add | BinaryOperator::Subtract | BinaryOperator::Multiply
        )
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::AndAlso => "&&",
            BinaryOperator::OrElse => "||",
        };
        f.write_str(symbol)
    }
}

impl HostExpr {
    /// Static type of this node.
    pub fn ty(&self) -> HostType {
        match self {
            HostExpr::EntityRef(_) => HostType::Entity,
            HostExpr::Member(member) => member.ty,
            HostExpr::Index(index) => match index.array.ty() {
                HostType::Array(elem) => HostType::Scalar(elem),
                other => other,
            },
            HostExpr::MethodCall(call) => call.ty,
            HostExpr::Constant(constant) => constant.ty,
            HostExpr::Variable(variable) => variable.ty,
            HostExpr::NewArray(array) => HostType::Array(array.element_type),
            HostExpr::Binary(binary) => {
                if binary.operator.is_arithmetic() {
                    binary.left.ty()
                } else {
                    HostType::BOOLEAN
                }
            }
            HostExpr::Not(_) => HostType::BOOLEAN,
        }
    }

    pub fn entity(name: &str, entity: &str) -> Self {
        HostExpr::EntityRef(EntityRef {
            name: name.to_string(),
            entity: entity.to_string(),
        })
    }

    pub fn member(self, member: &str, ty: HostType) -> Self {
        HostExpr::Member(MemberAccess {
            target: Box::new(self),
            member: member.to_string(),
            ty,
        })
    }

    pub fn index(self, index: HostExpr) -> Self {
        HostExpr::Index(IndexAccess {
            array: Box::new(self),
            index: Box::new(index),
        })
    }

    /// `source.Length`
    pub fn length(self) -> Self {
        self.member("Length", HostType::INTEGER)
    }

    /// `source.SequenceEqual(other)`, written as the extension-method call.
    pub fn sequence_equal(self, other: HostExpr) -> Self {
        HostExpr::MethodCall(MethodCall {
            method: "SequenceEqual".to_string(),
            receiver: None,
            args: vec![self, other],
            ty: HostType::BOOLEAN,
        })
    }

    pub fn constant(value: Value, ty: HostType) -> Self {
        HostExpr::Constant(Constant { value, ty })
    }

    pub fn int(i: i64) -> Self {
        HostExpr::constant(Value::Integer(i), HostType::INTEGER)
    }

    pub fn text(s: &str) -> Self {
        HostExpr::constant(Value::Text(s.to_string()), HostType::TEXT)
    }

    pub fn variable(name: &str, value: Value, ty: HostType) -> Self {
        HostExpr::Variable(CapturedVariable {
            name: name.to_string(),
            value,
            ty,
        })
    }

    pub fn new_array(element_type: ScalarType, elements: Vec<HostExpr>) -> Self {
        HostExpr::NewArray(NewArray {
            element_type,
            elements,
        })
    }

    pub fn binary(operator: BinaryOperator, left: HostExpr, right: HostExpr) -> Self {
        HostExpr::Binary(BinaryExpr {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn equal(self, other: HostExpr) -> Self {
        HostExpr::binary(BinaryOperator::Equal, self, other)
    }

    pub fn and(self, other: HostExpr) -> Self {
        HostExpr::binary(BinaryOperator::AndAlso, self, other)
    }
}

impl fmt::Display for HostExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostExpr::EntityRef(entity) => f.write_str(&entity.name),
            HostExpr::Member(member) => write!(f, "{}.{}", member.target, member.member),
            HostExpr::Index(index) => write!(f, "{}[{}]", index.array, index.index),
            HostExpr::MethodCall(call) => {
                let args: Vec<String> = call.args.iter().map(|a| a.to_string()).collect();
                match &call.receiver {
                    Some(receiver) => write!(f, "{}.{}({})", receiver, call.method, args.join(", ")),
                    None => write!(f, "{}({})", call.method, args.join(", ")),
                }
            }
            HostExpr::Constant(constant) => write!(f, "{}", constant.value),
            HostExpr::Variable(variable) => f.write_str(&variable.name),
            HostExpr::NewArray(array) => {
                let items: Vec<String> = array.elements.iter().map(|e| e.to_string()).collect();
                write!(f, "new[] {{ {} }}", items.join(", "))
            }
            HostExpr::Binary(binary) => {
                write!(f, "({} {} {})", binary.left, binary.operator, binary.right)
            }
            HostExpr::Not(inner) => write!(f, "!({})", inner),
        }
    }
}

/// Terminal operator applied to a query.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryOperator {
    #[default]
    ToList,
    /// Exactly one row; more or fewer is an error.
    Single,
    First,
    Count,
}

/// A host query over one entity set:
/// `entities.Where(e => predicate).Select(e => projection).Operator()`.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct EntityQuery {
    pub entity: String,
    /// Name of the lambda parameter; also the SQL table alias.
    #[serde(default = "default_parameter_name")]
    pub parameter: String,
    #[serde(default)]
    pub predicate: Option<HostExpr>,
    #[serde(default)]
    pub projection: Option<HostExpr>,
    #[serde(default)]
    pub operator: QueryOperator,
}

fn default_parameter_name() -> String {
    "e".to_string()
}

impl EntityQuery {
    pub fn new(entity: &str) -> Self {
        Self {
            entity: entity.to_string(),
            parameter: default_parameter_name(),
            predicate: None,
            projection: None,
            operator: QueryOperator::ToList,
        }
    }

    /// The lambda parameter expression, for building predicates.
    pub fn param(&self) -> HostExpr {
        HostExpr::entity(&self.parameter, &self.entity)
    }

    pub fn filter(mut self, predicate: HostExpr) -> Self {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    pub fn select(mut self, projection: HostExpr) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn with_operator(mut self, operator: QueryOperator) -> Self {
        self.operator = operator;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_type_is_element_type() {
        let e = HostExpr::entity("e", "SomeEntity");
        let subscript = e.member("SomeBytea", HostType::BYTE_ARRAY).index(HostExpr::int(0));
        assert_eq!(subscript.ty(), HostType::BYTE);
    }

    #[test]
    fn test_display_reads_like_host_code() {
        let e = HostExpr::entity("e", "SomeEntity");
        let predicate = e
            .member("SomeArray", HostType::INTEGER_ARRAY)
            .index(HostExpr::int(0))
            .equal(HostExpr::int(3));
        assert_eq!(predicate.to_string(), "(e.SomeArray[0] == 3)");
    }

    #[test]
    fn test_filter_combines_with_and() {
        let query = EntityQuery::new("SomeEntity");
        let e = query.param();
        let query = query
            .filter(e.clone().member("Id", HostType::INTEGER).equal(HostExpr::int(1)))
            .filter(e.member("SomeText", HostType::TEXT).equal(HostExpr::text("x")));
        assert!(matches!(
            query.predicate,
            Some(HostExpr::Binary(BinaryExpr {
                operator: BinaryOperator::AndAlso,
                ..
            }))
        ));
    }

    #[test]
    fn test_query_deserializes_from_json() {
        let json = r#"{
            "entity": "SomeEntity",
            "predicate": {
                "binary": {
                    "operator": "equal",
                    "left": {
                        "member": {
                            "target": { "entity_ref": { "name": "e", "entity": "SomeEntity" } },
                            "member": "Id",
                            "ty": "integer"
                        }
                    },
                    "right": { "constant": { "value": 1, "ty": "integer" } }
                }
            },
            "operator": "single"
        }"#;
        let query: EntityQuery = serde_json::from_str(json).unwrap();
        assert_eq!(query.parameter, "e");
        assert_eq!(query.operator, QueryOperator::Single);
        assert_eq!(query.predicate.unwrap().ty(), HostType::BOOLEAN);
    }
}
