//! Expression Visitor Pattern
//!
//! A read-only traversal over [`HostExpr`] trees. Visitors override the
//! `visit_*` hooks they care about; [`walk_expression`] handles descent in
//! source order (left operand before right, receiver before arguments), which
//! is the order parameters are bound in.
//!
//! # Example
//!
//! ```ignore
//! let mut collector = CapturedVariableCollector::default();
//! walk_expression(&predicate, &mut collector);
//! // collector.names() == ["x", "arr"]
//! ```

use super::{CapturedVariable, EntityRef, HostExpr, MemberAccess, MethodCall};

pub trait ExpressionVisitor {
    fn visit_entity_ref(&mut self, _entity: &EntityRef) {}

    fn visit_member(&mut self, _member: &MemberAccess) {}

    fn visit_method_call(&mut self, _call: &MethodCall) {}

    fn visit_variable(&mut self, _variable: &CapturedVariable) {}

    /// Called for constants and array constructions.
    fn visit_leaf(&mut self, _expr: &HostExpr) {}
}

pub fn walk_expression<V: ExpressionVisitor>(expr: &HostExpr, visitor: &mut V) {
    match expr {
        HostExpr::EntityRef(entity) => visitor.visit_entity_ref(entity),
        HostExpr::Member(member) => {
            visitor.visit_member(member);
            walk_expression(&member.target, visitor);
        }
        HostExpr::Index(index) => {
            walk_expression(&index.array, visitor);
            walk_expression(&index.index, visitor);
        }
        HostExpr::MethodCall(call) => {
            visitor.visit_method_call(call);
            for operand in call.operands() {
                walk_expression(operand, visitor);
            }
        }
        HostExpr::Variable(variable) => visitor.visit_variable(variable),
        HostExpr::Constant(_) => visitor.visit_leaf(expr),
        HostExpr::NewArray(array) => {
            visitor.visit_leaf(expr);
            for element in &array.elements {
                walk_expression(element, visitor);
            }
        }
        HostExpr::Binary(binary) => {
            walk_expression(&binary.left, visitor);
            walk_expression(&binary.right, visitor);
        }
        HostExpr::Not(inner) => walk_expression(inner, visitor),
    }
}

/// Collects distinct captured variables in first-reference order.
#[derive(Debug, Default)]
pub struct CapturedVariableCollector {
    variables: Vec<CapturedVariable>,
}

impl CapturedVariableCollector {
    pub fn names(&self) -> Vec<&str> {
        self.variables.iter().map(|v| v.name.as_str()).collect()
    }
}

impl ExpressionVisitor for CapturedVariableCollector {
    fn visit_variable(&mut self, variable: &CapturedVariable) {
        if !self.variables.iter().any(|v| v.name == variable.name) {
            self.variables.push(variable.clone());
        }
    }
}

/// Collects the names of lambda parameters referenced by an expression.
#[derive(Debug, Default)]
pub struct EntityRefCollector {
    pub names: Vec<String>,
}

impl ExpressionVisitor for EntityRefCollector {
    fn visit_entity_ref(&mut self, entity: &EntityRef) {
        if !self.names.contains(&entity.name) {
            self.names.push(entity.name.clone());
        }
    }
}

/// Whether the expression reads from the row at all.
pub fn references_entity(expr: &HostExpr) -> bool {
    let mut collector = EntityRefCollector::default();
    walk_expression(expr, &mut collector);
    !collector.names.is_empty()
}
