//! Host expression → PostgreSQL translation.
//!
//! Each node is first offered to the [`matcher`]; array shapes it recognizes
//! are lowered by the [`fragment_builder`]. Everything else (columns,
//! comparisons, logic, arithmetic) is translated structurally here.
//!
//! A node that cannot be translated yields `Ok(None)` and any parameters its
//! subtree bound are rolled back. [`translate_query`] then decides, per
//! top-level `&&` conjunct, what runs in SQL and what is left for
//! [`client_eval`].

pub mod client_eval;
mod context;
pub mod errors;
mod fragment_builder;
mod index_adjuster;
pub mod matcher;
mod parameter_binder;

#[cfg(test)]
pub(crate) mod tests;

use serde::Serialize;

pub use context::{Checkpoint, TranslationContext};
pub use errors::TranslationError;

use crate::config::{ClientEvaluation, TranslatorConfig};
use crate::model_catalog::{EntityDescriptor, EntityModel};
use crate::query_model::visitors::{
    references_entity, walk_expression, CapturedVariableCollector, EntityRefCollector,
};
use crate::query_model::{
    BinaryExpr, BinaryOperator, EntityQuery, EntityRef, HostExpr, QueryOperator, ScalarType,
    Value,
};
use crate::sql_generator::{
    generate_sql, Projection, SelectItem, SelectStatement, SqlCommand, SqlExpr, SqlFragment,
    SqlLiteral, SqlOperator, TableRef,
};

use fragment_builder::{check_conforms, literal_for_value};
use parameter_binder::{bind_evaluated, bind_variable};

/// Column name a translated scalar projection is materialized under.
pub const PROJECTION_COLUMN: &str = "Value";

/// A query ready to run: the SQL command plus whatever has to happen on the
/// client after the rows come back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    pub command: SqlCommand,
    /// Conjuncts the server could not evaluate; applied to every fetched row.
    pub residual_predicate: Option<HostExpr>,
    /// Projection evaluated per row when it could not be translated.
    pub client_projection: Option<HostExpr>,
    pub operator: QueryOperator,
}

impl CompiledQuery {
    pub fn requires_client_evaluation(&self) -> bool {
        self.residual_predicate.is_some() || self.client_projection.is_some()
    }
}

/// Translate one expression. `Ok(None)` means "not translatable"; the
/// context is left as it was before the call in that case.
pub fn translate_expr(
    expr: &HostExpr,
    ctx: &mut TranslationContext<'_>,
) -> Result<Option<SqlExpr>, TranslationError> {
    let checkpoint = ctx.checkpoint();
    let translated = translate_node(expr, ctx)?;
    if translated.is_none() {
        log::debug!("`{}` is not translatable", expr);
        ctx.rollback(checkpoint);
    }
    Ok(translated)
}

fn translate_node(
    expr: &HostExpr,
    ctx: &mut TranslationContext<'_>,
) -> Result<Option<SqlExpr>, TranslationError> {
    if let Some(rule) = matcher::match_expr(expr, ctx.entity(), ctx.table_alias()) {
        log::debug!("`{}` matched {:?}", expr, rule);
        return fragment_builder::build(rule, ctx);
    }

    match expr {
        HostExpr::EntityRef(entity) => {
            check_entity_ref(entity, ctx)?;
            Ok(None)
        }
        HostExpr::Member(member) => {
            let HostExpr::EntityRef(target) = member.target.as_ref() else {
                return evaluate_closed(expr, ctx);
            };
            check_entity_ref(target, ctx)?;
            let property = ctx.entity().require_property(&member.member)?;
            if property.ty != member.ty {
                return Err(TranslationError::TypeMismatch {
                    expression: expr.to_string(),
                    expected: property.ty,
                    actual: member.ty,
                });
            }
            Ok(Some(SqlExpr::column(ctx.table_alias(), &property.column)))
        }
        HostExpr::Constant(constant) => {
            check_conforms(expr, &constant.value, constant.ty)?;
            match literal_for_value(&constant.value, constant.ty) {
                Some(literal) => Ok(Some(literal)),
                None => {
                    let key = format!("const:{}:{}", constant.ty, constant.value);
                    bind_evaluated(ctx, &key, &constant.value, constant.ty).map(Some)
                }
            }
        }
        HostExpr::Variable(variable) => bind_variable(ctx, variable).map(Some),
        HostExpr::NewArray(array) => {
            let all_constant = array
                .elements
                .iter()
                .all(|element| matches!(element, HostExpr::Constant(_)));
            if all_constant {
                let values = array
                    .elements
                    .iter()
                    .filter_map(|element| match element {
                        HostExpr::Constant(constant) => Some(constant.value.clone()),
                        _ => None,
                    })
                    .collect();
                let value = Value::Array(values);
                let ty = expr.ty();
                check_conforms(expr, &value, ty)?;
                if let Some(literal) = literal_for_value(&value, ty) {
                    return Ok(Some(literal));
                }
            }
            if !references_entity(expr) {
                return evaluate_closed(expr, ctx);
            }
            if array.element_type == ScalarType::Byte || array.elements.is_empty() {
                return Ok(None);
            }
            let mut items = Vec::with_capacity(array.elements.len());
            for element in &array.elements {
                match translate_expr(element, ctx)? {
                    Some(item) => items.push(item),
                    None => return Ok(None),
                }
            }
            Ok(Some(SqlExpr::ArrayLiteral(items)))
        }
        HostExpr::Binary(binary) => translate_binary(expr, binary, ctx),
        HostExpr::Not(inner) => {
            Ok(translate_expr(inner, ctx)?.map(|sql| SqlExpr::Not(Box::new(sql))))
        }
        HostExpr::Index(_) | HostExpr::MethodCall(_) => evaluate_closed(expr, ctx),
    }
}

fn check_entity_ref(
    entity: &EntityRef,
    ctx: &TranslationContext<'_>,
) -> Result<(), TranslationError> {
    if entity.name != ctx.table_alias() {
        return Err(TranslationError::UnboundEntityReference {
            name: entity.name.clone(),
            expected: ctx.table_alias().to_string(),
        });
    }
    Ok(())
}

/// Every entity reference anywhere in `expr` must name the lambda parameter,
/// including those under subtrees left to the client.
fn check_entity_refs(expr: &HostExpr, parameter: &str) -> Result<(), TranslationError> {
    let mut collector = EntityRefCollector::default();
    walk_expression(expr, &mut collector);
    match collector.names.into_iter().find(|name| name != parameter) {
        Some(name) => Err(TranslationError::UnboundEntityReference {
            name,
            expected: parameter.to_string(),
        }),
        None => Ok(()),
    }
}

/// Evaluate an expression that does not read the row once, now, and bind
/// the result. Row-dependent expressions are not translatable.
fn evaluate_closed(
    expr: &HostExpr,
    ctx: &mut TranslationContext<'_>,
) -> Result<Option<SqlExpr>, TranslationError> {
    if references_entity(expr) {
        return Ok(None);
    }
    let value = client_eval::evaluate(expr, None).map_err(|source| {
        TranslationError::Evaluation {
            expression: expr.to_string(),
            source,
        }
    })?;
    bind_evaluated(ctx, &format!("expr:{}", expr), &value, expr.ty()).map(Some)
}

fn translate_binary(
    expr: &HostExpr,
    binary: &BinaryExpr,
    ctx: &mut TranslationContext<'_>,
) -> Result<Option<SqlExpr>, TranslationError> {
    let operator = sql_operator(binary.operator);

    if matches!(binary.operator, BinaryOperator::Equal | BinaryOperator::NotEqual) {
        let operand = match (is_null(&binary.left), is_null(&binary.right)) {
            (true, true) => {
                let equal = binary.operator == BinaryOperator::Equal;
                return Ok(Some(SqlExpr::Literal(SqlLiteral::Boolean(equal))));
            }
            (true, false) => Some(&binary.right),
            (false, true) => Some(&binary.left),
            (false, false) => None,
        };
        if let Some(operand) = operand {
            let Some(sql) = translate_expr(operand, ctx)? else {
                return Ok(None);
            };
            let is_null = SqlExpr::IsNull(Box::new(sql));
            return Ok(Some(match binary.operator {
                BinaryOperator::Equal => is_null,
                _ => SqlExpr::Not(Box::new(is_null)),
            }));
        }
    }

    if binary.operator.is_comparison() {
        let (left, right) = (binary.left.ty(), binary.right.ty());
        if !left.is_comparable_with(&right) {
            return Err(TranslationError::TypeMismatch {
                expression: expr.to_string(),
                expected: left,
                actual: right,
            });
        }
    }

    let Some(left) = translate_expr(&binary.left, ctx)? else {
        return Ok(None);
    };
    let Some(right) = translate_expr(&binary.right, ctx)? else {
        return Ok(None);
    };
    Ok(Some(SqlExpr::binary(operator, left, right)))
}

/// A literal or captured NULL; compared with `IS NULL` rather than `=`.
fn is_null(expr: &HostExpr) -> bool {
    match expr {
        HostExpr::Constant(constant) => constant.value.is_null(),
        HostExpr::Variable(variable) => variable.value.is_null(),
        _ => false,
    }
}

fn sql_operator(operator: BinaryOperator) -> SqlOperator {
    match operator {
        BinaryOperator::Equal => SqlOperator::Equal,
        BinaryOperator::NotEqual => SqlOperator::NotEqual,
        BinaryOperator::LessThan => SqlOperator::LessThan,
        BinaryOperator::LessThanOrEqual => SqlOperator::LessThanOrEqual,
        BinaryOperator::GreaterThan => SqlOperator::GreaterThan,
        BinaryOperator::GreaterThanOrEqual => SqlOperator::GreaterThanOrEqual,
        BinaryOperator::Add => SqlOperator::Add,
        BinaryOperator::Subtract => SqlOperator::Subtract,
        BinaryOperator::Multiply => SqlOperator::Multiply,
        BinaryOperator::AndAlso => SqlOperator::And,
        BinaryOperator::OrElse => SqlOperator::Or,
    }
}

/// Translate a whole predicate into a standalone fragment, or `None` if any
/// part of it needs client evaluation.
pub fn translate_predicate(
    predicate: &HostExpr,
    entity: &EntityDescriptor,
    parameter: &str,
    config: &TranslatorConfig,
) -> Result<Option<SqlFragment>, TranslationError> {
    check_entity_refs(predicate, parameter)?;
    let mut ctx = TranslationContext::new(entity, parameter, config.max_parameters);
    Ok(translate_expr(predicate, &mut ctx)?.map(|expr| SqlFragment {
        expr,
        parameters: ctx.into_parameters(),
    }))
}

/// Split `a && b && c` into its conjuncts, left to right.
fn conjuncts(expr: &HostExpr) -> Vec<&HostExpr> {
    match expr {
        HostExpr::Binary(binary) if binary.operator == BinaryOperator::AndAlso => {
            let mut parts = conjuncts(&binary.left);
            parts.extend(conjuncts(&binary.right));
            parts
        }
        _ => vec![expr],
    }
}

/// Translate what can be translated of a predicate. Returns the SQL part and
/// the residual host part.
fn split_predicate(
    predicate: &HostExpr,
    ctx: &mut TranslationContext<'_>,
) -> Result<(Option<SqlExpr>, Option<HostExpr>), TranslationError> {
    let mut server: Option<SqlExpr> = None;
    let mut client: Option<HostExpr> = None;

    for conjunct in conjuncts(predicate) {
        match translate_expr(conjunct, ctx)? {
            Some(sql) => {
                server = Some(match server {
                    Some(existing) => SqlExpr::binary(SqlOperator::And, existing, sql),
                    None => sql,
                });
            }
            None => {
                client = Some(match client {
                    Some(existing) => existing.and(conjunct.clone()),
                    None => conjunct.clone(),
                });
            }
        }
    }
    Ok((server, client))
}

fn check_client_evaluation(
    config: &TranslatorConfig,
    expr: &HostExpr,
    context: &str,
) -> Result<(), TranslationError> {
    match config.client_evaluation {
        ClientEvaluation::Throw => Err(TranslationError::ClientEvaluationDisallowed {
            expression: expr.to_string(),
            context: context.to_string(),
        }),
        ClientEvaluation::Warn => {
            log::warn!(
                "The {} `{}` could not be translated and will be evaluated on the client",
                context,
                expr
            );
            Ok(())
        }
        ClientEvaluation::Allow => {
            log::debug!("Evaluating {} `{}` on the client", context, expr);
            Ok(())
        }
    }
}

fn entity_columns(entity: &EntityDescriptor, alias: &str) -> Vec<SelectItem> {
    entity
        .properties
        .iter()
        .map(|property| SelectItem {
            expr: SqlExpr::column(alias, &property.column),
            name: property.name.clone(),
        })
        .collect()
}

/// Compile a query against the model.
pub fn translate_query(
    query: &EntityQuery,
    model: &EntityModel,
    config: &TranslatorConfig,
) -> Result<CompiledQuery, TranslationError> {
    let entity = model.entity(&query.entity)?;
    let alias = query.parameter.as_str();
    let mut ctx = TranslationContext::new(entity, alias, config.max_parameters);

    for expr in query.predicate.iter().chain(query.projection.iter()) {
        check_entity_refs(expr, alias)?;
    }

    if let Some(predicate) = &query.predicate {
        let mut captured = CapturedVariableCollector::default();
        walk_expression(predicate, &mut captured);
        log::debug!("Predicate captures {:?}", captured.names());
    }

    let (predicate, residual_predicate) = match &query.predicate {
        Some(predicate) => split_predicate(predicate, &mut ctx)?,
        None => (None, None),
    };
    if let Some(residual) = &residual_predicate {
        check_client_evaluation(config, residual, "predicate")?;
    }

    let mut client_projection = None;
    let projection = match (query.operator, &query.projection) {
        (QueryOperator::Count, _) if residual_predicate.is_none() => Projection::CountStar,
        (QueryOperator::Count, _) | (_, None) => Projection::Items(entity_columns(entity, alias)),
        (_, Some(HostExpr::EntityRef(target))) => {
            check_entity_ref(target, &ctx)?;
            Projection::Items(entity_columns(entity, alias))
        }
        (_, Some(projection)) if residual_predicate.is_some() => {
            // Filtering happens on the client, so the projection must too.
            client_projection = Some(projection.clone());
            Projection::Items(entity_columns(entity, alias))
        }
        (_, Some(projection)) => match translate_expr(projection, &mut ctx)? {
            Some(expr) => Projection::Items(vec![SelectItem {
                expr,
                name: PROJECTION_COLUMN.to_string(),
            }]),
            None => {
                check_client_evaluation(config, projection, "projection")?;
                client_projection = Some(projection.clone());
                Projection::Items(entity_columns(entity, alias))
            }
        },
    };

    // Row limits only hold when every filter ran on the server.
    let limit = match query.operator {
        QueryOperator::Single if residual_predicate.is_none() => Some(2),
        QueryOperator::First if residual_predicate.is_none() => Some(1),
        _ => None,
    };

    let statement = SelectStatement {
        projection,
        from: TableRef {
            schema: config.default_schema.clone(),
            name: entity.table.clone(),
            alias: alias.to_string(),
        },
        predicate,
        limit,
    };
    let sql = generate_sql(&statement)?;
    log::debug!("Compiled {:?} over `{}`:\n{}", query.operator, entity.name, sql);

    Ok(CompiledQuery {
        command: SqlCommand {
            sql,
            statement,
            parameters: ctx.into_parameters(),
        },
        residual_predicate,
        client_projection,
        operator: query.operator,
    })
}
