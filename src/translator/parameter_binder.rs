//! Binds captured host values to SQL parameters.
//!
//! Parameters are named `@__<source>_<slot>`; the slot is the position in the
//! statement's parameter list. A source bound twice reuses its slot, so the
//! list is ordered by first reference.

use super::context::TranslationContext;
use super::errors::TranslationError;
use crate::query_model::{CapturedVariable, HostType, Value};
use crate::sql_generator::{ParameterRef, SqlExpr, SqlParameter};

/// Bind a captured variable, reusing its slot if it was bound before.
pub fn bind_variable(
    ctx: &mut TranslationContext<'_>,
    variable: &CapturedVariable,
) -> Result<SqlExpr, TranslationError> {
    bind(ctx, &variable.name, &variable.name, &variable.value, variable.ty)
}

/// Bind a value the translator evaluated from a closed sub-expression.
///
/// `key` identifies the source expression so repeated occurrences share a slot.
pub fn bind_evaluated(
    ctx: &mut TranslationContext<'_>,
    key: &str,
    value: &Value,
    ty: HostType,
) -> Result<SqlExpr, TranslationError> {
    bind(ctx, key, "p", value, ty)
}

fn bind(
    ctx: &mut TranslationContext<'_>,
    key: &str,
    display_name: &str,
    value: &Value,
    ty: HostType,
) -> Result<SqlExpr, TranslationError> {
    if let Some(slot) = ctx.slot_for(key) {
        let name = ctx.parameters()[slot].name.clone();
        return Ok(SqlExpr::Parameter(ParameterRef { name, slot }));
    }

    if !value.conforms_to(&ty) {
        return Err(TranslationError::Binding {
            variable: display_name.to_string(),
            ty,
            value: value.to_string(),
        });
    }

    let slot = ctx.parameters().len();
    if slot >= ctx.max_parameters() {
        return Err(TranslationError::TooManyParameters {
            limit: ctx.max_parameters(),
        });
    }

    let name = format!("@__{}_{}", display_name, slot);
    log::debug!("Binding `{}` as {} ({})", key, name, ty);
    ctx.push_parameter(
        key,
        SqlParameter {
            name: name.clone(),
            value: value.clone(),
            ty,
        },
    );
    Ok(SqlExpr::Parameter(ParameterRef { name, slot }))
}
