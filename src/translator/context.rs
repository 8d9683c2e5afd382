//! Per-query translation state.
//!
//! A [`TranslationContext`] lives for exactly one query compilation. It owns
//! the ordered parameter list; nothing else may append to it.

use std::collections::HashMap;

use crate::model_catalog::EntityDescriptor;
use crate::sql_generator::SqlParameter;

#[derive(Debug)]
pub struct TranslationContext<'a> {
    entity: &'a EntityDescriptor,
    /// Lambda parameter name, used as the SQL table alias.
    table_alias: String,
    parameters: Vec<SqlParameter>,
    /// Source key (variable name or evaluated expression) → slot.
    slots: HashMap<String, usize>,
    max_parameters: usize,
}

/// Parameter-list length at some point of translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

impl<'a> TranslationContext<'a> {
    pub fn new(entity: &'a EntityDescriptor, table_alias: &str, max_parameters: usize) -> Self {
        Self {
            entity,
            table_alias: table_alias.to_string(),
            parameters: Vec::new(),
            slots: HashMap::new(),
            max_parameters,
        }
    }

    pub fn entity(&self) -> &'a EntityDescriptor {
        self.entity
    }

    pub fn table_alias(&self) -> &str {
        &self.table_alias
    }

    pub fn parameters(&self) -> &[SqlParameter] {
        &self.parameters
    }

    pub fn into_parameters(self) -> Vec<SqlParameter> {
        self.parameters
    }

    pub(crate) fn max_parameters(&self) -> usize {
        self.max_parameters
    }

    pub(crate) fn slot_for(&self, key: &str) -> Option<usize> {
        self.slots.get(key).copied()
    }

    /// Append a parameter and return its slot.
    pub(crate) fn push_parameter(&mut self, key: &str, parameter: SqlParameter) -> usize {
        let slot = self.parameters.len();
        self.parameters.push(parameter);
        self.slots.insert(key.to_string(), slot);
        slot
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.parameters.len())
    }

    /// Drop parameters bound after `checkpoint`, e.g. by a sub-expression
    /// that turned out not to be translatable as a whole.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        if self.parameters.len() <= checkpoint.0 {
            return;
        }
        log::debug!(
            "Rolling back {} parameter(s) from an untranslatable expression",
            self.parameters.len() - checkpoint.0
        );
        self.parameters.truncate(checkpoint.0);
        self.slots.retain(|_, slot| *slot < checkpoint.0);
    }
}
