/// Host array member → PostgreSQL function registry
///
/// Maps host members such as `Length` to PostgreSQL functions, keyed by how
/// the array is stored. Typed arrays use `array_length(x, 1)`; PostgreSQL
/// arrays may be multi-dimensional, so the dimension is always explicit.
use std::collections::HashMap;

use super::sql_expr::SqlExpr;
use crate::model_catalog::ArrayStore;

/// Function mapping entry
#[derive(Clone)]
pub struct FunctionMapping {
    /// Host member or method name
    pub host_name: &'static str,
    /// PostgreSQL function name
    pub pg_name: &'static str,
    /// Optional argument transformation
    pub arg_transform: Option<fn(Vec<SqlExpr>) -> Vec<SqlExpr>>,
}

impl FunctionMapping {
    /// Build the call for already-translated host arguments.
    pub fn apply(&self, args: Vec<SqlExpr>) -> SqlExpr {
        log::trace!("Mapping `{}` to {}()", self.host_name, self.pg_name);
        let args = match self.arg_transform {
            Some(transform) => transform(args),
            None => args,
        };
        SqlExpr::function(self.pg_name, args)
    }
}

/// Get the mapping for an array member on the given store.
pub fn get_function_mapping(host_name: &str, store: ArrayStore) -> Option<FunctionMapping> {
    FUNCTION_MAPPINGS
        .get(&store)
        .and_then(|by_name| by_name.get(host_name))
        .cloned()
}

pub fn is_function_supported(host_name: &str, store: ArrayStore) -> bool {
    FUNCTION_MAPPINGS
        .get(&store)
        .is_some_and(|by_name| by_name.contains_key(host_name))
}

fn first_dimension(mut args: Vec<SqlExpr>) -> Vec<SqlExpr> {
    args.push(SqlExpr::integer(1));
    args
}

// Static function mapping table
lazy_static::lazy_static! {
    static ref FUNCTION_MAPPINGS: HashMap<ArrayStore, HashMap<&'static str, FunctionMapping>> = {
        let mut typed = HashMap::new();
        let mut bytea = HashMap::new();

        // ===== TYPED ARRAYS =====

        // arr.Length -> array_length(arr, 1)
        typed.insert("Length", FunctionMapping {
            host_name: "Length",
            pg_name: "array_length",
            arg_transform: Some(first_dimension),
        });

        // arr.Count() -> array_length(arr, 1)
        typed.insert("Count", FunctionMapping {
            host_name: "Count",
            pg_name: "array_length",
            arg_transform: Some(first_dimension),
        });

        // ===== BYTE ARRAYS =====

        // bytes.Length -> length(bytes)
        bytea.insert("Length", FunctionMapping {
            host_name: "Length",
            pg_name: "length",
            arg_transform: None,
        });

        bytea.insert("Count", FunctionMapping {
            host_name: "Count",
            pg_name: "length",
            arg_transform: None,
        });

        let mut m = HashMap::new();
        m.insert(ArrayStore::PgArray, typed);
        m.insert(ArrayStore::Bytea, bytea);
        m
    };
}
