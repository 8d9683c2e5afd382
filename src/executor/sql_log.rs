//! Record of executed SQL.
//!
//! A session holds an `Arc<SqlLog>` and appends every command before it is
//! executed; tests read it back to assert on the SQL that was sent.
//! Parameter values are only kept when sensitive data logging is enabled.

use serde::Serialize;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use crate::query_model::HostType;
use crate::sql_generator::SqlCommand;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggedParameter {
    pub name: String,
    pub ty: HostType,
    /// `None` unless sensitive data logging is on.
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggedCommand {
    pub sql: String,
    pub parameters: Vec<LoggedParameter>,
}

impl fmt::Display for LoggedCommand {
    /// Parameter declarations as SQL comments, then the statement:
    ///
    /// ```text
    /// -- @__x_0='0' (integer)
    /// SELECT ...
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for param in &self.parameters {
            match &param.value {
                Some(value) => writeln!(f, "-- {}='{}' ({})", param.name, value, param.ty)?,
                None => writeln!(f, "-- {}=? ({})", param.name, param.ty)?,
            }
        }
        f.write_str(&self.sql)
    }
}

#[derive(Debug, Default)]
pub struct SqlLog {
    entries: Mutex<Vec<LoggedCommand>>,
}

impl SqlLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LoggedCommand>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn record(&self, command: &SqlCommand, sensitive_data_logging: bool) {
        let parameters = command
            .parameters
            .iter()
            .map(|p| LoggedParameter {
                name: p.name.clone(),
                ty: p.ty,
                value: sensitive_data_logging.then(|| p.value.to_string()),
            })
            .collect();
        self.lock().push(LoggedCommand {
            sql: command.sql.clone(),
            parameters,
        });
    }

    pub fn entries(&self) -> Vec<LoggedCommand> {
        self.lock().clone()
    }

    /// SQL text of every logged command, oldest first.
    pub fn statements(&self) -> Vec<String> {
        self.lock().iter().map(|entry| entry.sql.clone()).collect()
    }

    /// All logged commands with their parameter comments, separated by blank lines.
    pub fn sql(&self) -> String {
        self.lock()
            .iter()
            .map(|entry| entry.to_string())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn last(&self) -> Option<LoggedCommand> {
        self.lock().last().cloned()
    }

    pub fn contains(&self, fragment: &str) -> bool {
        self.lock().iter().any(|entry| entry.sql.contains(fragment))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}
