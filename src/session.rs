//! Query session.
//!
//! A [`DbSession`] compiles an [`EntityQuery`], logs the SQL, runs it through
//! the configured [`SqlExecutor`], and finishes on the client whatever the
//! translator could not push down.

use std::sync::Arc;
use thiserror::Error;

use crate::config::TranslatorConfig;
use crate::executor::{ExecutorError, Row, SqlExecutor, SqlLog};
use crate::model_catalog::EntityModel;
use crate::query_model::{EntityQuery, QueryOperator, Value};
use crate::translator::client_eval::{evaluate, evaluate_predicate, ClientEvalError};
use crate::translator::{translate_query, CompiledQuery, TranslationError, PROJECTION_COLUMN};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error("Client evaluation failed: {0}")]
    ClientEvaluation(#[from] ClientEvalError),

    #[error("Sequence contains no elements")]
    NoElements,

    #[error("Sequence contains more than one element")]
    MoreThanOneElement,

    #[error("Unexpected result shape: {0}")]
    UnexpectedResult(String),
}

#[derive(Clone)]
pub struct DbSession {
    model: Arc<EntityModel>,
    executor: Arc<dyn SqlExecutor>,
    log: Arc<SqlLog>,
    config: TranslatorConfig,
}

impl DbSession {
    pub fn new(
        model: Arc<EntityModel>,
        executor: Arc<dyn SqlExecutor>,
        config: TranslatorConfig,
    ) -> Self {
        Self {
            model,
            executor,
            log: Arc::new(SqlLog::new()),
            config,
        }
    }

    /// Share an existing log sink instead of the session's own.
    pub fn with_log(mut self, log: Arc<SqlLog>) -> Self {
        self.log = log;
        self
    }

    pub fn sql_log(&self) -> &Arc<SqlLog> {
        &self.log
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    pub fn compile(&self, query: &EntityQuery) -> Result<CompiledQuery, SessionError> {
        Ok(translate_query(query, &self.model, &self.config)?)
    }

    pub async fn to_list(&self, query: &EntityQuery) -> Result<Vec<Row>, SessionError> {
        let query = query.clone().with_operator(QueryOperator::ToList);
        self.fetch(&query).await
    }

    /// Exactly one row, or `NoElements`/`MoreThanOneElement`.
    pub async fn single(&self, query: &EntityQuery) -> Result<Row, SessionError> {
        let query = query.clone().with_operator(QueryOperator::Single);
        let mut rows = self.fetch(&query).await?;
        match rows.len() {
            0 => Err(SessionError::NoElements),
            1 => Ok(rows.remove(0)),
            _ => Err(SessionError::MoreThanOneElement),
        }
    }

    pub async fn first(&self, query: &EntityQuery) -> Result<Row, SessionError> {
        let query = query.clone().with_operator(QueryOperator::First);
        self.fetch(&query)
            .await?
            .into_iter()
            .next()
            .ok_or(SessionError::NoElements)
    }

    pub async fn count(&self, query: &EntityQuery) -> Result<i64, SessionError> {
        let query = query.clone().with_operator(QueryOperator::Count);
        let compiled = self.compile(&query)?;
        let rows = self.execute(&compiled).await?;

        if compiled.residual_predicate.is_some() {
            return Ok(self.filter(&compiled, rows)?.len() as i64);
        }
        rows.first()
            .and_then(|row| row.values().next())
            .and_then(Value::as_integer)
            .ok_or_else(|| SessionError::UnexpectedResult("COUNT returned no integer".to_string()))
    }

    async fn fetch(&self, query: &EntityQuery) -> Result<Vec<Row>, SessionError> {
        let compiled = self.compile(query)?;
        let rows = self.execute(&compiled).await?;
        let rows = self.filter(&compiled, rows)?;

        let mut rows = match &compiled.client_projection {
            Some(projection) => rows
                .iter()
                .map(|row| {
                    let value = evaluate(projection, Some(row))?;
                    Ok(Row::new().with(PROJECTION_COLUMN, value))
                })
                .collect::<Result<Vec<_>, SessionError>>()?,
            None => rows,
        };

        // LIMIT was dropped when filtering moved to the client.
        if compiled.residual_predicate.is_some() {
            match compiled.operator {
                QueryOperator::Single => rows.truncate(2),
                QueryOperator::First => rows.truncate(1),
                _ => {}
            }
        }
        Ok(rows)
    }

    async fn execute(&self, compiled: &CompiledQuery) -> Result<Vec<Row>, SessionError> {
        let command = &compiled.command;
        self.log.record(command, self.config.sensitive_data_logging);
        log::info!(
            "Executing SQL ({} parameter(s)):\n{}",
            command.parameters.len(),
            command.sql
        );
        Ok(self.executor.execute(command).await?)
    }

    fn filter(&self, compiled: &CompiledQuery, rows: Vec<Row>) -> Result<Vec<Row>, SessionError> {
        let Some(predicate) = &compiled.residual_predicate else {
            return Ok(rows);
        };
        let mut kept = Vec::with_capacity(rows.len());
        for row in rows {
            if evaluate_predicate(predicate, &row)? {
                kept.push(row);
            }
        }
        log::debug!("Client-side filter kept {} row(s)", kept.len());
        Ok(kept)
    }
}
