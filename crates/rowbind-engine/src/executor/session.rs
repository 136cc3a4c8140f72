//! Statement sessions

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::mapping::{Configuration, MappedStatement};
use crate::value::{MapKey, Value};

use super::{BatchResult, Cursor, ExecutionError, ResultHandlerRef, RowBounds, StatementExecutor};

/// Executes statements by id against a frozen configuration
#[derive(Clone)]
pub struct Session {
    config: Arc<Configuration>,
    executor: Arc<dyn StatementExecutor>,
}

impl Session {
    /// Create a session
    pub fn new(config: Arc<Configuration>, executor: Arc<dyn StatementExecutor>) -> Self {
        Self { config, executor }
    }

    /// The configuration statements are looked up in
    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.config
    }

    fn statement(&self, id: &str) -> Result<&Arc<MappedStatement>, ExecutionError> {
        Ok(self.config.get_statement(id)?)
    }

    /// Run an insert statement
    pub fn insert(&self, id: &str, parameter: &Value) -> Result<i64, ExecutionError> {
        self.update(id, parameter)
    }

    /// Run an update statement
    pub fn update(&self, id: &str, parameter: &Value) -> Result<i64, ExecutionError> {
        self.executor.update(self.statement(id)?, parameter)
    }

    /// Run a delete statement
    pub fn delete(&self, id: &str, parameter: &Value) -> Result<i64, ExecutionError> {
        self.update(id, parameter)
    }

    /// Select at most one row; no row yields null
    pub fn select_one(&self, id: &str, parameter: &Value) -> Result<Value, ExecutionError> {
        let mut rows = self.select_list(id, parameter, RowBounds::default())?;
        match rows.len() {
            0 => Ok(Value::Null),
            1 => Ok(rows.remove(0)),
            n => Err(ExecutionError::TooManyResults(n)),
        }
    }

    /// Select every row within the bounds
    pub fn select_list(
        &self,
        id: &str,
        parameter: &Value,
        bounds: RowBounds,
    ) -> Result<Vec<Value>, ExecutionError> {
        self.executor.query(self.statement(id)?, parameter, bounds)
    }

    /// Select rows keyed by the value of `map_key` on each row
    ///
    /// A later row with the same key replaces an earlier one. Rows whose key
    /// is null share the [`MapKey::Null`] entry.
    pub fn select_map(
        &self,
        id: &str,
        parameter: &Value,
        map_key: &str,
        bounds: RowBounds,
    ) -> Result<BTreeMap<MapKey, Value>, ExecutionError> {
        let rows = self.select_list(id, parameter, bounds)?;
        let meta = self.config.meta_object();
        let mut keyed = BTreeMap::new();
        for row in rows {
            let key = MapKey::from(&meta.get_value(&row, map_key)?);
            keyed.insert(key, row);
        }
        Ok(keyed)
    }

    /// Select rows lazily
    pub fn select_cursor(
        &self,
        id: &str,
        parameter: &Value,
        bounds: RowBounds,
    ) -> Result<Cursor, ExecutionError> {
        self.executor.query_cursor(self.statement(id)?, parameter, bounds)
    }

    /// Stream rows to a handler
    pub fn select_with_handler(
        &self,
        id: &str,
        parameter: &Value,
        bounds: RowBounds,
        handler: &ResultHandlerRef,
    ) -> Result<(), ExecutionError> {
        self.executor
            .query_with_handler(self.statement(id)?, parameter, bounds, handler)
    }

    /// Flush batched statements
    pub fn flush_statements(&self) -> Result<Vec<BatchResult>, ExecutionError> {
        self.executor.flush_statements()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
