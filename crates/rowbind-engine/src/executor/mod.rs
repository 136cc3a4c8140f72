//! Statement execution
//!
//! The engine never talks to a database itself. A [`StatementExecutor`]
//! receives committed statements plus their parameter values and returns
//! affected-row counts or rows. [`Session`] layers the single-row, keyed-map,
//! cursor, and callback conveniences on top, and [`MemoryExecutor`] is a
//! scripted executor for tests and dry runs.

mod memory;
mod row_mapper;
mod session;

pub use memory::{ExecutedCall, MemoryExecutor};
pub use row_mapper::RowMapper;
pub use session::Session;

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use crate::mapping::{MappedStatement, RegistryError};
use crate::reflect::ReflectionError;
use crate::value::Value;

/// Errors reported while executing a statement
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The executor rejected or failed the statement
    #[error("Error executing statement '{statement}': {reason}")]
    Failed {
        /// Qualified statement id
        statement: String,
        /// Failure description
        reason: String,
    },

    /// `select_one` found several rows
    #[error("Expected one result (or null) to be returned by selectOne(), but found: {0}")]
    TooManyResults(usize),

    /// Statement lookup failed
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Row mapping failed
    #[error(transparent)]
    Reflection(#[from] ReflectionError),
}

// ============================================================================
// Control arguments
// ============================================================================

/// Pagination bounds applied to a row sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowBounds {
    /// Rows to skip
    pub offset: usize,
    /// Maximum rows to return
    pub limit: usize,
}

impl RowBounds {
    /// Bounds skipping `offset` rows and returning at most `limit`
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// Check whether these bounds select every row
    pub fn is_unbounded(&self) -> bool {
        self.offset == 0 && self.limit == usize::MAX
    }

    /// Apply the bounds to rows
    pub fn apply(&self, rows: Vec<Value>) -> Vec<Value> {
        if self.is_unbounded() {
            return rows;
        }
        rows.into_iter().skip(self.offset).take(self.limit).collect()
    }
}

impl Default for RowBounds {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: usize::MAX,
        }
    }
}

/// Lazily consumed row sequence shared between clones
#[derive(Clone)]
pub struct Cursor {
    rows: Arc<Mutex<Box<dyn Iterator<Item = Value> + Send>>>,
}

impl Cursor {
    /// Cursor over the given rows
    pub fn new(rows: impl Iterator<Item = Value> + Send + 'static) -> Self {
        Self {
            rows: Arc::new(Mutex::new(Box::new(rows))),
        }
    }
}

impl Iterator for Cursor {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        self.rows.lock().next()
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Cursor")
    }
}

impl PartialEq for Cursor {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.rows, &other.rows)
    }
}

/// State handed to a [`ResultHandler`] for each row
#[derive(Debug, Default)]
pub struct ResultContext {
    result_object: Value,
    result_count: usize,
    stopped: bool,
}

impl ResultContext {
    /// Fresh context before the first row
    pub fn new() -> Self {
        Self::default()
    }

    fn next_row(&mut self, row: Value) {
        self.result_object = row;
        self.result_count += 1;
    }

    /// The current row
    pub fn result_object(&self) -> &Value {
        &self.result_object
    }

    /// Rows delivered so far, the current one included
    pub fn result_count(&self) -> usize {
        self.result_count
    }

    /// Stop delivering rows
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Check whether the handler asked to stop
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

/// Streaming row callback
pub trait ResultHandler: Send {
    /// Called once per row
    fn handle_result(&mut self, context: &mut ResultContext);
}

impl<F> ResultHandler for F
where
    F: FnMut(&mut ResultContext) + Send,
{
    fn handle_result(&mut self, context: &mut ResultContext) {
        self(context)
    }
}

/// Shareable handle to a [`ResultHandler`], passed as a mapper argument
#[derive(Clone)]
pub struct ResultHandlerRef(Arc<Mutex<dyn ResultHandler>>);

impl ResultHandlerRef {
    /// Wrap a handler
    pub fn new(handler: impl ResultHandler + 'static) -> Self {
        Self(Arc::new(Mutex::new(handler)))
    }

    /// Deliver rows one at a time until exhausted or stopped
    pub fn deliver(&self, rows: impl IntoIterator<Item = Value>) {
        let mut handler = self.0.lock();
        let mut context = ResultContext::new();
        for row in rows {
            context.next_row(row);
            handler.handle_result(&mut context);
            if context.is_stopped() {
                break;
            }
        }
    }
}

impl fmt::Debug for ResultHandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResultHandlerRef")
    }
}

impl PartialEq for ResultHandlerRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Outcome of flushing one batched statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    /// Qualified statement id
    pub statement_id: String,
    /// Affected rows per batched execution
    pub update_counts: Vec<i64>,
}

// ============================================================================
// Executor interface
// ============================================================================

/// Executes committed statements
///
/// Implementations are shared across threads; per-call state belongs in the
/// arguments.
pub trait StatementExecutor: Send + Sync {
    /// Run an insert, update, or delete and report affected rows
    fn update(&self, statement: &MappedStatement, parameter: &Value) -> Result<i64, ExecutionError>;

    /// Run a select and return its mapped rows
    fn query(
        &self,
        statement: &MappedStatement,
        parameter: &Value,
        bounds: RowBounds,
    ) -> Result<Vec<Value>, ExecutionError>;

    /// Run a select and return its rows lazily
    fn query_cursor(
        &self,
        statement: &MappedStatement,
        parameter: &Value,
        bounds: RowBounds,
    ) -> Result<Cursor, ExecutionError> {
        let rows = self.query(statement, parameter, bounds)?;
        Ok(Cursor::new(rows.into_iter()))
    }

    /// Run a select and stream its rows to a handler
    fn query_with_handler(
        &self,
        statement: &MappedStatement,
        parameter: &Value,
        bounds: RowBounds,
        handler: &ResultHandlerRef,
    ) -> Result<(), ExecutionError> {
        let rows = self.query(statement, parameter, bounds)?;
        handler.deliver(rows);
        Ok(())
    }

    /// Flush batched statements
    fn flush_statements(&self) -> Result<Vec<BatchResult>, ExecutionError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_bounds() {
        let rows: Vec<Value> = (0..5).map(Value::Int).collect();
        assert_eq!(RowBounds::default().apply(rows.clone()).len(), 5);
        assert_eq!(
            RowBounds::new(1, 2).apply(rows),
            vec![Value::Int(1), Value::Int(2)]
        );
    }

    #[test]
    fn test_handler_stops() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handler = ResultHandlerRef::new(move |context: &mut ResultContext| {
            sink.lock().push(context.result_object().clone());
            if context.result_count() == 2 {
                context.stop();
            }
        });
        handler.deliver((0..5).map(Value::Int));
        assert_eq!(*seen.lock(), vec![Value::Int(0), Value::Int(1)]);
    }

    #[test]
    fn test_cursor_clones_share_position() {
        let mut cursor = Cursor::new(vec![Value::Int(1), Value::Int(2)].into_iter());
        let mut other = cursor.clone();
        assert_eq!(cursor.next(), Some(Value::Int(1)));
        assert_eq!(other.next(), Some(Value::Int(2)));
        assert_eq!(cursor, other);
        assert_eq!(cursor.next(), None);
    }
}
