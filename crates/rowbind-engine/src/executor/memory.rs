//! Scripted in-memory executor

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::mapping::{CommandKind, Configuration, MappedStatement};
use crate::value::Value;

use super::{ExecutionError, RowBounds, RowMapper, StatementExecutor};

/// A call recorded by [`MemoryExecutor`]
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedCall {
    /// Qualified statement id
    pub statement_id: String,
    /// Command of the statement
    pub command: CommandKind,
    /// Parameter value handed to the executor
    pub parameter: Value,
}

/// Executor answering from scripted rows and update counts
///
/// Selects return the rows scripted for their statement id, mapped through
/// the statement's result map; unscripted selects return no rows. Updates
/// return the scripted count, or 1.
pub struct MemoryExecutor {
    config: Arc<Configuration>,
    rows: DashMap<String, Vec<Value>>,
    counts: DashMap<String, i64>,
    calls: Mutex<Vec<ExecutedCall>>,
}

impl MemoryExecutor {
    /// Create an executor over a configuration
    pub fn new(config: Arc<Configuration>) -> Self {
        Self {
            config,
            rows: DashMap::new(),
            counts: DashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Script the column rows a select returns
    pub fn script_rows(&self, statement_id: &str, rows: Vec<Value>) {
        self.rows.insert(statement_id.to_string(), rows);
    }

    /// Script the affected-row count an update returns
    pub fn script_count(&self, statement_id: &str, count: i64) {
        self.counts.insert(statement_id.to_string(), count);
    }

    /// Calls received so far, oldest first
    pub fn calls(&self) -> Vec<ExecutedCall> {
        self.calls.lock().clone()
    }

    fn record(&self, statement: &MappedStatement, parameter: &Value) {
        tracing::trace!(statement = %statement.id, command = ?statement.command, "executing");
        self.calls.lock().push(ExecutedCall {
            statement_id: statement.id.clone(),
            command: statement.command,
            parameter: parameter.clone(),
        });
    }
}

impl StatementExecutor for MemoryExecutor {
    fn update(&self, statement: &MappedStatement, parameter: &Value) -> Result<i64, ExecutionError> {
        if statement.command.is_select() {
            return Err(ExecutionError::Failed {
                statement: statement.id.clone(),
                reason: "select statements cannot be run as updates".to_string(),
            });
        }
        self.record(statement, parameter);
        Ok(self.counts.get(&statement.id).map(|count| *count).unwrap_or(1))
    }

    fn query(
        &self,
        statement: &MappedStatement,
        parameter: &Value,
        bounds: RowBounds,
    ) -> Result<Vec<Value>, ExecutionError> {
        self.record(statement, parameter);
        let rows = self
            .rows
            .get(&statement.id)
            .map(|rows| rows.clone())
            .unwrap_or_default();
        RowMapper::new(&self.config).map_rows(statement, bounds.apply(rows))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::builder::Linker;
    use crate::executor::Session;
    use crate::node::Node;
    use crate::value::MapKey;

    fn model() -> Arc<Configuration> {
        let mut linker = Linker::new(Configuration::default());
        linker
            .load_mapper(
                "mappers/Counter.xml",
                &Node::new("mapper")
                    .with_attr("namespace", "demo.Counter")
                    .with_child(
                        Node::new("select")
                            .with_attr("id", "all")
                            .with_attr("resultType", "map")
                            .with_text("SELECT * FROM counter"),
                    )
                    .with_child(
                        Node::new("update")
                            .with_attr("id", "bump")
                            .with_text("UPDATE counter SET n = n + 1"),
                    ),
            )
            .unwrap();
        linker.finish().unwrap().configuration
    }

    fn row(n: i32) -> Value {
        Value::Map(BTreeMap::from([("n".to_string(), Value::Int(n))]))
    }

    #[test]
    fn test_scripted_rows_and_counts() {
        let config = model();
        let executor = Arc::new(MemoryExecutor::new(config.clone()));
        executor.script_rows("demo.Counter.all", vec![row(1), row(2), row(3)]);
        executor.script_count("demo.Counter.bump", 4);
        let session = Session::new(config, executor.clone());

        let rows = session
            .select_list("demo.Counter.all", &Value::Null, RowBounds::new(1, 5))
            .unwrap();
        assert_eq!(rows, vec![row(2), row(3)]);
        assert_eq!(session.update("demo.Counter.bump", &Value::Int(9)).unwrap(), 4);

        let calls = executor.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].command, CommandKind::Update);
        assert_eq!(calls[1].parameter, Value::Int(9));
    }

    #[test]
    fn test_select_one_and_map() {
        let config = model();
        let executor = Arc::new(MemoryExecutor::new(config.clone()));
        let session = Session::new(config, executor.clone());

        assert_eq!(session.select_one("demo.Counter.all", &Value::Null).unwrap(), Value::Null);

        executor.script_rows("demo.Counter.all", vec![row(1), row(2)]);
        let err = session.select_one("demo.Counter.all", &Value::Null).unwrap_err();
        assert!(matches!(err, ExecutionError::TooManyResults(2)));

        let keyed = session
            .select_map("demo.Counter.all", &Value::Null, "n", RowBounds::default())
            .unwrap();
        assert_eq!(keyed.keys().cloned().collect::<Vec<_>>(), vec![MapKey::Int(1), MapKey::Int(2)]);
        assert!(session.update("demo.Counter.all", &Value::Null).is_err());
        assert!(matches!(
            session.select_list("demo.Counter.missing", &Value::Null, RowBounds::default()),
            Err(ExecutionError::Registry(_))
        ));
    }
}
