//! Mapped statements

use std::str::FromStr;
use std::sync::Arc;

use super::cache::Cache;
use super::parameter_map::ParameterMap;
use super::result_map::ResultMap;

/// What a statement does when executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Not a recognized statement kind
    Unknown,
    /// INSERT
    Insert,
    /// UPDATE
    Update,
    /// DELETE
    Delete,
    /// SELECT
    Select,
    /// Flush pending batched statements
    Flush,
}

impl CommandKind {
    /// Command kind for a declaration element or annotation name
    pub fn from_element(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "insert" | "insertprovider" => CommandKind::Insert,
            "update" | "updateprovider" => CommandKind::Update,
            "delete" | "deleteprovider" => CommandKind::Delete,
            "select" | "selectprovider" => CommandKind::Select,
            _ => CommandKind::Unknown,
        }
    }

    /// Check for a read statement
    pub fn is_select(self) -> bool {
        self == CommandKind::Select
    }
}

/// How the statement is sent to the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatementKind {
    /// Plain statement
    Statement,
    /// Prepared statement
    #[default]
    Prepared,
    /// Stored procedure call
    Callable,
}

impl FromStr for StatementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STATEMENT" => Ok(StatementKind::Statement),
            "PREPARED" => Ok(StatementKind::Prepared),
            "CALLABLE" => Ok(StatementKind::Callable),
            other => Err(format!("Unknown statement type '{}'", other)),
        }
    }
}

/// Scrollability of the result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultSetKind {
    /// Driver default
    #[default]
    Default,
    /// Forward only
    ForwardOnly,
    /// Scrollable, insensitive to changes
    ScrollInsensitive,
    /// Scrollable, sensitive to changes
    ScrollSensitive,
}

impl FromStr for ResultSetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEFAULT" => Ok(ResultSetKind::Default),
            "FORWARD_ONLY" => Ok(ResultSetKind::ForwardOnly),
            "SCROLL_INSENSITIVE" => Ok(ResultSetKind::ScrollInsensitive),
            "SCROLL_SENSITIVE" => Ok(ResultSetKind::ScrollSensitive),
            other => Err(format!("Unknown result set type '{}'", other)),
        }
    }
}

/// Where generated keys come from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KeyGenerator {
    /// No generated keys
    #[default]
    None,
    /// Keys reported by the driver after insert
    Jdbc3,
    /// Keys produced by a separate select statement
    SelectKey {
        /// Qualified id of the key statement
        statement_id: String,
        /// Run before the main statement instead of after
        execute_before: bool,
    },
}

/// Statement text, opaque to the linker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlSource {
    /// Raw statement text as declared
    pub text: String,
    /// Dynamic-text provider reference (`type#method`) for provider-based statements
    pub provider: Option<String>,
}

impl SqlSource {
    /// Static statement text
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            provider: None,
        }
    }
}

/// A committed, executable statement
#[derive(Debug, Clone)]
pub struct MappedStatement {
    /// Qualified id (`namespace.localId`)
    pub id: String,
    /// Resource the statement was declared in
    pub resource: String,
    /// Command kind
    pub command: CommandKind,
    /// Statement kind
    pub statement_kind: StatementKind,
    /// Statement text
    pub sql: SqlSource,
    /// Parameter map
    pub parameter_map: Arc<ParameterMap>,
    /// Result maps, one per result set
    pub result_maps: Vec<Arc<ResultMap>>,
    /// Fetch size hint
    pub fetch_size: Option<u64>,
    /// Timeout in seconds
    pub timeout: Option<u64>,
    /// Result set scrollability
    pub result_set_kind: ResultSetKind,
    /// Clear caches before executing
    pub flush_cache: bool,
    /// Cache results of this statement
    pub use_cache: bool,
    /// Nested results arrive grouped
    pub result_ordered: bool,
    /// Attached namespace cache
    pub cache: Option<Arc<Cache>>,
    /// Generated key source
    pub key_generator: KeyGenerator,
    /// Properties receiving generated keys
    pub key_properties: Vec<String>,
    /// Columns holding generated keys
    pub key_columns: Vec<String>,
    /// Vendor id this statement is specific to
    pub database_id: Option<String>,
    /// Scripting language driver name
    pub lang: Option<String>,
    /// Named result sets for multi-result procedures
    pub result_sets: Vec<String>,
}

impl MappedStatement {
    /// Owning namespace
    pub fn namespace(&self) -> &str {
        super::namespace_of(&self.id)
    }

    /// Total number of field mappings across all result maps
    pub fn result_mapping_count(&self) -> usize {
        self.result_maps.iter().map(|m| m.mappings().len()).sum()
    }
}
