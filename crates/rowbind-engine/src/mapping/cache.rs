//! Cache declarations

use std::collections::BTreeMap;

/// A namespace's cache declaration
///
/// Only identity and settings live here; storage and eviction are supplied
/// by an external caching layer. Namespaces that reference another
/// namespace's cache share the same `Arc<Cache>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cache {
    /// Owning namespace
    pub id: String,
    /// Base implementation name
    pub implementation: String,
    /// Eviction policy name
    pub eviction: String,
    /// Flush interval in milliseconds
    pub flush_interval: Option<u64>,
    /// Maximum number of entries
    pub size: Option<u64>,
    /// Return copies instead of shared instances
    pub read_write: bool,
    /// Block concurrent misses for the same key
    pub blocking: bool,
    /// Implementation-specific properties
    pub properties: BTreeMap<String, String>,
}

impl Cache {
    /// Cache with default settings for a namespace
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            implementation: "PERPETUAL".to_string(),
            eviction: "LRU".to_string(),
            flush_interval: None,
            size: None,
            read_write: true,
            blocking: false,
            properties: BTreeMap::new(),
        }
    }
}
