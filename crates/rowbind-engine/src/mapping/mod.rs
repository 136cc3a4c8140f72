//! Committed entities and the global registry
//!
//! Everything the linker commits lands in a [`Configuration`]: mapped
//! statements, result maps, parameter maps, and caches, each under a
//! namespace-qualified id that is unique and immutable once added.

mod cache;
mod configuration;
mod parameter_map;
mod result_map;
mod statement;
mod strict_map;

pub use cache::Cache;
pub use configuration::{Configuration, NamespaceState};
pub use parameter_map::{ParameterMap, ParameterMapping, ParameterMode};
pub use result_map::{Discriminator, ResultFlag, ResultMap, ResultMapping};
pub use statement::{CommandKind, KeyGenerator, MappedStatement, ResultSetKind, SqlSource, StatementKind};
pub use strict_map::StrictMap;

use thiserror::Error;

/// Errors raised by the global registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// An id is already present
    #[error("{kind} collection already contains value for {id}")]
    Duplicate {
        /// Entity kind
        kind: &'static str,
        /// Offending id
        id: String,
    },

    /// A short name matches more than one qualified id
    #[error("{id} is ambiguous in {kind} collection (try using the full name including the namespace): {candidates}")]
    Ambiguous {
        /// Entity kind
        kind: &'static str,
        /// Short name looked up
        id: String,
        /// Comma-separated qualified candidates
        candidates: String,
    },

    /// No entity under the id
    #[error("{kind} collection does not contain value for {id}")]
    NotFound {
        /// Entity kind
        kind: &'static str,
        /// Requested id
        id: String,
    },

    /// The registry no longer accepts additions
    #[error("Cannot add {kind} '{id}': the configuration is frozen")]
    Frozen {
        /// Entity kind
        kind: &'static str,
        /// Rejected id
        id: String,
    },
}

/// Namespace portion of a qualified id (everything before the last `.`)
pub fn namespace_of(id: &str) -> &str {
    id.rfind('.').map(|dot| &id[..dot]).unwrap_or("")
}

/// Local portion of a qualified id (everything after the last `.`)
pub fn local_id_of(id: &str) -> &str {
    id.rfind('.').map(|dot| &id[dot + 1..]).unwrap_or(id)
}
