//! Runtime error types.

use rowbind_engine::node::NodeError;
use rowbind_engine::types::AliasError;
use rowbind_engine::{BindingError, BuildError, ReflectionError};

use crate::manifest::ManifestError;
use crate::source::SourceError;

/// Errors that can occur while loading a project.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Manifest could not be read or validated
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// XML source could not be read
    #[error("{resource}: {source}")]
    Source {
        /// Resource path as listed in the manifest
        resource: String,
        /// Underlying error
        #[source]
        source: SourceError,
    },

    /// Type source is structurally wrong
    #[error("Invalid type source: {0}")]
    InvalidTypeSource(String),

    /// Required attribute missing or malformed
    #[error("{0}")]
    Node(#[from] NodeError),

    /// Type descriptor rejected by the catalog
    #[error("{0}")]
    Reflection(#[from] ReflectionError),

    /// Alias could not be registered
    #[error("{0}")]
    Alias(#[from] AliasError),

    /// Linking failed
    #[error("{0}")]
    Build(#[from] BuildError),

    /// Mapper lookup failed
    #[error("{0}")]
    Binding(#[from] BindingError),

    /// A loader thread panicked or still holds the linker
    #[error("Loader thread failed: {0}")]
    Loader(String),
}

impl RuntimeError {
    pub(crate) fn in_source(resource: &str, source: SourceError) -> Self {
        RuntimeError::Source {
            resource: resource.to_string(),
            source,
        }
    }
}
