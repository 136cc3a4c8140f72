//! Build errors

use thiserror::Error;

use crate::binding::BindingError;
use crate::mapping::RegistryError;
use crate::node::NodeError;
use crate::reflect::ReflectionError;
use crate::types::AliasError;

use super::pending::UnresolvedFragment;

/// Fatal errors raised while linking fragments
///
/// Missing cross-references are not errors; they travel as
/// [`Resolution::Pending`](super::Resolution::Pending) until the final pass.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A mapper has no namespace
    #[error("The mapper element requires a namespace attribute to be specified.")]
    MissingNamespace,

    /// The namespace changed while building one mapper
    #[error("Wrong namespace. Expected '{expected}' but found '{found}'.")]
    NamespaceMismatch {
        /// Namespace already in effect
        expected: String,
        /// Namespace requested
        found: String,
    },

    /// A locally declared id is qualified with a foreign namespace
    #[error("Dots are not allowed in element names, please remove it from {0}")]
    DottedId(String),

    /// A cache reference names no namespace
    #[error("cache-ref element requires a namespace attribute.")]
    MissingCacheRefNamespace,

    /// A cache reference annotation is malformed
    #[error("{0}")]
    InvalidCacheRef(String),

    /// A statement declares both a result map and a result type
    #[error("Statement '{0}' specifies both resultMap and resultType; they are mutually exclusive")]
    ConflictingOutputShape(String),

    /// A statement method carries both static SQL and a provider
    #[error("You cannot supply both a static SQL and SqlProvider to method named {0}")]
    ConflictingSqlSource(String),

    /// An attribute value could not be interpreted
    #[error("Invalid {what} '{value}' in {element}")]
    InvalidValue {
        /// Element or annotation carrying the value
        element: String,
        /// What the value was meant to be
        what: &'static str,
        /// Offending text
        value: String,
    },

    /// Malformed attribute on an attributed node
    #[error(transparent)]
    Node(#[from] NodeError),

    /// Registry rejected a commit
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Type introspection failed
    #[error(transparent)]
    Reflection(#[from] ReflectionError),

    /// A type name did not resolve
    #[error(transparent)]
    Alias(#[from] AliasError),

    /// Mapper interface registration failed
    #[error(transparent)]
    Binding(#[from] BindingError),

    /// Fragments still pending after the final retry pass
    #[error("{} fragment(s) could not be resolved: {}", .0.len(), describe(.0))]
    Unresolved(Vec<UnresolvedFragment>),

    /// An error raised while reading a specific source
    #[error("Error parsing mapper resource '{resource}': {source}")]
    InResource {
        /// Source identifier
        resource: String,
        /// Underlying error
        #[source]
        source: Box<BuildError>,
    },
}

impl BuildError {
    /// Attach the source a fragment was read from
    pub fn in_resource(self, resource: &str) -> Self {
        match self {
            already @ BuildError::InResource { .. } => already,
            unresolved @ BuildError::Unresolved(_) => unresolved,
            other => BuildError::InResource {
                resource: resource.to_string(),
                source: Box::new(other),
            },
        }
    }
}

fn describe(fragments: &[UnresolvedFragment]) -> String {
    fragments
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
