//! Fragment linking
//!
//! Declarative sources are read into fragments (statements, result maps,
//! cache references, annotated methods). Each fragment is resolved against
//! the [`Configuration`](crate::mapping::Configuration) through the
//! [`BuilderAssistant`]; fragments whose references do not exist yet are
//! parked by the [`Linker`] and retried until the model reaches a fixpoint.

mod annotation;
mod assistant;
mod error;
mod linker;
mod pending;
mod xml;

pub use annotation::AnnotationReader;
pub use assistant::{
    BuilderAssistant, CacheSpec, DiscriminatorSpec, ParameterMappingSpec, ResultMapSpec,
    ResultMappingSpec, StatementGroup, StatementSpec,
};
pub use error::BuildError;
pub use linker::{LinkedModel, Linker, SourceLookup};
pub use pending::{
    resolver, FragmentKey, FragmentKind, PendingFragment, PendingRegistry, Resolution, Resolver,
    UnresolvedFragment,
};
pub use xml::XmlMapperReader;
