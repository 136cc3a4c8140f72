//! Rowbind Mapping Engine
//!
//! This crate turns declarative mapping fragments into a linked runtime model
//! and dispatches mapper-interface calls against it:
//! - **Reflect**: type descriptors, per-type capability tables, property paths (`reflect` module)
//! - **Types**: alias and type-handler lookups (`types` module)
//! - **Mapping**: committed entities and the global registry (`mapping` module)
//! - **Builder**: builder assistant, deferred-resolution linker, fragment readers (`builder` module)
//! - **Binding**: parameter naming, method signatures, mapper proxies (`binding` module)
//! - **Executor**: the statement-execution interface and an in-memory executor (`executor` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use rowbind_engine::builder::Linker;
//! use rowbind_engine::mapping::Configuration;
//!
//! let mut linker = Linker::new(Configuration::default());
//! linker.load_mapper("mappers/blog.xml", &mapper_node)?;
//! let model = linker.finish()?;
//!
//! let executor = Arc::new(MemoryExecutor::new(model.configuration.clone()));
//! let blog = model.mapper("demo.BlogMapper", executor)?.invoke("selectBlog", vec![Value::Int(1)])?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Core Modules
// ============================================================================

/// Attributed-node trees consumed by the fragment readers
pub mod node;

/// Engine settings
pub mod settings;

/// Dynamic values exchanged with mappers and executors
pub mod value;

/// Type descriptors, reflector, and property paths
pub mod reflect;

/// Type aliases and type handlers
pub mod types;

/// Committed entities and the global registry
pub mod mapping;

/// Builder assistant, deferred-resolution linker, and fragment readers
pub mod builder;

/// Parameter naming and mapper-call dispatch
pub mod binding;

/// Statement-execution interface
pub mod executor;

// ============================================================================
// Re-exports
// ============================================================================

pub use binding::{BindingError, MapperProxy, MapperRegistry, ParamNameResolver};
pub use builder::{BuildError, BuilderAssistant, Linker, LinkedModel, Resolution};
pub use executor::{ExecutionError, MemoryExecutor, Session, StatementExecutor};
pub use mapping::{Configuration, MappedStatement, ParameterMap, RegistryError, ResultMap};
pub use node::Node;
pub use reflect::{ReflectionError, ReflectorFactory, TypeCatalog, TypeDescriptor, TypeMetadata, TypeRef};
pub use settings::Settings;
pub use value::{MapKey, ObjectValue, ParamMap, Value};
