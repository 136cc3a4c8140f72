//! Reflection
//!
//! Object types are described at runtime by [`TypeDescriptor`]s registered in a
//! [`TypeCatalog`]. From a descriptor the reflector computes a per-type
//! capability table ([`TypeMetadata`]) listing every readable and writable
//! property together with the invoker used to reach it, and caches it in a
//! [`ReflectorFactory`].
//!
//! - [`MetaClass`] resolves dotted property paths against types
//! - [`MetaObject`] reads and writes property paths on values
//! - [`ObjectFactory`] instantiates objects and collections

mod catalog;
mod descriptor;
mod factory;
mod invoker;
mod meta_class;
mod meta_object;
mod object_factory;
pub mod property;
mod reflector;

pub use catalog::TypeCatalog;
pub use descriptor::{
    ComputeFn, ConstructorDecl, FieldDecl, MethodBody, MethodDecl, ParamDecl, Primitive,
    TypeDescriptor, TypeKind, TypeRef, UpdateFn,
};
pub use factory::ReflectorFactory;
pub use invoker::Invoker;
pub use meta_class::MetaClass;
pub use meta_object::MetaObject;
pub use object_factory::{DefaultObjectFactory, ObjectFactory};
pub use property::PropertyTokenizer;
pub use reflector::TypeMetadata;

use thiserror::Error;

/// Errors raised while describing, introspecting, or accessing types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReflectionError {
    /// No descriptor registered under the name
    #[error("Type '{0}' is not registered")]
    UnknownType(String),

    /// A descriptor with the same name is already registered
    #[error("Type '{0}' is already registered")]
    DuplicateType(String),

    /// No readable property with the name
    #[error("There is no getter for property named '{property}' in '{type_name}'")]
    NoGetter {
        /// Property name
        property: String,
        /// Owning type
        type_name: String,
    },

    /// No writable property with the name
    #[error("There is no setter for property named '{property}' in '{type_name}'")]
    NoSetter {
        /// Property name
        property: String,
        /// Owning type
        type_name: String,
    },

    /// Two getters for one property whose return types are unrelated
    #[error(
        "Illegal overloaded getter method with ambiguous type for property '{property}' in class '{type_name}': '{first}' and '{second}'"
    )]
    AmbiguousGetter {
        /// Property name
        property: String,
        /// Owning type
        type_name: String,
        /// First competing method signature
        first: String,
        /// Second competing method signature
        second: String,
    },

    /// Two setters for one property whose parameter types are unrelated
    #[error(
        "Ambiguous setters defined for property '{property}' in class '{type_name}' with types '{first}' and '{second}'."
    )]
    AmbiguousSetter {
        /// Property name
        property: String,
        /// Owning type
        type_name: String,
        /// First competing parameter type
        first: String,
        /// Second competing parameter type
        second: String,
    },

    /// Method name does not follow the accessor convention
    #[error("Error parsing property name '{0}'. Didn't start with 'is', 'get' or 'set'.")]
    NotAnAccessor(String),

    /// Accessor method has no body usable in the requested direction
    #[error("Method '{method}' of '{type_name}' cannot be invoked as a {role}")]
    NotInvocable {
        /// Method name
        method: String,
        /// Owning type
        type_name: String,
        /// `getter` or `setter`
        role: &'static str,
    },

    /// Object factory could not produce an instance
    #[error("Error instantiating {type_name}: {reason}")]
    Instantiation {
        /// Requested type
        type_name: String,
        /// Failure description
        reason: String,
    },

    /// A collection operation was applied to a non-collection
    #[error("'{0}' is not a collection")]
    NotACollection(String),

    /// Strict parameter map lookup failed
    #[error("Parameter '{name}' not found. Available parameters are [{available}]")]
    ParameterNotFound {
        /// Requested name
        name: String,
        /// Comma-separated bound names
        available: String,
    },

    /// A property path could not be navigated
    #[error("Cannot access '{path}': {reason}")]
    InvalidPath {
        /// Full property path
        path: String,
        /// Failure description
        reason: String,
    },
}
