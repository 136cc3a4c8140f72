//! Binding errors

use thiserror::Error;

use crate::executor::ExecutionError;
use crate::reflect::ReflectionError;

/// Errors raised while registering mappers or dispatching mapper calls
#[derive(Debug, Error)]
pub enum BindingError {
    /// The interface was registered before
    #[error("Type {0} is already known to the MapperRegistry.")]
    AlreadyKnown(String),

    /// The interface was never registered
    #[error("Type {0} is not known to the MapperRegistry.")]
    UnknownMapper(String),

    /// No statement backs a method
    #[error("Invalid bound statement (not found): {0}")]
    StatementNotFound(String),

    /// The backing statement has no executable command
    #[error("Unknown execution method for: {0}")]
    UnknownCommand(String),

    /// A control parameter type appears twice
    #[error("{method} cannot have multiple {control} parameters")]
    MultipleControlParams {
        /// Method name
        method: String,
        /// `RowBounds` or `ResultHandler`
        control: &'static str,
    },

    /// A row count cannot convert to the declared return type
    #[error("Mapper method '{method}' has an unsupported return type: {return_type}")]
    UnsupportedReturnType {
        /// Qualified method name
        method: String,
        /// Declared return type
        return_type: String,
    },

    /// A select returned nothing for a primitive return type
    #[error(
        "Mapper method '{method}' attempted to return null from a method with a primitive return type ({return_type})."
    )]
    NullToPrimitive {
        /// Qualified method name
        method: String,
        /// Declared return type
        return_type: String,
    },

    /// A primitive array return received a null row
    #[error("Mapper method '{method}' attempted to store null in a primitive array ({return_type}).")]
    NullInPrimitiveArray {
        /// Qualified method name
        method: String,
        /// Declared return type
        return_type: String,
    },

    /// A row count does not fit the declared return type
    #[error("Mapper method '{method}' affected {rows} rows, which does not fit in {return_type}")]
    RowCountOverflow {
        /// Qualified method name
        method: String,
        /// Reported row count
        rows: i64,
        /// Declared return type
        return_type: String,
    },

    /// A result handler was passed to a statement that maps to nothing
    #[error(
        "Method {0} needs either a ResultMap annotation, a ResultType annotation, or a resultType attribute in XML so a ResultHandler can be used as a parameter."
    )]
    HandlerWithoutResultType(String),

    /// No method of the interface matches the call
    #[error("Mapper {interface} has no method {method}")]
    UnknownMethod {
        /// Interface name
        interface: String,
        /// Requested method
        method: String,
    },

    /// Several overloads match a call by name and argument count
    #[error("Call to {interface}.{method} is ambiguous; use a call key such as {candidates}")]
    AmbiguousMethod {
        /// Interface name
        interface: String,
        /// Requested method
        method: String,
        /// Matching call keys, comma separated
        candidates: String,
    },

    /// The argument count differs from the method's parameter count
    #[error("{method} expects {expected} argument(s) but got {actual}")]
    ArgumentCount {
        /// Call key
        method: String,
        /// Declared parameters
        expected: usize,
        /// Supplied arguments
        actual: usize,
    },

    /// The executor failed
    #[error("Error invoking {method} (statement '{statement}'): {source}")]
    Execution {
        /// Qualified method name
        method: String,
        /// Qualified statement id
        statement: String,
        /// Executor failure
        #[source]
        source: ExecutionError,
    },

    /// Result conversion failed
    #[error(transparent)]
    Reflection(#[from] ReflectionError),
}
