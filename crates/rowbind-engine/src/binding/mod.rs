//! Mapper-call binding
//!
//! A mapper interface is registered once with the [`MapperRegistry`]. Each
//! call through a [`MapperProxy`] is classified by a cached [`MapperMethod`]:
//! which statement it runs, how its arguments become a parameter value, and
//! how the executor's result converts back to the declared return type.

mod error;
mod method;
mod param;
mod proxy;
mod registry;

pub use error::BindingError;
pub use method::{MapperMethod, MethodSignature, SqlCommand};
pub use param::ParamNameResolver;
pub use proxy::{MapperProxy, MapperProxyFactory};
pub use registry::MapperRegistry;

pub(crate) use method::interface_methods;
pub(crate) use param::is_control_type;
