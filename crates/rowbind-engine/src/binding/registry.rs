//! Mapper interface registry

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::executor::Session;
use crate::reflect::TypeDescriptor;

use super::proxy::{MapperProxy, MapperProxyFactory};
use super::BindingError;

/// Registered mapper interfaces, each with its dispatch table
#[derive(Default)]
pub struct MapperRegistry {
    known: FxHashMap<String, Arc<MapperProxyFactory>>,
}

impl MapperRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an interface
    ///
    /// Returns `false` for types that are not interfaces.
    pub fn add_mapper(&mut self, interface: Arc<TypeDescriptor>) -> Result<bool, BindingError> {
        if !interface.is_interface() {
            return Ok(false);
        }
        let name = interface.name().to_string();
        if self.known.contains_key(&name) {
            return Err(BindingError::AlreadyKnown(name));
        }
        self.known.insert(name, Arc::new(MapperProxyFactory::new(interface)));
        Ok(true)
    }

    /// Unregister an interface
    pub fn remove_mapper(&mut self, name: &str) -> bool {
        self.known.remove(name).is_some()
    }

    /// Check whether an interface is registered
    pub fn has_mapper(&self, name: &str) -> bool {
        self.known.contains_key(name)
    }

    /// Proxy for a registered interface bound to `session`
    pub fn get_mapper(&self, name: &str, session: Session) -> Result<MapperProxy, BindingError> {
        self.known
            .get(name)
            .map(|factory| factory.new_instance(session))
            .ok_or_else(|| BindingError::UnknownMapper(name.to_string()))
    }

    /// Registered interface names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.known.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered interfaces
    pub fn len(&self) -> usize {
        self.known.len()
    }

    /// Check for an empty registry
    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

impl fmt::Debug for MapperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapperRegistry")
            .field("mappers", &self.names())
            .finish()
    }
}
