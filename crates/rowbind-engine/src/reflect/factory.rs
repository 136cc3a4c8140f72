//! Reflector cache

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use super::catalog::TypeCatalog;
use super::reflector::TypeMetadata;
use super::ReflectionError;

/// Memoizing source of [`TypeMetadata`]
///
/// Lookups and insertions may race freely: two threads asking for the same
/// uncached type may both compute it, and whichever insert lands first is
/// kept. Both results are identical.
pub struct ReflectorFactory {
    catalog: Arc<TypeCatalog>,
    cache_enabled: AtomicBool,
    cache: DashMap<String, Arc<TypeMetadata>>,
}

impl ReflectorFactory {
    /// Create a caching factory over a catalog
    pub fn new(catalog: Arc<TypeCatalog>) -> Self {
        Self {
            catalog,
            cache_enabled: AtomicBool::new(true),
            cache: DashMap::new(),
        }
    }

    /// The catalog metadata is computed from
    pub fn catalog(&self) -> &Arc<TypeCatalog> {
        &self.catalog
    }

    /// Check whether results are memoized
    pub fn is_cache_enabled(&self) -> bool {
        self.cache_enabled.load(Ordering::Relaxed)
    }

    /// Enable or disable memoization
    pub fn set_cache_enabled(&self, enabled: bool) {
        self.cache_enabled.store(enabled, Ordering::Relaxed);
        if !enabled {
            self.cache.clear();
        }
    }

    /// Capability table for a type
    pub fn metadata_for(&self, type_name: &str) -> Result<Arc<TypeMetadata>, ReflectionError> {
        if !self.is_cache_enabled() {
            return TypeMetadata::build(&self.catalog, type_name).map(Arc::new);
        }
        if let Some(cached) = self.cache.get(type_name) {
            return Ok(cached.clone());
        }
        let computed = Arc::new(TypeMetadata::build(&self.catalog, type_name)?);
        Ok(self
            .cache
            .entry(type_name.to_string())
            .or_insert(computed)
            .clone())
    }

    /// Number of memoized types
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{TypeDescriptor, TypeRef};

    fn factory() -> ReflectorFactory {
        let catalog = TypeCatalog::new();
        catalog
            .register(TypeDescriptor::class("demo.Blog").property("id", TypeRef::int()))
            .unwrap();
        ReflectorFactory::new(Arc::new(catalog))
    }

    #[test]
    fn test_memoized() {
        let factory = factory();
        let first = factory.metadata_for("demo.Blog").unwrap();
        let second = factory.metadata_for("demo.Blog").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(factory.cached_count(), 1);
    }

    #[test]
    fn test_cache_disabled() {
        let factory = factory();
        factory.set_cache_enabled(false);
        let first = factory.metadata_for("demo.Blog").unwrap();
        let second = factory.metadata_for("demo.Blog").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(factory.cached_count(), 0);
    }

    #[test]
    fn test_concurrent_first_lookup() {
        let factory = Arc::new(factory());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let factory = factory.clone();
                std::thread::spawn(move || factory.metadata_for("demo.Blog").unwrap())
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for meta in &results {
            assert_eq!(meta.readable_properties(), vec!["id"]);
        }
        assert_eq!(factory.cached_count(), 1);
    }

    #[test]
    fn test_unknown_type() {
        let factory = factory();
        assert!(factory.metadata_for("demo.Missing").is_err());
        assert_eq!(factory.cached_count(), 0);
    }
}
