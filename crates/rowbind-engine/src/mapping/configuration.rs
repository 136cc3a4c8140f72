//! The global registry
//!
//! A [`Configuration`] is created empty, populated through `&mut` while
//! sources load, then frozen and shared read-only as `Arc<Configuration>`.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::reflect::{
    DefaultObjectFactory, MetaClass, MetaObject, ObjectFactory, ReflectionError, ReflectorFactory,
    TypeCatalog, TypeRef,
};
use crate::settings::Settings;
use crate::types::{AliasError, TypeAliasRegistry, TypeHandlerRegistry};

use super::cache::Cache;
use super::parameter_map::ParameterMap;
use super::result_map::ResultMap;
use super::statement::MappedStatement;
use super::strict_map::StrictMap;
use super::RegistryError;

/// Per-namespace builder state
#[derive(Debug, Clone, Default)]
pub struct NamespaceState {
    /// Cache attached to statements built in this namespace
    pub current_cache: Option<Arc<Cache>>,
    /// A cache reference was declared but has not resolved yet
    pub unresolved_cache_ref: bool,
}

/// Process-wide store of committed entities
pub struct Configuration {
    settings: Settings,
    catalog: Arc<TypeCatalog>,
    reflector: Arc<ReflectorFactory>,
    object_factory: Arc<dyn ObjectFactory>,
    aliases: TypeAliasRegistry,
    handlers: TypeHandlerRegistry,
    statements: StrictMap<Arc<MappedStatement>>,
    result_maps: StrictMap<Arc<ResultMap>>,
    parameter_maps: StrictMap<Arc<ParameterMap>>,
    caches: StrictMap<Arc<Cache>>,
    /// Referencing namespace → referenced namespace
    cache_refs: FxHashMap<String, String>,
    namespaces: FxHashMap<String, NamespaceState>,
    loaded_resources: FxHashSet<String>,
    frozen: bool,
}

impl Configuration {
    /// Create an empty configuration with its own type catalog
    pub fn new(settings: Settings) -> Self {
        Self::with_catalog(settings, Arc::new(TypeCatalog::new()))
    }

    /// Create an empty configuration over an existing type catalog
    pub fn with_catalog(settings: Settings, catalog: Arc<TypeCatalog>) -> Self {
        let reflector = Arc::new(ReflectorFactory::new(catalog.clone()));
        reflector.set_cache_enabled(settings.reflector_cache_enabled);
        let object_factory: Arc<dyn ObjectFactory> = Arc::new(DefaultObjectFactory::new(reflector.clone()));
        Self {
            settings,
            catalog,
            reflector,
            object_factory,
            aliases: TypeAliasRegistry::new(),
            handlers: TypeHandlerRegistry::new(),
            statements: StrictMap::new("Mapped Statements"),
            result_maps: StrictMap::new("Result Maps"),
            parameter_maps: StrictMap::new("Parameter Maps"),
            caches: StrictMap::new("Caches"),
            cache_refs: FxHashMap::default(),
            namespaces: FxHashMap::default(),
            loaded_resources: FxHashSet::default(),
            frozen: false,
        }
    }

    // ========================================================================
    // Collaborators
    // ========================================================================

    /// Engine settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Type catalog
    pub fn catalog(&self) -> &Arc<TypeCatalog> {
        &self.catalog
    }

    /// Reflector cache
    pub fn reflector(&self) -> &Arc<ReflectorFactory> {
        &self.reflector
    }

    /// Object factory used to build results
    pub fn object_factory(&self) -> &Arc<dyn ObjectFactory> {
        &self.object_factory
    }

    /// Replace the object factory
    pub fn set_object_factory(&mut self, factory: Arc<dyn ObjectFactory>) {
        self.object_factory = factory;
    }

    /// Type aliases
    pub fn aliases(&self) -> &TypeAliasRegistry {
        &self.aliases
    }

    /// Type aliases, mutable
    pub fn aliases_mut(&mut self) -> &mut TypeAliasRegistry {
        &mut self.aliases
    }

    /// Type handlers
    pub fn handlers(&self) -> &TypeHandlerRegistry {
        &self.handlers
    }

    /// Type handlers, mutable
    pub fn handlers_mut(&mut self) -> &mut TypeHandlerRegistry {
        &mut self.handlers
    }

    /// Resolve a written type name through aliases and the catalog
    pub fn resolve_type(&self, name: &str) -> Result<TypeRef, AliasError> {
        self.aliases.resolve(name, &self.catalog)
    }

    /// Property-path resolver for a type
    pub fn meta_class(&self, ty: &TypeRef) -> Result<MetaClass<'_>, ReflectionError> {
        MetaClass::for_type(&self.reflector, ty)
    }

    /// Property-path accessor for values
    pub fn meta_object(&self) -> MetaObject<'_> {
        MetaObject::new(&self.reflector, self.object_factory.as_ref())
    }

    // ========================================================================
    // Statements
    // ========================================================================

    /// Check whether a statement id resolves
    pub fn has_statement(&self, id: &str) -> bool {
        self.statements.contains(id)
    }

    /// Committed statement by id
    pub fn get_statement(&self, id: &str) -> Result<&Arc<MappedStatement>, RegistryError> {
        self.statements.get(id)
    }

    /// Commit a statement
    pub fn add_statement(&mut self, statement: MappedStatement) -> Result<Arc<MappedStatement>, RegistryError> {
        self.check_open("Mapped Statements", &statement.id)?;
        let statement = Arc::new(statement);
        self.statements.add(&statement.id, statement.clone())?;
        Ok(statement)
    }

    /// Committed statements in commit order
    pub fn statements(&self) -> impl Iterator<Item = &Arc<MappedStatement>> {
        self.statements.values()
    }

    // ========================================================================
    // Result maps
    // ========================================================================

    /// Check whether a result map id resolves
    pub fn has_result_map(&self, id: &str) -> bool {
        self.result_maps.contains(id)
    }

    /// Committed result map by id
    pub fn get_result_map(&self, id: &str) -> Result<&Arc<ResultMap>, RegistryError> {
        self.result_maps.get(id)
    }

    /// Commit a result map
    pub fn add_result_map(&mut self, result_map: ResultMap) -> Result<Arc<ResultMap>, RegistryError> {
        self.check_open("Result Maps", result_map.id())?;
        let result_map = Arc::new(result_map);
        self.result_maps.add(result_map.id(), result_map.clone())?;
        Ok(result_map)
    }

    /// Committed result maps in commit order
    pub fn result_maps(&self) -> impl Iterator<Item = &Arc<ResultMap>> {
        self.result_maps.values()
    }

    // ========================================================================
    // Parameter maps
    // ========================================================================

    /// Check whether a parameter map id resolves
    pub fn has_parameter_map(&self, id: &str) -> bool {
        self.parameter_maps.contains(id)
    }

    /// Committed parameter map by id
    pub fn get_parameter_map(&self, id: &str) -> Result<&Arc<ParameterMap>, RegistryError> {
        self.parameter_maps.get(id)
    }

    /// Commit a parameter map
    pub fn add_parameter_map(&mut self, parameter_map: ParameterMap) -> Result<Arc<ParameterMap>, RegistryError> {
        self.check_open("Parameter Maps", &parameter_map.id)?;
        let parameter_map = Arc::new(parameter_map);
        self.parameter_maps
            .add(&parameter_map.id, parameter_map.clone())?;
        Ok(parameter_map)
    }

    /// Committed parameter maps in commit order
    pub fn parameter_maps(&self) -> impl Iterator<Item = &Arc<ParameterMap>> {
        self.parameter_maps.values()
    }

    // ========================================================================
    // Caches
    // ========================================================================

    /// Check whether a namespace declared a cache
    pub fn has_cache(&self, namespace: &str) -> bool {
        self.caches.contains(namespace)
    }

    /// Declared cache of a namespace
    pub fn get_cache(&self, namespace: &str) -> Result<&Arc<Cache>, RegistryError> {
        self.caches.get(namespace)
    }

    /// Commit a cache declaration
    pub fn add_cache(&mut self, cache: Cache) -> Result<Arc<Cache>, RegistryError> {
        self.check_open("Caches", &cache.id)?;
        let cache = Arc::new(cache);
        self.caches.add(&cache.id, cache.clone())?;
        Ok(cache)
    }

    /// Declared caches in commit order
    pub fn caches(&self) -> impl Iterator<Item = &Arc<Cache>> {
        self.caches.values()
    }

    /// Record that `namespace` shares the cache of `referenced`
    pub fn add_cache_ref(&mut self, namespace: &str, referenced: &str) {
        self.cache_refs
            .insert(namespace.to_string(), referenced.to_string());
    }

    /// Namespace whose cache `namespace` shares
    pub fn cache_ref(&self, namespace: &str) -> Option<&str> {
        self.cache_refs.get(namespace).map(String::as_str)
    }

    // ========================================================================
    // Builder state
    // ========================================================================

    /// Builder state of a namespace
    pub fn namespace_state(&self, namespace: &str) -> Option<&NamespaceState> {
        self.namespaces.get(namespace)
    }

    /// Builder state of a namespace, created on first use
    pub fn namespace_state_mut(&mut self, namespace: &str) -> &mut NamespaceState {
        self.namespaces.entry(namespace.to_string()).or_default()
    }

    /// Check whether a source has been loaded
    pub fn is_resource_loaded(&self, resource: &str) -> bool {
        self.loaded_resources.contains(resource)
    }

    /// Mark a source as loaded
    pub fn add_loaded_resource(&mut self, resource: &str) {
        self.loaded_resources.insert(resource.to_string());
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Stop accepting new entities
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Check whether the configuration is frozen
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn check_open(&self, kind: &'static str, id: &str) -> Result<(), RegistryError> {
        if self.frozen {
            return Err(RegistryError::Frozen {
                kind,
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("statements", &self.statements.len())
            .field("result_maps", &self.result_maps.len())
            .field("parameter_maps", &self.parameter_maps.len())
            .field("caches", &self.caches.len())
            .field("frozen", &self.frozen)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::TypeRef;

    #[test]
    fn test_duplicate_result_map_keeps_first() {
        let mut config = Configuration::default();
        config
            .add_result_map(ResultMap::new("demo.Blog.base", TypeRef::named("Object"), vec![], None, None))
            .unwrap();
        let err = config
            .add_result_map(ResultMap::new("demo.Blog.base", TypeRef::named("HashMap"), vec![], None, None))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate { .. }));
        assert_eq!(
            config.get_result_map("demo.Blog.base").unwrap().type_ref(),
            &TypeRef::named("Object")
        );
    }

    #[test]
    fn test_frozen_rejects_additions() {
        let mut config = Configuration::default();
        config.freeze();
        let err = config.add_cache(Cache::new("demo.Blog")).unwrap_err();
        assert_eq!(
            err,
            RegistryError::Frozen {
                kind: "Caches",
                id: "demo.Blog".into()
            }
        );
        assert!(!config.has_cache("demo.Blog"));
    }

    #[test]
    fn test_cache_refs_and_resources() {
        let mut config = Configuration::default();
        config.add_cache_ref("demo.Post", "demo.Blog");
        assert_eq!(config.cache_ref("demo.Post"), Some("demo.Blog"));

        assert!(!config.is_resource_loaded("mappers/blog.xml"));
        config.add_loaded_resource("mappers/blog.xml");
        assert!(config.is_resource_loaded("mappers/blog.xml"));

        config.namespace_state_mut("demo.Post").unresolved_cache_ref = true;
        assert!(config.namespace_state("demo.Post").unwrap().unresolved_cache_ref);
    }

    #[test]
    fn test_reflector_cache_setting() {
        let settings = Settings {
            reflector_cache_enabled: false,
            ..Settings::default()
        };
        let config = Configuration::new(settings);
        assert!(!config.reflector().is_cache_enabled());
    }
}
