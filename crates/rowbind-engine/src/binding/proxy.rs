//! Mapper proxies

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::executor::Session;
use crate::reflect::{MethodDecl, TypeCatalog, TypeDescriptor};
use crate::value::Value;

use super::method::{interface_methods, MapperMethod};
use super::BindingError;

/// Dispatchable methods of an interface, by call key and by name
#[derive(Debug, Default)]
struct MethodIndex {
    by_key: FxHashMap<String, (MethodDecl, String)>,
    /// Call keys per method name, in declaration order
    by_name: FxHashMap<String, Vec<String>>,
}

impl MethodIndex {
    fn build(catalog: &TypeCatalog, interface: &Arc<TypeDescriptor>) -> Self {
        let mut index = Self::default();
        for (decl, declaring) in interface_methods(catalog, interface) {
            let key = decl.call_key();
            index.by_name.entry(decl.name.clone()).or_default().push(key.clone());
            index.by_key.insert(key, (decl, declaring));
        }
        trace!(interface = %interface.name(), methods = index.by_key.len(), "indexed mapper methods");
        index
    }

    /// Resolve a call key, or a method name plus argument count
    fn find(&self, interface: &str, method: &str, arity: usize) -> Result<&(MethodDecl, String), BindingError> {
        if let Some(found) = self.by_key.get(method) {
            return Ok(found);
        }
        let named: Vec<&(MethodDecl, String)> = self
            .by_name
            .get(method)
            .into_iter()
            .flatten()
            .filter_map(|key| self.by_key.get(key))
            .collect();
        let matching: Vec<&(MethodDecl, String)> = named
            .iter()
            .copied()
            .filter(|(decl, _)| decl.params.len() == arity)
            .collect();
        match (matching.as_slice(), named.as_slice()) {
            ([single], _) => Ok(*single),
            ([], [single]) => Ok(*single),
            ([], _) => Err(BindingError::UnknownMethod {
                interface: interface.to_string(),
                method: method.to_string(),
            }),
            (several, _) => Err(BindingError::AmbiguousMethod {
                interface: interface.to_string(),
                method: method.to_string(),
                candidates: several
                    .iter()
                    .map(|(decl, _)| decl.call_key())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }
}

/// Per-interface dispatch table shared by every proxy of that interface
///
/// The interface's methods are indexed once, on first use. Methods are
/// classified on first call and cached by call key. Two threads
/// classifying the same method at once both compute it; the first insert
/// wins.
pub struct MapperProxyFactory {
    interface: Arc<TypeDescriptor>,
    methods: OnceCell<MethodIndex>,
    method_cache: DashMap<String, Arc<MapperMethod>>,
}

impl MapperProxyFactory {
    /// Dispatch table for an interface
    pub fn new(interface: Arc<TypeDescriptor>) -> Self {
        Self {
            interface,
            methods: OnceCell::new(),
            method_cache: DashMap::new(),
        }
    }

    /// The mapper interface
    pub fn interface(&self) -> &Arc<TypeDescriptor> {
        &self.interface
    }

    /// Number of classified methods
    pub fn cached_methods(&self) -> usize {
        self.method_cache.len()
    }

    /// Check whether the method index has been built
    pub fn is_indexed(&self) -> bool {
        self.methods.get().is_some()
    }

    /// Proxy bound to a session
    pub fn new_instance(self: &Arc<Self>, session: Session) -> MapperProxy {
        MapperProxy {
            factory: self.clone(),
            session,
        }
    }

    fn index(&self, catalog: &TypeCatalog) -> &MethodIndex {
        self.methods.get_or_init(|| MethodIndex::build(catalog, &self.interface))
    }
}

impl fmt::Debug for MapperProxyFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapperProxyFactory")
            .field("interface", &self.interface.name())
            .field("cached_methods", &self.method_cache.len())
            .finish()
    }
}

/// A mapper interface bound to a session
#[derive(Clone)]
pub struct MapperProxy {
    factory: Arc<MapperProxyFactory>,
    session: Session,
}

impl MapperProxy {
    /// The session calls run in
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Call a mapper method
    ///
    /// `method` is either a plain method name, which must identify a single
    /// method taking `args.len()` arguments, or a call key such as
    /// `find(int,String)`.
    pub fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value, BindingError> {
        let (decl, declaring) = self.index().find(self.factory.interface.name(), method, args.len())?;
        if decl.params.len() != args.len() {
            return Err(BindingError::ArgumentCount {
                method: decl.call_key(),
                expected: decl.params.len(),
                actual: args.len(),
            });
        }
        let mapper_method = self.cached_method(decl, declaring)?;
        trace!(interface = %self.factory.interface.name(), %method, "dispatching");
        mapper_method.execute(&self.session, &args)
    }

    /// Classify every method up front
    ///
    /// Returns the number of methods in the dispatch table.
    pub fn prepare(&self) -> Result<usize, BindingError> {
        for (decl, declaring) in self.index().by_key.values() {
            self.cached_method(decl, declaring)?;
        }
        Ok(self.factory.cached_methods())
    }

    fn index(&self) -> &MethodIndex {
        self.factory.index(self.session.configuration().catalog())
    }

    fn cached_method(&self, decl: &MethodDecl, declaring: &str) -> Result<Arc<MapperMethod>, BindingError> {
        let key = decl.call_key();
        if let Some(cached) = self.factory.method_cache.get(&key) {
            return Ok(cached.clone());
        }
        let method = Arc::new(MapperMethod::new(
            self.session.configuration(),
            &self.factory.interface,
            decl,
            declaring,
        )?);
        Ok(self.factory.method_cache.entry(key).or_insert(method).clone())
    }
}

impl fmt::Debug for MapperProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapperProxy")
            .field("interface", &self.factory.interface.name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Linker;
    use crate::executor::MemoryExecutor;
    use crate::mapping::Configuration;
    use crate::node::Node;
    use crate::reflect::{ParamDecl, TypeRef};

    fn tag_mapper() -> TypeDescriptor {
        TypeDescriptor::interface("demo.TagMapper")
            .method(
                MethodDecl::new("count", TypeRef::named("Long"))
                    .annotate(Node::new("Select").with_attr("value", "select count(*) from tag")),
            )
            .method(MethodDecl::new("find", TypeRef::string()).param_decl(ParamDecl::named("id", TypeRef::int())))
            .method(MethodDecl::new("find", TypeRef::string()).param_decl(ParamDecl::named("name", TypeRef::string())))
    }

    fn proxy() -> (Arc<MapperProxyFactory>, MapperProxy) {
        let config = Configuration::default();
        config.catalog().register(tag_mapper()).unwrap();
        let mut linker = Linker::new(config);
        linker.add_mapper("demo.TagMapper").unwrap();
        let model = linker.finish().unwrap();

        let interface = model.configuration.catalog().require("demo.TagMapper").unwrap();
        let factory = Arc::new(MapperProxyFactory::new(interface));
        let executor = Arc::new(MemoryExecutor::new(model.configuration.clone()));
        let proxy = factory.new_instance(Session::new(model.configuration.clone(), executor));
        (factory, proxy)
    }

    #[test]
    fn test_index_built_once_and_methods_cached() {
        let (factory, proxy) = proxy();
        assert!(!factory.is_indexed());

        assert_eq!(proxy.invoke("count", vec![]).unwrap(), Value::Null);
        assert!(factory.is_indexed());
        assert_eq!(factory.cached_methods(), 1);

        proxy.invoke("count()", vec![]).unwrap();
        proxy.invoke("count", vec![]).unwrap();
        assert_eq!(factory.cached_methods(), 1);
    }

    #[test]
    fn test_lookup_by_name_and_call_key() {
        let (_, proxy) = proxy();
        assert!(matches!(
            proxy.invoke("find", vec![Value::Int(1)]),
            Err(BindingError::AmbiguousMethod { ref candidates, .. })
                if candidates.contains("find(int)") && candidates.contains("find(String)")
        ));
        assert!(matches!(
            proxy.invoke("find(int)", vec![Value::Int(1)]),
            Err(BindingError::StatementNotFound(ref id)) if id == "demo.TagMapper.find"
        ));
        assert!(matches!(
            proxy.invoke("count", vec![Value::Int(1)]),
            Err(BindingError::ArgumentCount { expected: 0, actual: 1, .. })
        ));
        assert!(matches!(
            proxy.invoke("missing", vec![]),
            Err(BindingError::UnknownMethod { .. })
        ));
    }
}
