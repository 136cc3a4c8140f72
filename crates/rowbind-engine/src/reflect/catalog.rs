//! Type catalog
//!
//! Process-wide registry of [`TypeDescriptor`]s. Registration happens while
//! configuration loads; lookups happen from any thread afterwards.

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use rustc_hash::FxHashSet;

use super::descriptor::{TypeDescriptor, TypeRef};
use super::ReflectionError;

/// Concurrent registry of type descriptors
pub struct TypeCatalog {
    /// Map of qualified type name to descriptor
    types: DashMap<String, Arc<TypeDescriptor>>,
}

impl TypeCatalog {
    /// Create a catalog preloaded with the built-in types
    pub fn new() -> Self {
        let catalog = Self {
            types: DashMap::new(),
        };
        for desc in builtin_types() {
            catalog.types.insert(desc.name().to_string(), Arc::new(desc));
        }
        catalog
    }

    /// Register a descriptor
    ///
    /// Re-registering a name is an error; descriptors are immutable once
    /// registered.
    pub fn register(&self, desc: TypeDescriptor) -> Result<Arc<TypeDescriptor>, ReflectionError> {
        let name = desc.name().to_string();
        let desc = Arc::new(desc);
        match self.types.entry(name) {
            dashmap::mapref::entry::Entry::Occupied(entry) => {
                Err(ReflectionError::DuplicateType(entry.key().clone()))
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(desc.clone());
                tracing::trace!(type_name = desc.name(), "registered type descriptor");
                Ok(desc)
            }
        }
    }

    /// Get a descriptor by name
    pub fn get(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
        self.types.get(name).map(|entry| entry.clone())
    }

    /// Get a descriptor by name or fail with [`ReflectionError::UnknownType`]
    pub fn require(&self, name: &str) -> Result<Arc<TypeDescriptor>, ReflectionError> {
        self.get(name)
            .ok_or_else(|| ReflectionError::UnknownType(name.to_string()))
    }

    /// Check whether a name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Number of registered descriptors, built-ins included
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registered type names in sorted order
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    /// Check whether `sub` is `sup` or reaches it through superclasses or
    /// implemented interfaces
    pub fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        if sub == sup {
            return true;
        }
        let mut seen = FxHashSet::default();
        let mut queue = VecDeque::from([sub.to_string()]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            let Some(desc) = self.get(&current) else {
                continue;
            };
            for parent in desc.supertype().into_iter().chain(desc.interfaces().iter().map(String::as_str)) {
                if parent == sup {
                    return true;
                }
                queue.push_back(parent.to_string());
            }
        }
        false
    }

    /// Check whether a value of type `source` can be stored where `target`
    /// is declared
    pub fn is_assignable(&self, target: &TypeRef, source: &TypeRef) -> bool {
        let target = target.erasure();
        let source = source.erasure();
        match (&target, &source) {
            (TypeRef::Primitive(a), TypeRef::Primitive(b)) => a == b,
            (TypeRef::Primitive(_), _) | (_, TypeRef::Primitive(_)) => false,
            (TypeRef::Named(t), _) if t == "Object" => true,
            (TypeRef::Array(t), TypeRef::Array(s)) => {
                if t.is_primitive() || s.is_primitive() {
                    t == s
                } else {
                    self.is_assignable(t, s)
                }
            }
            (TypeRef::Named(t), TypeRef::Named(s)) => self.is_subtype(s, t),
            _ => false,
        }
    }

    /// Check whether a type is a collection
    pub fn is_collection(&self, ty: &TypeRef) -> bool {
        matches!(ty.erasure(), TypeRef::Named(ref name) if self.is_subtype(name, "Collection"))
    }

    /// Check whether a type is a map
    pub fn is_map(&self, ty: &TypeRef) -> bool {
        matches!(ty.erasure(), TypeRef::Named(ref name) if self.is_subtype(name, "Map"))
    }
}

impl Default for TypeCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn builtin_types() -> Vec<TypeDescriptor> {
    vec![
        TypeDescriptor::class("Object").default_constructor(),
        TypeDescriptor::class("String").default_constructor(),
        TypeDescriptor::class("Number"),
        TypeDescriptor::class("Byte").extends("Number"),
        TypeDescriptor::class("Short").extends("Number"),
        TypeDescriptor::class("Integer").extends("Number"),
        TypeDescriptor::class("Long").extends("Number"),
        TypeDescriptor::class("Float").extends("Number"),
        TypeDescriptor::class("Double").extends("Number"),
        TypeDescriptor::class("BigDecimal").extends("Number"),
        TypeDescriptor::class("Boolean"),
        TypeDescriptor::class("Character"),
        TypeDescriptor::class("Date").default_constructor(),
        TypeDescriptor::interface("Collection"),
        TypeDescriptor::interface("List").implements("Collection"),
        TypeDescriptor::interface("Set").implements("Collection"),
        TypeDescriptor::class("ArrayList").implements("List").default_constructor(),
        TypeDescriptor::class("LinkedList").implements("List").default_constructor(),
        TypeDescriptor::class("HashSet").implements("Set").default_constructor(),
        TypeDescriptor::class("TreeSet").implements("Set").default_constructor(),
        TypeDescriptor::interface("Map"),
        TypeDescriptor::class("HashMap").implements("Map").default_constructor(),
        TypeDescriptor::class("ParamMap").extends("HashMap").default_constructor(),
        TypeDescriptor::interface("Cursor"),
        TypeDescriptor::class("RowBounds").default_constructor(),
        TypeDescriptor::interface("ResultHandler"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_registered() {
        let catalog = TypeCatalog::new();
        assert!(catalog.contains("Object"));
        assert!(catalog.contains("RowBounds"));
        assert!(catalog.contains("ResultHandler"));
        assert!(catalog.require("demo.Missing").is_err());
    }

    #[test]
    fn test_duplicate_registration() {
        let catalog = TypeCatalog::new();
        catalog.register(TypeDescriptor::class("demo.Blog")).unwrap();
        let err = catalog.register(TypeDescriptor::class("demo.Blog")).unwrap_err();
        assert_eq!(err, ReflectionError::DuplicateType("demo.Blog".into()));
    }

    #[test]
    fn test_assignability() {
        let catalog = TypeCatalog::new();
        let number = TypeRef::named("Number");
        let integer = TypeRef::named("Integer");

        assert!(catalog.is_assignable(&number, &integer));
        assert!(!catalog.is_assignable(&integer, &number));
        assert!(catalog.is_assignable(&TypeRef::object(), &integer));
        assert!(!catalog.is_assignable(&TypeRef::int(), &integer));
        assert!(catalog.is_assignable(
            &TypeRef::named("Collection"),
            &TypeRef::generic("ArrayList", vec![TypeRef::string()])
        ));
        assert!(catalog.is_assignable(&number.clone().array_of(), &integer.array_of()));
        assert!(!catalog.is_assignable(
            &TypeRef::int().array_of(),
            &TypeRef::named("Integer").array_of()
        ));
    }

    #[test]
    fn test_collection_and_map_detection() {
        let catalog = TypeCatalog::new();
        assert!(catalog.is_collection(&TypeRef::named("HashSet")));
        assert!(catalog.is_collection(&TypeRef::generic("List", vec![TypeRef::string()])));
        assert!(!catalog.is_collection(&TypeRef::named("HashMap")));
        assert!(catalog.is_map(&TypeRef::named("ParamMap")));
    }
}
