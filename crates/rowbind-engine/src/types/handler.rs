//! Type handler registry

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::reflect::TypeRef;

use super::JdbcType;

/// Opaque reference to a coercion strategy
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeHandlerRef(Arc<str>);

impl TypeHandlerRef {
    /// Handler reference by name
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    /// Handler name
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeHandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lookup of (value type, column type) → handler
#[derive(Debug, Clone)]
pub struct TypeHandlerRegistry {
    by_type: FxHashMap<String, Vec<(Option<JdbcType>, TypeHandlerRef)>>,
    unknown: TypeHandlerRef,
}

impl TypeHandlerRegistry {
    /// Create a registry with handlers for the built-in value types
    pub fn new() -> Self {
        let mut registry = Self {
            by_type: FxHashMap::default(),
            unknown: TypeHandlerRef::new("UnknownTypeHandler"),
        };
        for (ty, handler) in [
            ("Boolean", "BooleanTypeHandler"),
            ("Byte", "ByteTypeHandler"),
            ("Short", "ShortTypeHandler"),
            ("Integer", "IntegerTypeHandler"),
            ("Long", "LongTypeHandler"),
            ("Float", "FloatTypeHandler"),
            ("Double", "DoubleTypeHandler"),
            ("BigDecimal", "BigDecimalTypeHandler"),
            ("String", "StringTypeHandler"),
            ("Date", "DateTypeHandler"),
            ("Object", "ObjectTypeHandler"),
        ] {
            registry.register(ty, None, TypeHandlerRef::new(handler));
        }
        registry.register("String", Some(JdbcType::Clob), TypeHandlerRef::new("ClobTypeHandler"));
        registry.register("Date", Some(JdbcType::Date), TypeHandlerRef::new("DateOnlyTypeHandler"));
        registry
    }

    /// Register a handler for a type, optionally specific to a column type
    pub fn register(&mut self, type_name: &str, jdbc_type: Option<JdbcType>, handler: TypeHandlerRef) {
        let entries = self.by_type.entry(type_name.to_string()).or_default();
        entries.retain(|(jdbc, _)| *jdbc != jdbc_type);
        entries.push((jdbc_type, handler));
    }

    /// Handler for a value type and optional column type
    ///
    /// Primitives share their boxed type's handlers. A column-specific
    /// handler wins over the type's general one; types without handlers get
    /// the catch-all unknown handler.
    pub fn handler_for(&self, ty: &TypeRef, jdbc_type: Option<JdbcType>) -> TypeHandlerRef {
        let key = ty.boxed().erasure().to_string();
        let Some(entries) = self.by_type.get(&key) else {
            return self.unknown.clone();
        };
        entries
            .iter()
            .find(|(jdbc, _)| jdbc_type.is_some() && *jdbc == jdbc_type)
            .or_else(|| entries.iter().find(|(jdbc, _)| jdbc.is_none()))
            .map(|(_, handler)| handler.clone())
            .unwrap_or_else(|| self.unknown.clone())
    }

    /// Check whether a type has a dedicated handler
    pub fn has_handler(&self, ty: &TypeRef) -> bool {
        self.by_type.contains_key(&ty.boxed().erasure().to_string())
    }
}

impl Default for TypeHandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let registry = TypeHandlerRegistry::new();
        assert_eq!(registry.handler_for(&TypeRef::int(), None).name(), "IntegerTypeHandler");
        assert_eq!(
            registry.handler_for(&TypeRef::string(), Some(JdbcType::Clob)).name(),
            "ClobTypeHandler"
        );
        assert_eq!(
            registry.handler_for(&TypeRef::string(), Some(JdbcType::Varchar)).name(),
            "StringTypeHandler"
        );
        assert_eq!(
            registry.handler_for(&TypeRef::named("demo.Blog"), None).name(),
            "UnknownTypeHandler"
        );
        assert!(!registry.has_handler(&TypeRef::named("demo.Blog")));
    }

    #[test]
    fn test_register_override() {
        let mut registry = TypeHandlerRegistry::new();
        registry.register("demo.Money", None, TypeHandlerRef::new("MoneyHandler"));
        registry.register("demo.Money", None, TypeHandlerRef::new("CentsHandler"));
        assert_eq!(
            registry.handler_for(&TypeRef::named("demo.Money"), None).name(),
            "CentsHandler"
        );
    }
}
