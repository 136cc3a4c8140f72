//! Type alias registry

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::reflect::{Primitive, TypeCatalog, TypeRef};

/// Errors raised by alias registration and resolution
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AliasError {
    /// Alias already bound to a different type
    #[error("The alias '{alias}' is already mapped to the value '{existing}'.")]
    Conflict {
        /// Alias being registered
        alias: String,
        /// Type it is already bound to
        existing: String,
    },

    /// Neither an alias nor a registered type
    #[error("Could not resolve type alias '{0}'")]
    Unresolved(String),
}

static BUILTIN_ALIASES: Lazy<Vec<(String, TypeRef)>> = Lazy::new(|| {
    let boxed = [
        ("string", "String"),
        ("byte", "Byte"),
        ("long", "Long"),
        ("short", "Short"),
        ("int", "Integer"),
        ("integer", "Integer"),
        ("double", "Double"),
        ("float", "Float"),
        ("boolean", "Boolean"),
        ("date", "Date"),
        ("decimal", "BigDecimal"),
        ("bigdecimal", "BigDecimal"),
        ("object", "Object"),
    ];
    let primitives = [
        ("_byte", Primitive::Byte),
        ("_long", Primitive::Long),
        ("_short", Primitive::Short),
        ("_int", Primitive::Int),
        ("_integer", Primitive::Int),
        ("_double", Primitive::Double),
        ("_float", Primitive::Float),
        ("_boolean", Primitive::Boolean),
    ];
    let collections = [
        ("map", "Map"),
        ("hashmap", "HashMap"),
        ("list", "List"),
        ("arraylist", "ArrayList"),
        ("collection", "Collection"),
        ("cursor", "Cursor"),
        ("rowbounds", "RowBounds"),
        ("resulthandler", "ResultHandler"),
    ];

    let mut aliases = Vec::new();
    for (alias, name) in boxed {
        aliases.push((alias.to_string(), TypeRef::named(name)));
        aliases.push((format!("{}[]", alias), TypeRef::named(name).array_of()));
    }
    for (alias, primitive) in primitives {
        aliases.push((alias.to_string(), TypeRef::Primitive(primitive)));
        aliases.push((format!("{}[]", alias), TypeRef::Primitive(primitive).array_of()));
    }
    for (alias, name) in collections {
        aliases.push((alias.to_string(), TypeRef::named(name)));
    }
    aliases
});

/// Case-insensitive alias → type table
#[derive(Debug, Clone)]
pub struct TypeAliasRegistry {
    aliases: FxHashMap<String, TypeRef>,
}

impl TypeAliasRegistry {
    /// Create a registry holding the built-in aliases
    pub fn new() -> Self {
        Self {
            aliases: BUILTIN_ALIASES.iter().cloned().collect(),
        }
    }

    /// Bind an alias; rebinding to the same type is allowed
    pub fn register(&mut self, alias: &str, ty: TypeRef) -> Result<(), AliasError> {
        let key = alias.to_lowercase();
        if let Some(existing) = self.aliases.get(&key) {
            if *existing != ty {
                return Err(AliasError::Conflict {
                    alias: alias.to_string(),
                    existing: existing.to_string(),
                });
            }
        }
        self.aliases.insert(key, ty);
        Ok(())
    }

    /// Resolve a written type name: alias first, then the catalog
    pub fn resolve(&self, name: &str, catalog: &TypeCatalog) -> Result<TypeRef, AliasError> {
        let name = name.trim();
        if let Some(ty) = self.aliases.get(&name.to_lowercase()) {
            return Ok(ty.clone());
        }
        if let Some(component) = name.strip_suffix("[]") {
            return Ok(self.resolve(component, catalog)?.array_of());
        }
        let parsed = TypeRef::parse(name, &[]);
        match &parsed {
            TypeRef::Primitive(_) => Ok(parsed),
            TypeRef::Named(raw) | TypeRef::Generic { raw, .. } if catalog.contains(raw) => Ok(parsed),
            TypeRef::Generic { raw, args } if self.aliases.contains_key(&raw.to_lowercase()) => {
                let raw = self.resolve(raw, catalog)?;
                Ok(TypeRef::generic(raw.to_string(), args.clone()))
            }
            _ => Err(AliasError::Unresolved(name.to_string())),
        }
    }

    /// Check whether an alias is bound
    pub fn contains(&self, alias: &str) -> bool {
        self.aliases.contains_key(&alias.to_lowercase())
    }

    /// Number of bound aliases
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Check whether no aliases are bound
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

impl Default for TypeAliasRegistry {
    fn default() -> Self {
        Self::new()
    }
}
