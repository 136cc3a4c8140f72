//! Property-path resolution against types
//!
//! Used when a mapping omits an explicit type: the type is inferred from the
//! owning shape's property of the same name. Anything that cannot be
//! determined resolves to the root object type rather than failing.

use std::sync::Arc;

use super::descriptor::TypeRef;
use super::factory::ReflectorFactory;
use super::property::PropertyTokenizer;
use super::reflector::TypeMetadata;
use super::ReflectionError;

/// Type-level view for resolving dotted property paths
pub struct MetaClass<'a> {
    factory: &'a ReflectorFactory,
    metadata: Option<Arc<TypeMetadata>>,
}

impl<'a> MetaClass<'a> {
    /// View over a type; unregistered and non-class types have no properties
    pub fn for_type(factory: &'a ReflectorFactory, ty: &TypeRef) -> Result<Self, ReflectionError> {
        let metadata = match ty.erasure() {
            TypeRef::Named(name) if factory.catalog().contains(&name) => {
                Some(factory.metadata_for(&name)?)
            }
            _ => None,
        };
        Ok(Self { factory, metadata })
    }

    /// Underlying capability table, if the type is a registered class
    pub fn metadata(&self) -> Option<&Arc<TypeMetadata>> {
        self.metadata.as_ref()
    }

    /// Declared read type at the end of `path`
    pub fn getter_type(&self, path: &str) -> Result<TypeRef, ReflectionError> {
        let tok = PropertyTokenizer::new(path);
        let Some(ty) = self.segment_type(&tok, Direction::Get) else {
            return Ok(TypeRef::object());
        };
        match tok.children() {
            Some(rest) => MetaClass::for_type(self.factory, &ty)?.getter_type(rest),
            None => Ok(ty),
        }
    }

    /// Declared write type at the end of `path`
    pub fn setter_type(&self, path: &str) -> Result<TypeRef, ReflectionError> {
        let tok = PropertyTokenizer::new(path);
        match tok.children() {
            Some(rest) => {
                let Some(ty) = self.segment_type(&tok, Direction::Get) else {
                    return Ok(TypeRef::object());
                };
                MetaClass::for_type(self.factory, &ty)?.setter_type(rest)
            }
            None => Ok(self
                .segment_type(&tok, Direction::Set)
                .unwrap_or_else(TypeRef::object)),
        }
    }

    /// Check whether every segment of `path` is readable
    pub fn has_getter(&self, path: &str) -> Result<bool, ReflectionError> {
        self.has(path, Direction::Get)
    }

    /// Check whether `path` can be written
    pub fn has_setter(&self, path: &str) -> Result<bool, ReflectionError> {
        self.has(path, Direction::Set)
    }

    /// Declared spelling of a column-like name, ignoring case and optionally
    /// underscores
    pub fn find_property(&self, name: &str, ignore_underscores: bool) -> Option<String> {
        let metadata = self.metadata.as_ref()?;
        let candidate = if ignore_underscores {
            name.replace('_', "")
        } else {
            name.to_string()
        };
        metadata.find_property_name(&candidate).map(str::to_string)
    }

    fn has(&self, path: &str, leaf: Direction) -> Result<bool, ReflectionError> {
        let tok = PropertyTokenizer::new(path);
        let Some(metadata) = &self.metadata else {
            return Ok(false);
        };
        match tok.children() {
            Some(rest) => {
                if !metadata.has_getter(tok.name()) {
                    return Ok(false);
                }
                let ty = metadata.getter_type(tok.name())?.clone();
                MetaClass::for_type(self.factory, &ty)?.has(rest, leaf)
            }
            None => Ok(match leaf {
                Direction::Get => metadata.has_getter(tok.name()),
                Direction::Set => metadata.has_setter(tok.name()),
            }),
        }
    }

    fn segment_type(&self, tok: &PropertyTokenizer, direction: Direction) -> Option<TypeRef> {
        let metadata = self.metadata.as_ref()?;
        let ty = match direction {
            Direction::Get => metadata.getter_type(tok.name()).ok()?,
            Direction::Set => metadata.setter_type(tok.name()).ok()?,
        };
        if tok.index().is_some() {
            // element types are erased
            return Some(match ty {
                TypeRef::Array(component) => *component.clone(),
                _ => TypeRef::object(),
            });
        }
        Some(ty.clone())
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Get,
    Set,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{TypeCatalog, TypeDescriptor};

    fn factory() -> ReflectorFactory {
        let catalog = TypeCatalog::new();
        catalog
            .register(
                TypeDescriptor::class("demo.Author")
                    .property("id", TypeRef::int())
                    .property("name", TypeRef::string()),
            )
            .unwrap();
        catalog
            .register(
                TypeDescriptor::class("demo.Blog")
                    .property("author", TypeRef::named("demo.Author"))
                    .property("tags", TypeRef::string().array_of())
                    .property("posts", TypeRef::generic("List", vec![TypeRef::named("demo.Post")])),
            )
            .unwrap();
        ReflectorFactory::new(Arc::new(catalog))
    }

    #[test]
    fn test_nested_paths() {
        let factory = factory();
        let blog = MetaClass::for_type(&factory, &TypeRef::named("demo.Blog")).unwrap();
        assert_eq!(blog.getter_type("author.name").unwrap(), TypeRef::string());
        assert_eq!(blog.setter_type("author.id").unwrap(), TypeRef::int());
        assert!(blog.has_getter("author.name").unwrap());
        assert!(!blog.has_setter("author.email").unwrap());
    }

    #[test]
    fn test_missing_defaults_to_object() {
        let factory = factory();
        let blog = MetaClass::for_type(&factory, &TypeRef::named("demo.Blog")).unwrap();
        assert_eq!(blog.getter_type("missing").unwrap(), TypeRef::object());
        assert_eq!(blog.setter_type("author.missing").unwrap(), TypeRef::object());

        let map = MetaClass::for_type(&factory, &TypeRef::named("demo.Unregistered")).unwrap();
        assert_eq!(map.setter_type("anything").unwrap(), TypeRef::object());
    }

    #[test]
    fn test_indexed_segments() {
        let factory = factory();
        let blog = MetaClass::for_type(&factory, &TypeRef::named("demo.Blog")).unwrap();
        assert_eq!(blog.getter_type("tags[0]").unwrap(), TypeRef::string());
        assert_eq!(blog.getter_type("posts[0]").unwrap(), TypeRef::object());
        assert_eq!(blog.getter_type("posts").unwrap(), TypeRef::named("List"));
    }

    #[test]
    fn test_find_property() {
        let factory = factory();
        let author = MetaClass::for_type(&factory, &TypeRef::named("demo.Author")).unwrap();
        assert_eq!(author.find_property("NAME", false).as_deref(), Some("name"));
        assert_eq!(author.find_property("i_d", true).as_deref(), Some("id"));
        assert_eq!(author.find_property("i_d", false), None);
    }
}
