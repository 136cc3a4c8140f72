//! Property-path access on values

use crate::value::Value;

use super::factory::ReflectorFactory;
use super::object_factory::ObjectFactory;
use super::property::PropertyTokenizer;
use super::ReflectionError;

/// Reads and writes dotted property paths on objects, maps, and parameter
/// bags through the reflector's invokers
pub struct MetaObject<'a> {
    reflector: &'a ReflectorFactory,
    objects: &'a dyn ObjectFactory,
}

impl<'a> MetaObject<'a> {
    /// Create an accessor over the given reflector and object factory
    pub fn new(reflector: &'a ReflectorFactory, objects: &'a dyn ObjectFactory) -> Self {
        Self { reflector, objects }
    }

    /// Read the value at `path`; a null intermediate yields null
    pub fn get_value(&self, target: &Value, path: &str) -> Result<Value, ReflectionError> {
        let tok = PropertyTokenizer::new(path);
        let mut current = self.read_property(target, tok.name(), path)?;
        if let Some(index) = tok.index() {
            current = index_into(&current, index, path)?;
        }
        match tok.children() {
            Some(_) if current.is_null() => Ok(Value::Null),
            Some(rest) => self.get_value(&current, rest),
            None => Ok(current),
        }
    }

    /// Write `value` at `path`, instantiating null intermediates from their
    /// declared setter types
    pub fn set_value(&self, target: &mut Value, path: &str, value: Value) -> Result<(), ReflectionError> {
        let tok = PropertyTokenizer::new(path);
        if tok.index().is_some() {
            return Err(ReflectionError::InvalidPath {
                path: path.to_string(),
                reason: "indexed segments cannot be written".to_string(),
            });
        }
        match tok.children() {
            None => self.write_property(target, tok.name(), value, path),
            Some(rest) => {
                let mut child = self.read_property(target, tok.name(), path)?;
                if child.is_null() {
                    child = self.instantiate_property(target, tok.name())?;
                }
                self.set_value(&mut child, rest, value)?;
                self.write_property(target, tok.name(), child, path)
            }
        }
    }

    fn read_property(&self, target: &Value, name: &str, path: &str) -> Result<Value, ReflectionError> {
        match target {
            Value::Object(object) => self
                .reflector
                .metadata_for(&object.type_name)?
                .get_invoker(name)?
                .get(object),
            Value::Map(map) => Ok(map.get(name).cloned().unwrap_or_default()),
            Value::Params(params) => params.get(name).cloned(),
            other => Err(no_properties(other, path)),
        }
    }

    fn write_property(
        &self,
        target: &mut Value,
        name: &str,
        value: Value,
        path: &str,
    ) -> Result<(), ReflectionError> {
        match target {
            Value::Object(object) => {
                let metadata = self.reflector.metadata_for(&object.type_name)?;
                metadata.set_invoker(name)?.set(object, value)
            }
            Value::Map(map) => {
                map.insert(name.to_string(), value);
                Ok(())
            }
            Value::Params(params) => {
                params.insert(name, value);
                Ok(())
            }
            other => Err(no_properties(other, path)),
        }
    }

    fn instantiate_property(&self, target: &Value, name: &str) -> Result<Value, ReflectionError> {
        match target {
            Value::Object(object) => {
                let metadata = self.reflector.metadata_for(&object.type_name)?;
                self.objects.create(metadata.setter_type(name)?)
            }
            _ => Ok(Value::Map(Default::default())),
        }
    }
}

fn index_into(base: &Value, index: &str, path: &str) -> Result<Value, ReflectionError> {
    match base {
        Value::Null => Ok(Value::Null),
        Value::Map(map) => Ok(map.get(index).cloned().unwrap_or_default()),
        Value::Params(params) => params.get(index).cloned(),
        other => {
            let items = other.elements().ok_or_else(|| no_properties(other, path))?;
            let position: usize = index.parse().map_err(|_| ReflectionError::InvalidPath {
                path: path.to_string(),
                reason: format!("'{}' is not a list index", index),
            })?;
            items
                .get(position)
                .cloned()
                .ok_or_else(|| ReflectionError::InvalidPath {
                    path: path.to_string(),
                    reason: format!("index {} out of bounds for length {}", position, items.len()),
                })
        }
    }
}

fn no_properties(value: &Value, path: &str) -> ReflectionError {
    ReflectionError::InvalidPath {
        path: path.to_string(),
        reason: format!("a {} value has no properties", value.type_name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{DefaultObjectFactory, TypeCatalog, TypeDescriptor, TypeRef};
    use crate::value::{ObjectValue, ParamMap};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn setup() -> (Arc<ReflectorFactory>, DefaultObjectFactory) {
        let catalog = TypeCatalog::new();
        catalog
            .register(
                TypeDescriptor::class("demo.Author")
                    .default_constructor()
                    .property("name", TypeRef::string()),
            )
            .unwrap();
        catalog
            .register(
                TypeDescriptor::class("demo.Blog")
                    .default_constructor()
                    .property("title", TypeRef::string())
                    .property("author", TypeRef::named("demo.Author")),
            )
            .unwrap();
        let reflector = Arc::new(ReflectorFactory::new(Arc::new(catalog)));
        let objects = DefaultObjectFactory::new(reflector.clone());
        (reflector, objects)
    }

    #[test]
    fn test_nested_write_instantiates_intermediate() {
        let (reflector, objects) = setup();
        let meta = MetaObject::new(&reflector, &objects);
        let mut blog = Value::Object(ObjectValue::new("demo.Blog"));

        meta.set_value(&mut blog, "author.name", Value::str("Ann")).unwrap();
        assert_eq!(meta.get_value(&blog, "author.name").unwrap(), Value::str("Ann"));
        assert_eq!(meta.get_value(&blog, "title").unwrap(), Value::Null);
    }

    #[test]
    fn test_null_intermediate_reads_null() {
        let (reflector, objects) = setup();
        let meta = MetaObject::new(&reflector, &objects);
        let blog = Value::Object(ObjectValue::new("demo.Blog"));
        assert_eq!(meta.get_value(&blog, "author.name").unwrap(), Value::Null);
        assert!(meta.get_value(&blog, "missing").is_err());
    }

    #[test]
    fn test_maps_params_and_indexes() {
        let (reflector, objects) = setup();
        let meta = MetaObject::new(&reflector, &objects);

        let mut row = BTreeMap::new();
        row.insert("ids".to_string(), Value::List(vec![Value::Int(4), Value::Int(9)]));
        let row = Value::Map(row);
        assert_eq!(meta.get_value(&row, "ids[1]").unwrap(), Value::Int(9));
        assert!(meta.get_value(&row, "ids[5]").is_err());

        let mut params = ParamMap::new();
        params.insert("blog", Value::Object(ObjectValue::new("demo.Blog").with_field("title", Value::str("T"))));
        let params = Value::Params(params);
        assert_eq!(meta.get_value(&params, "blog.title").unwrap(), Value::str("T"));
        assert!(meta.get_value(&params, "author").is_err());
    }

    #[test]
    fn test_indexed_write_rejected() {
        let (reflector, objects) = setup();
        let meta = MetaObject::new(&reflector, &objects);
        let mut row = Value::Map(BTreeMap::new());
        assert!(meta.set_value(&mut row, "ids[0]", Value::Int(1)).is_err());
    }
}
