//! Object instantiation

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::value::{ArrayValue, CollectionValue, ObjectValue, ParamMap, Value};

use super::descriptor::{TypeDescriptor, TypeRef};
use super::factory::ReflectorFactory;
use super::ReflectionError;

/// Creates instances of described types
///
/// Implement this to control how result objects and declared collection
/// return types are instantiated.
pub trait ObjectFactory: Send + Sync {
    /// Create an instance through its default constructor
    fn create(&self, ty: &TypeRef) -> Result<Value, ReflectionError>;

    /// Create an instance through the constructor whose parameters accept
    /// the given argument types
    fn create_with_args(
        &self,
        ty: &TypeRef,
        args: Vec<(TypeRef, Value)>,
    ) -> Result<Value, ReflectionError>;

    /// Check whether instances of the type hold elements
    fn is_collection(&self, ty: &TypeRef) -> bool;
}

/// Default factory backed by the type catalog
///
/// Collection and map interfaces resolve to concrete defaults:
/// `List`/`Collection` → list, `Set` → `HashSet`, `Map` → map.
pub struct DefaultObjectFactory {
    reflector: Arc<ReflectorFactory>,
}

impl DefaultObjectFactory {
    /// Create a factory over a reflector
    pub fn new(reflector: Arc<ReflectorFactory>) -> Self {
        Self { reflector }
    }

    fn instantiate(&self, desc: &TypeDescriptor) -> ObjectValue {
        let mut fields = BTreeMap::new();
        let mut current = Some(Arc::new(desc.clone()));
        while let Some(class) = current {
            for field in class.fields() {
                if field.is_static {
                    continue;
                }
                let initial = match &field.ty {
                    TypeRef::Primitive(p) => p.default_value(),
                    _ => Value::Null,
                };
                fields.entry(field.name.clone()).or_insert(initial);
            }
            current = class
                .supertype()
                .and_then(|name| self.reflector.catalog().get(name));
        }
        ObjectValue {
            type_name: desc.name().to_string(),
            fields,
        }
    }

    fn class_descriptor(&self, name: &str) -> Result<Arc<TypeDescriptor>, ReflectionError> {
        let desc = self.reflector.catalog().require(name)?;
        if desc.is_interface() {
            return Err(instantiation(name, "cannot create an instance of an interface"));
        }
        Ok(desc)
    }
}

impl ObjectFactory for DefaultObjectFactory {
    fn create(&self, ty: &TypeRef) -> Result<Value, ReflectionError> {
        let name = match ty.erasure() {
            TypeRef::Array(component) => {
                return Ok(Value::Array(ArrayValue {
                    element: component.to_string(),
                    items: Vec::new(),
                }));
            }
            TypeRef::Named(name) => name,
            other => return Err(instantiation(&other.to_string(), "not an object type")),
        };

        match name.as_str() {
            "List" | "Collection" | "ArrayList" | "LinkedList" => return Ok(Value::List(Vec::new())),
            "Set" => return Ok(Value::Collection(CollectionValue::new("HashSet", true))),
            "Map" | "HashMap" => return Ok(Value::Map(BTreeMap::new())),
            "ParamMap" => return Ok(Value::Params(ParamMap::new())),
            _ => {}
        }

        let desc = self.class_descriptor(&name)?;
        if !self.reflector.metadata_for(&name)?.has_default_constructor() {
            return Err(instantiation(&name, "no accessible default constructor"));
        }
        if self.is_collection(ty) {
            let unique = self.reflector.catalog().is_subtype(&name, "Set");
            return Ok(Value::Collection(CollectionValue::new(name, unique)));
        }
        Ok(Value::Object(self.instantiate(&desc)))
    }

    fn create_with_args(
        &self,
        ty: &TypeRef,
        args: Vec<(TypeRef, Value)>,
    ) -> Result<Value, ReflectionError> {
        if args.is_empty() {
            return self.create(ty);
        }
        let name = ty
            .raw_name()
            .ok_or_else(|| instantiation(&ty.to_string(), "not an object type"))?
            .to_string();
        let desc = self.class_descriptor(&name)?;
        let catalog = self.reflector.catalog();

        let ctor = desc
            .constructors()
            .iter()
            .filter(|c| c.accessible && c.params.len() == args.len())
            .find(|c| {
                c.params.iter().zip(&args).all(|(param, (arg_type, _))| {
                    param.ty.erasure() == arg_type.erasure()
                        || catalog.is_assignable(&param.ty.boxed(), &arg_type.boxed())
                })
            })
            .ok_or_else(|| {
                let types: Vec<String> = args.iter().map(|(t, _)| t.to_string()).collect();
                instantiation(
                    &name,
                    &format!("no constructor matching [{}]", types.join(", ")),
                )
            })?;

        let mut object = self.instantiate(&desc);
        for (param, (_, value)) in ctor.params.iter().zip(args) {
            if let Some(slot) = &param.name {
                object.fields.insert(slot.clone(), value);
            }
        }
        Ok(Value::Object(object))
    }

    fn is_collection(&self, ty: &TypeRef) -> bool {
        ty.is_array() || self.reflector.catalog().is_collection(ty)
    }
}

fn instantiation(type_name: &str, reason: &str) -> ReflectionError {
    ReflectionError::Instantiation {
        type_name: type_name.to_string(),
        reason: reason.to_string(),
    }
}
