//! Property invokers
//!
//! Every readable or writable property is reached through an [`Invoker`]:
//! either an accessor method's body or a direct field slot.

use std::sync::Arc;

use crate::value::{ObjectValue, Value};

use super::descriptor::{MethodBody, MethodDecl};
use super::ReflectionError;

/// Accessor-backed or field-backed property access
#[derive(Debug, Clone)]
pub enum Invoker {
    /// Through an accessor method
    Accessor(Arc<MethodDecl>),
    /// Directly on a field slot
    Field(String),
}

impl Invoker {
    /// Read the property from an instance
    pub fn get(&self, target: &ObjectValue) -> Result<Value, ReflectionError> {
        match self {
            Invoker::Field(name) => Ok(target.field(name).cloned().unwrap_or_default()),
            Invoker::Accessor(method) => match &method.body {
                Some(MethodBody::ReadField(field)) => {
                    Ok(target.field(field).cloned().unwrap_or_default())
                }
                Some(MethodBody::Compute(compute)) => compute(target),
                _ => Err(not_invocable(method, target, "getter")),
            },
        }
    }

    /// Write the property on an instance
    pub fn set(&self, target: &mut ObjectValue, value: Value) -> Result<(), ReflectionError> {
        match self {
            Invoker::Field(name) => {
                target.fields.insert(name.clone(), value);
                Ok(())
            }
            Invoker::Accessor(method) => match &method.body {
                Some(MethodBody::WriteField(field)) => {
                    target.fields.insert(field.clone(), value);
                    Ok(())
                }
                Some(MethodBody::Update(update)) => update(target, value),
                _ => Err(not_invocable(method, target, "setter")),
            },
        }
    }

    /// Check for a field-backed invoker
    pub fn is_field(&self) -> bool {
        matches!(self, Invoker::Field(_))
    }
}

fn not_invocable(method: &MethodDecl, target: &ObjectValue, role: &'static str) -> ReflectionError {
    ReflectionError::NotInvocable {
        method: method.name.clone(),
        type_name: target.type_name.clone(),
        role,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::TypeRef;

    #[test]
    fn test_field_invoker() {
        let mut blog = ObjectValue::new("demo.Blog");
        let invoker = Invoker::Field("title".into());
        invoker.set(&mut blog, Value::str("Rust")).unwrap();
        assert_eq!(invoker.get(&blog).unwrap(), Value::str("Rust"));
        assert!(invoker.is_field());
    }

    #[test]
    fn test_accessor_invokers() {
        let mut blog = ObjectValue::new("demo.Blog");
        let getter = Invoker::Accessor(Arc::new(MethodDecl::getter("getTitle", TypeRef::string(), "title")));
        let setter = Invoker::Accessor(Arc::new(MethodDecl::setter("setTitle", TypeRef::string(), "title")));

        setter.set(&mut blog, Value::str("Rust")).unwrap();
        assert_eq!(getter.get(&blog).unwrap(), Value::str("Rust"));
        assert!(getter.set(&mut blog, Value::Null).is_err());
    }

    #[test]
    fn test_computed_getter() {
        let compute: crate::reflect::ComputeFn = Arc::new(|obj: &ObjectValue| {
            let title = obj.field("title").cloned().unwrap_or_default();
            Ok(Value::str(format!("<{}>", title)))
        });
        let method = MethodDecl::new("getLabel", TypeRef::string()).with_body(MethodBody::Compute(compute));
        let blog = ObjectValue::new("demo.Blog").with_field("title", Value::str("Rust"));
        assert_eq!(
            Invoker::Accessor(Arc::new(method)).get(&blog).unwrap(),
            Value::str("<Rust>")
        );
    }
}
