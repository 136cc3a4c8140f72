//! Integration tests for type metadata and property paths

use std::sync::Arc;

use rowbind_engine::reflect::{MethodDecl, ReflectionError};
use rowbind_engine::{Configuration, ObjectValue, TypeDescriptor, TypeRef, Value};

fn config() -> Configuration {
    let config = Configuration::default();
    let catalog = config.catalog();
    catalog
        .register(
            TypeDescriptor::class("demo.Measure")
                .default_constructor()
                .method(MethodDecl::getter("getValue", TypeRef::named("Number"), "value")),
        )
        .unwrap();
    catalog
        .register(
            TypeDescriptor::class("demo.Count")
                .extends("demo.Measure")
                .default_constructor()
                .method(MethodDecl::getter("getValue", TypeRef::named("Integer"), "value")),
        )
        .unwrap();
    catalog
        .register(
            TypeDescriptor::class("demo.Broken")
                .default_constructor()
                .method(MethodDecl::setter("setValue", TypeRef::string(), "value"))
                .method(MethodDecl::setter("setValue", TypeRef::named("demo.Count"), "value")),
        )
        .unwrap();
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
                .property("author", TypeRef::named("demo.Author"))
                .property("tags", TypeRef::generic("List", vec![TypeRef::string()])),
        )
        .unwrap();
    config
}

#[test]
fn test_covariant_getter_resolves_to_subtype() {
    let config = config();
    let meta = config.meta_class(&TypeRef::named("demo.Count")).unwrap();
    assert_eq!(meta.getter_type("value").unwrap(), TypeRef::named("Integer"));

    // repeated lookups come from the cache and agree
    let again = config.reflector().metadata_for("demo.Count").unwrap();
    assert_eq!(again.getter_type("value").unwrap(), &TypeRef::named("Integer"));
    assert!(Arc::ptr_eq(&again, &config.reflector().metadata_for("demo.Count").unwrap()));
}

#[test]
fn test_unrelated_setters_are_ambiguous() {
    let config = config();
    let err = config.reflector().metadata_for("demo.Broken").unwrap_err();
    match err {
        ReflectionError::AmbiguousSetter { property, type_name, .. } => {
            assert_eq!(property, "value");
            assert_eq!(type_name, "demo.Broken");
        }
        other => panic!("expected an ambiguous setter, got {:?}", other),
    }
}

#[test]
fn test_property_paths_through_objects() {
    let config = config();
    let meta = config.meta_class(&TypeRef::named("demo.Blog")).unwrap();
    assert_eq!(meta.getter_type("author.name").unwrap(), TypeRef::string());
    assert!(meta.has_setter("author.name").unwrap());
    assert!(!meta.has_getter("author.email").unwrap());

    let objects = config.meta_object();
    let mut blog = config.object_factory().create(&TypeRef::named("demo.Blog")).unwrap();
    objects.set_value(&mut blog, "author.name", Value::str("Ferris")).unwrap();
    assert_eq!(objects.get_value(&blog, "author.name").unwrap(), Value::str("Ferris"));

    let Value::Object(ObjectValue { fields, .. }) = &blog else {
        panic!("expected an object");
    };
    assert!(matches!(fields.get("author"), Some(Value::Object(_))));
}
