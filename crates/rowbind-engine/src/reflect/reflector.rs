//! Per-type capability tables
//!
//! [`TypeMetadata`] is computed once from a type's descriptor and its
//! ancestors. Construction walks, in order:
//! 1. declared constructors, recording the first accessible zero-argument one
//! 2. every method of the type, its superclasses, and all implemented
//!    interfaces (bridge methods excluded), picking out get-shaped and
//!    set-shaped accessors and resolving overloads between them
//! 3. plain fields not already covered by an accessor in that direction

use std::collections::BTreeMap;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use super::catalog::TypeCatalog;
use super::descriptor::{ConstructorDecl, MethodDecl, TypeDescriptor, TypeRef};
use super::invoker::Invoker;
use super::property::{is_getter, is_setter, is_valid_property_name, method_to_property};
use super::ReflectionError;

/// Readable/writable property table for one type
#[derive(Debug, Clone)]
pub struct TypeMetadata {
    type_name: String,
    default_constructor: Option<ConstructorDecl>,
    get_invokers: FxHashMap<String, Invoker>,
    set_invokers: FxHashMap<String, Invoker>,
    get_types: FxHashMap<String, TypeRef>,
    set_types: FxHashMap<String, TypeRef>,
    /// Uppercased property name → declared property name
    case_insensitive: FxHashMap<String, String>,
}

impl TypeMetadata {
    /// Compute the capability table of a registered type
    pub fn build(catalog: &TypeCatalog, type_name: &str) -> Result<Self, ReflectionError> {
        let desc = catalog.require(type_name)?;
        tracing::trace!(type_name, "computing reflector metadata");

        let mut meta = Self {
            type_name: type_name.to_string(),
            default_constructor: desc
                .constructors()
                .iter()
                .find(|c| c.params.is_empty() && c.accessible)
                .cloned(),
            get_invokers: FxHashMap::default(),
            set_invokers: FxHashMap::default(),
            get_types: FxHashMap::default(),
            set_types: FxHashMap::default(),
            case_insensitive: FxHashMap::default(),
        };

        let methods = collect_methods(catalog, &desc);
        meta.add_get_methods(catalog, &methods)?;
        meta.add_set_methods(catalog, &methods)?;
        meta.add_fields(catalog, &desc);

        for name in meta.get_invokers.keys().chain(meta.set_invokers.keys()) {
            meta.case_insensitive
                .insert(name.to_uppercase(), name.clone());
        }
        Ok(meta)
    }

    fn add_get_methods(
        &mut self,
        catalog: &TypeCatalog,
        methods: &[Arc<MethodDecl>],
    ) -> Result<(), ReflectionError> {
        let mut conflicting: BTreeMap<String, Vec<Arc<MethodDecl>>> = BTreeMap::new();
        for method in methods {
            if method.params.is_empty() && is_getter(&method.name) {
                conflicting
                    .entry(method_to_property(&method.name)?)
                    .or_default()
                    .push(method.clone());
            }
        }

        for (property, candidates) in conflicting {
            let mut winner: Option<Arc<MethodDecl>> = None;
            for candidate in candidates {
                let Some(current) = winner.clone() else {
                    winner = Some(candidate);
                    continue;
                };
                let winner_type = current.return_type.erasure();
                let candidate_type = candidate.return_type.erasure();
                if candidate_type == winner_type {
                    if !candidate_type.is_boolean() {
                        return Err(self.ambiguous_getter(&property, &current, &candidate));
                    }
                    if candidate.name.starts_with("is") {
                        winner = Some(candidate);
                    }
                } else if catalog.is_assignable(&candidate_type, &winner_type) {
                    // winner already returns the more specific type
                } else if catalog.is_assignable(&winner_type, &candidate_type) {
                    winner = Some(candidate);
                } else {
                    return Err(self.ambiguous_getter(&property, &current, &candidate));
                }
            }
            if let Some(winner) = winner {
                self.add_get_method(property, winner);
            }
        }
        Ok(())
    }

    fn add_get_method(&mut self, property: String, method: Arc<MethodDecl>) {
        if is_valid_property_name(&property) {
            self.get_types
                .insert(property.clone(), method.return_type.erasure());
            self.get_invokers.insert(property, Invoker::Accessor(method));
        }
    }

    fn add_set_methods(
        &mut self,
        catalog: &TypeCatalog,
        methods: &[Arc<MethodDecl>],
    ) -> Result<(), ReflectionError> {
        let mut conflicting: BTreeMap<String, Vec<Arc<MethodDecl>>> = BTreeMap::new();
        for method in methods {
            if method.params.len() == 1 && is_setter(&method.name) {
                conflicting
                    .entry(method_to_property(&method.name)?)
                    .or_default()
                    .push(method.clone());
            }
        }

        for (property, setters) in conflicting {
            let getter_type = self.get_types.get(&property).cloned();
            let mut matched: Option<Arc<MethodDecl>> = None;
            let mut ambiguity: Option<ReflectionError> = None;
            for setter in setters {
                let param_type = setter.params[0].ty.erasure();
                if getter_type.as_ref() == Some(&param_type) {
                    matched = Some(setter);
                    ambiguity = None;
                    break;
                }
                if ambiguity.is_none() {
                    match self.pick_better_setter(catalog, matched.take(), setter, &property) {
                        Ok(better) => matched = Some(better),
                        Err(err) => ambiguity = Some(err),
                    }
                }
            }
            if let Some(err) = ambiguity {
                return Err(err);
            }
            if let Some(setter) = matched {
                self.add_set_method(property, setter);
            }
        }
        Ok(())
    }

    fn pick_better_setter(
        &self,
        catalog: &TypeCatalog,
        current: Option<Arc<MethodDecl>>,
        candidate: Arc<MethodDecl>,
        property: &str,
    ) -> Result<Arc<MethodDecl>, ReflectionError> {
        let Some(current) = current else {
            return Ok(candidate);
        };
        let current_type = current.params[0].ty.erasure();
        let candidate_type = candidate.params[0].ty.erasure();
        if catalog.is_assignable(&current_type, &candidate_type) {
            Ok(candidate)
        } else if catalog.is_assignable(&candidate_type, &current_type) {
            Ok(current)
        } else {
            Err(ReflectionError::AmbiguousSetter {
                property: property.to_string(),
                type_name: self.type_name.clone(),
                first: current_type.to_string(),
                second: candidate_type.to_string(),
            })
        }
    }

    fn add_set_method(&mut self, property: String, method: Arc<MethodDecl>) {
        if is_valid_property_name(&property) {
            self.set_types
                .insert(property.clone(), method.params[0].ty.erasure());
            self.set_invokers.insert(property, Invoker::Accessor(method));
        }
    }

    fn add_fields(&mut self, catalog: &TypeCatalog, desc: &TypeDescriptor) {
        for field in desc.fields() {
            if !is_valid_property_name(&field.name) {
                continue;
            }
            if !self.set_invokers.contains_key(&field.name) && !(field.is_static && field.is_final) {
                self.set_types.insert(field.name.clone(), field.ty.erasure());
                self.set_invokers
                    .insert(field.name.clone(), Invoker::Field(field.name.clone()));
            }
            if !self.get_invokers.contains_key(&field.name) {
                self.get_types.insert(field.name.clone(), field.ty.erasure());
                self.get_invokers
                    .insert(field.name.clone(), Invoker::Field(field.name.clone()));
            }
        }
        if let Some(parent) = desc.supertype().and_then(|name| catalog.get(name)) {
            self.add_fields(catalog, &parent);
        }
    }

    fn ambiguous_getter(&self, property: &str, first: &MethodDecl, second: &MethodDecl) -> ReflectionError {
        ReflectionError::AmbiguousGetter {
            property: property.to_string(),
            type_name: self.type_name.clone(),
            first: first.signature(),
            second: second.signature(),
        }
    }

    /// Name of the described type
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Check whether the type can be built without arguments
    pub fn has_default_constructor(&self) -> bool {
        self.default_constructor.is_some()
    }

    /// The first accessible zero-argument constructor
    pub fn default_constructor(&self) -> Option<&ConstructorDecl> {
        self.default_constructor.as_ref()
    }

    /// Readable property names in sorted order
    pub fn readable_properties(&self) -> Vec<&str> {
        sorted_keys(&self.get_invokers)
    }

    /// Writable property names in sorted order
    pub fn writable_properties(&self) -> Vec<&str> {
        sorted_keys(&self.set_invokers)
    }

    /// Check for a readable property
    pub fn has_getter(&self, property: &str) -> bool {
        self.get_invokers.contains_key(property)
    }

    /// Check for a writable property
    pub fn has_setter(&self, property: &str) -> bool {
        self.set_invokers.contains_key(property)
    }

    /// Invoker used to read a property
    pub fn get_invoker(&self, property: &str) -> Result<&Invoker, ReflectionError> {
        self.get_invokers
            .get(property)
            .ok_or_else(|| self.no_getter(property))
    }

    /// Invoker used to write a property
    pub fn set_invoker(&self, property: &str) -> Result<&Invoker, ReflectionError> {
        self.set_invokers
            .get(property)
            .ok_or_else(|| self.no_setter(property))
    }

    /// Declared read type of a property
    pub fn getter_type(&self, property: &str) -> Result<&TypeRef, ReflectionError> {
        self.get_types
            .get(property)
            .ok_or_else(|| self.no_getter(property))
    }

    /// Declared write type of a property
    pub fn setter_type(&self, property: &str) -> Result<&TypeRef, ReflectionError> {
        self.set_types
            .get(property)
            .ok_or_else(|| self.no_setter(property))
    }

    /// Declared spelling of a property, matched case-insensitively
    pub fn find_property_name(&self, name: &str) -> Option<&str> {
        self.case_insensitive
            .get(&name.to_uppercase())
            .map(String::as_str)
    }

    fn no_getter(&self, property: &str) -> ReflectionError {
        ReflectionError::NoGetter {
            property: property.to_string(),
            type_name: self.type_name.clone(),
        }
    }

    fn no_setter(&self, property: &str) -> ReflectionError {
        ReflectionError::NoSetter {
            property: property.to_string(),
            type_name: self.type_name.clone(),
        }
    }
}

fn sorted_keys<V>(map: &FxHashMap<String, V>) -> Vec<&str> {
    let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys
}

/// All methods visible on a type, most-derived declaration first, keyed by
/// signature so covariant overrides and overloads are kept apart
fn collect_methods(catalog: &TypeCatalog, desc: &Arc<TypeDescriptor>) -> Vec<Arc<MethodDecl>> {
    let mut seen_signatures = FxHashSet::default();
    let mut seen_interfaces = FxHashSet::default();
    let mut methods = Vec::new();

    let mut current = Some(desc.clone());
    while let Some(class) = current {
        add_unique_methods(&class, &mut seen_signatures, &mut methods);
        let mut pending: Vec<String> = class.interfaces().to_vec();
        while let Some(name) = pending.pop() {
            if !seen_interfaces.insert(name.clone()) {
                continue;
            }
            if let Some(interface) = catalog.get(&name) {
                add_unique_methods(&interface, &mut seen_signatures, &mut methods);
                pending.extend(interface.interfaces().iter().cloned());
            }
        }
        current = class.supertype().and_then(|name| catalog.get(name));
    }
    methods
}

fn add_unique_methods(
    desc: &TypeDescriptor,
    seen: &mut FxHashSet<String>,
    methods: &mut Vec<Arc<MethodDecl>>,
) {
    for method in desc.methods() {
        if method.bridge {
            continue;
        }
        if seen.insert(method.signature()) {
            methods.push(Arc::new(method.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{FieldDecl, TypeDescriptor};

    fn catalog_with(types: Vec<TypeDescriptor>) -> TypeCatalog {
        let catalog = TypeCatalog::new();
        for desc in types {
            catalog.register(desc).unwrap();
        }
        catalog
    }

    #[test]
    fn test_simple_bean() {
        let catalog = catalog_with(vec![TypeDescriptor::class("demo.Blog")
            .default_constructor()
            .property("id", TypeRef::int())
            .property("title", TypeRef::string())]);

        let meta = TypeMetadata::build(&catalog, "demo.Blog").unwrap();
        assert!(meta.has_default_constructor());
        assert_eq!(meta.readable_properties(), vec!["id", "title"]);
        assert_eq!(meta.writable_properties(), vec!["id", "title"]);
        assert_eq!(meta.getter_type("id").unwrap(), &TypeRef::int());
        assert!(!meta.get_invoker("title").unwrap().is_field());
    }

    #[test]
    fn test_covariant_getter_prefers_subtype() {
        let catalog = catalog_with(vec![
            TypeDescriptor::class("demo.Base")
                .method(MethodDecl::getter("getValue", TypeRef::named("Number"), "value")),
            TypeDescriptor::class("demo.Derived")
                .extends("demo.Base")
                .method(MethodDecl::getter("getValue", TypeRef::named("Integer"), "value")),
        ]);

        let meta = TypeMetadata::build(&catalog, "demo.Derived").unwrap();
        assert_eq!(meta.getter_type("value").unwrap(), &TypeRef::named("Integer"));
    }

    #[test]
    fn test_boolean_getter_prefers_is() {
        let catalog = catalog_with(vec![TypeDescriptor::class("demo.Flag")
            .method(MethodDecl::getter("getOpen", TypeRef::boolean(), "a"))
            .method(MethodDecl::getter("isOpen", TypeRef::boolean(), "b"))]);

        let meta = TypeMetadata::build(&catalog, "demo.Flag").unwrap();
        match meta.get_invoker("open").unwrap() {
            Invoker::Accessor(method) => assert_eq!(method.name, "isOpen"),
            other => panic!("unexpected invoker {:?}", other),
        }
    }

    #[test]
    fn test_same_type_getters_are_ambiguous() {
        let catalog = catalog_with(vec![TypeDescriptor::class("demo.Odd")
            .method(MethodDecl::getter("getName", TypeRef::string(), "a"))
            .method(MethodDecl::getter("isName", TypeRef::string(), "b"))]);

        let err = TypeMetadata::build(&catalog, "demo.Odd").unwrap_err();
        assert!(matches!(err, ReflectionError::AmbiguousGetter { ref property, .. } if property == "name"));
    }

    #[test]
    fn test_unrelated_setters_are_ambiguous() {
        let catalog = catalog_with(vec![TypeDescriptor::class("demo.Odd")
            .method(MethodDecl::setter("setValue", TypeRef::string(), "value"))
            .method(MethodDecl::setter("setValue", TypeRef::named("Integer"), "value"))]);

        let err = TypeMetadata::build(&catalog, "demo.Odd").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Ambiguous setters defined for property 'value' in class 'demo.Odd' with types 'String' and 'Integer'."
        );
    }

    #[test]
    fn test_setter_matching_getter_type_wins() {
        let catalog = catalog_with(vec![TypeDescriptor::class("demo.Odd")
            .method(MethodDecl::getter("getValue", TypeRef::named("Integer"), "value"))
            .method(MethodDecl::setter("setValue", TypeRef::string(), "value"))
            .method(MethodDecl::setter("setValue", TypeRef::named("Integer"), "value"))]);

        let meta = TypeMetadata::build(&catalog, "demo.Odd").unwrap();
        assert_eq!(meta.setter_type("value").unwrap(), &TypeRef::named("Integer"));
    }

    #[test]
    fn test_more_specific_setter_wins() {
        let catalog = catalog_with(vec![TypeDescriptor::class("demo.Box")
            .method(MethodDecl::setter("setValue", TypeRef::named("Number"), "value"))
            .method(MethodDecl::setter("setValue", TypeRef::named("Long"), "value"))]);

        let meta = TypeMetadata::build(&catalog, "demo.Box").unwrap();
        assert_eq!(meta.setter_type("value").unwrap(), &TypeRef::named("Long"));
    }

    #[test]
    fn test_fields_fill_gaps_and_respect_subclass() {
        let catalog = catalog_with(vec![
            TypeDescriptor::class("demo.Base")
                .field(FieldDecl::new("id", TypeRef::named("Long")))
                .field(FieldDecl::new("name", TypeRef::string())),
            TypeDescriptor::class("demo.Child")
                .extends("demo.Base")
                .field(FieldDecl::new("name", TypeRef::named("Object")))
                .field(FieldDecl::constant("VERSION", TypeRef::int()))
                .field(FieldDecl::new("serialVersionUID", TypeRef::named("Long")))
                .method(MethodDecl::getter("getId", TypeRef::named("Long"), "id")),
        ]);

        let meta = TypeMetadata::build(&catalog, "demo.Child").unwrap();
        assert!(!meta.get_invoker("id").unwrap().is_field());
        assert!(meta.set_invoker("id").unwrap().is_field());
        assert_eq!(meta.getter_type("name").unwrap(), &TypeRef::object());
        assert!(meta.has_getter("VERSION"));
        assert!(!meta.has_setter("VERSION"));
        assert!(!meta.has_getter("serialVersionUID"));
    }

    #[test]
    fn test_interface_methods_and_bridges() {
        let catalog = catalog_with(vec![
            TypeDescriptor::interface("demo.Named")
                .method(MethodDecl::new("getName", TypeRef::string())),
            TypeDescriptor::class("demo.Person")
                .implements("demo.Named")
                .method(MethodDecl::getter("getAge", TypeRef::int(), "age").bridge()),
        ]);

        let meta = TypeMetadata::build(&catalog, "demo.Person").unwrap();
        assert!(meta.has_getter("name"));
        assert!(!meta.has_getter("age"));
        assert!(!meta.has_default_constructor());
    }

    #[test]
    fn test_generic_property_is_erased() {
        let catalog = catalog_with(vec![TypeDescriptor::class("demo.Holder")
            .type_params(&["T"])
            .method(MethodDecl::getter("getItem", TypeRef::Variable("T".into()), "item"))
            .method(MethodDecl::getter(
                "getTags",
                TypeRef::generic("List", vec![TypeRef::string()]),
                "tags",
            ))]);

        let meta = TypeMetadata::build(&catalog, "demo.Holder").unwrap();
        assert_eq!(meta.getter_type("item").unwrap(), &TypeRef::object());
        assert_eq!(meta.getter_type("tags").unwrap(), &TypeRef::named("List"));
    }

    #[test]
    fn test_missing_property_and_case_insensitive_lookup() {
        let catalog = catalog_with(vec![TypeDescriptor::class("demo.Blog")
            .property("authorName", TypeRef::string())]);

        let meta = TypeMetadata::build(&catalog, "demo.Blog").unwrap();
        assert_eq!(meta.find_property_name("AUTHORNAME"), Some("authorName"));
        let err = meta.get_invoker("missing").unwrap_err();
        assert_eq!(
            err.to_string(),
            "There is no getter for property named 'missing' in 'demo.Blog'"
        );
    }
}
