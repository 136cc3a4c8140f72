//! Type descriptors
//!
//! A [`TypeDescriptor`] is the runtime registration record for one class or
//! interface: its place in the type hierarchy, its constructors, methods, and
//! fields. Accessor methods carry a [`MethodBody`] so the reflector can invoke
//! them against [`ObjectValue`] slots.

use std::fmt;
use std::sync::Arc;

use crate::node::Node;
use crate::value::{ObjectValue, Value};

use super::ReflectionError;

/// Primitive (non-nullable) types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// `boolean`
    Boolean,
    /// `byte`
    Byte,
    /// `short`
    Short,
    /// `int`
    Int,
    /// `long`
    Long,
    /// `float`
    Float,
    /// `double`
    Double,
    /// `char`
    Char,
    /// `void`
    Void,
}

impl Primitive {
    /// Source-level name
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Char => "char",
            Primitive::Void => "void",
        }
    }

    /// Name of the boxed reference type
    pub fn boxed_name(self) -> &'static str {
        match self {
            Primitive::Boolean => "Boolean",
            Primitive::Byte => "Byte",
            Primitive::Short => "Short",
            Primitive::Int => "Integer",
            Primitive::Long => "Long",
            Primitive::Float => "Float",
            Primitive::Double => "Double",
            Primitive::Char => "Character",
            Primitive::Void => "Void",
        }
    }

    /// Parse a source-level primitive name
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "boolean" => Primitive::Boolean,
            "byte" => Primitive::Byte,
            "short" => Primitive::Short,
            "int" => Primitive::Int,
            "long" => Primitive::Long,
            "float" => Primitive::Float,
            "double" => Primitive::Double,
            "char" => Primitive::Char,
            "void" => Primitive::Void,
            _ => return None,
        })
    }

    /// Zero value stored in fresh field slots
    pub fn default_value(self) -> Value {
        match self {
            Primitive::Boolean => Value::Bool(false),
            Primitive::Byte | Primitive::Short | Primitive::Int | Primitive::Char => Value::Int(0),
            Primitive::Long => Value::Long(0),
            Primitive::Float | Primitive::Double => Value::Double(0.0),
            Primitive::Void => Value::Null,
        }
    }
}

/// Reference to a type as written in a declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// Primitive type
    Primitive(Primitive),
    /// Named class or interface
    Named(String),
    /// Parameterized type such as `List<demo.Post>`
    Generic {
        /// Raw type name
        raw: String,
        /// Type arguments
        args: Vec<TypeRef>,
    },
    /// Array of a component type
    Array(Box<TypeRef>),
    /// Type variable, erased to the root object type
    Variable(String),
}

impl TypeRef {
    /// Named type reference
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    /// The root object type
    pub fn object() -> Self {
        TypeRef::Named("Object".to_string())
    }

    /// `void`
    pub fn void() -> Self {
        TypeRef::Primitive(Primitive::Void)
    }

    /// `int`
    pub fn int() -> Self {
        TypeRef::Primitive(Primitive::Int)
    }

    /// `boolean`
    pub fn boolean() -> Self {
        TypeRef::Primitive(Primitive::Boolean)
    }

    /// `String`
    pub fn string() -> Self {
        TypeRef::named("String")
    }

    /// Parameterized type reference
    pub fn generic(raw: impl Into<String>, args: Vec<TypeRef>) -> Self {
        TypeRef::Generic {
            raw: raw.into(),
            args,
        }
    }

    /// Array of this type
    pub fn array_of(self) -> Self {
        TypeRef::Array(Box::new(self))
    }

    /// Parse a written type: primitives, `Name`, `Name<A, B>`, `T[]`.
    ///
    /// Names listed in `type_params` parse as type variables.
    pub fn parse(text: &str, type_params: &[String]) -> Self {
        let text = text.trim();
        if let Some(component) = text.strip_suffix("[]") {
            return TypeRef::parse(component, type_params).array_of();
        }
        if let Some(open) = text.find('<') {
            if text.ends_with('>') {
                let raw = text[..open].trim().to_string();
                let args = split_type_args(&text[open + 1..text.len() - 1])
                    .into_iter()
                    .map(|arg| TypeRef::parse(arg, type_params))
                    .collect();
                return TypeRef::Generic { raw, args };
            }
        }
        if let Some(primitive) = Primitive::from_name(text) {
            return TypeRef::Primitive(primitive);
        }
        if type_params.iter().any(|p| p == text) {
            return TypeRef::Variable(text.to_string());
        }
        TypeRef::Named(text.to_string())
    }

    /// Check for `void`
    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Primitive(Primitive::Void))
    }

    /// Check for a primitive type other than `void`
    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeRef::Primitive(p) if *p != Primitive::Void)
    }

    /// Check for the primitive `boolean`
    pub fn is_boolean(&self) -> bool {
        matches!(self, TypeRef::Primitive(Primitive::Boolean))
    }

    /// Check for an array type
    pub fn is_array(&self) -> bool {
        matches!(self, TypeRef::Array(_))
    }

    /// Component type of an array
    pub fn component(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Array(component) => Some(component),
            _ => None,
        }
    }

    /// Raw class name for named and parameterized types
    pub fn raw_name(&self) -> Option<&str> {
        match self {
            TypeRef::Named(name) => Some(name),
            TypeRef::Generic { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// Type arguments of a parameterized type
    pub fn type_args(&self) -> &[TypeRef] {
        match self {
            TypeRef::Generic { args, .. } => args,
            _ => &[],
        }
    }

    /// Erased form: parameterized types lose their arguments and type
    /// variables become the root object type
    pub fn erasure(&self) -> TypeRef {
        match self {
            TypeRef::Generic { raw, .. } => TypeRef::Named(raw.clone()),
            TypeRef::Variable(_) => TypeRef::object(),
            TypeRef::Array(component) => component.erasure().array_of(),
            other => other.clone(),
        }
    }

    /// Boxed equivalent of a primitive, identity otherwise
    pub fn boxed(&self) -> TypeRef {
        match self {
            TypeRef::Primitive(p) if *p != Primitive::Void => TypeRef::named(p.boxed_name()),
            other => other.clone(),
        }
    }

    /// Unqualified name, e.g. `Blog` for `demo.Blog`, `int[]` for `int[]`
    pub fn simple_name(&self) -> String {
        match self {
            TypeRef::Primitive(p) => p.name().to_string(),
            TypeRef::Named(name) | TypeRef::Generic { raw: name, .. } => {
                name.rsplit('.').next().unwrap_or(name).to_string()
            }
            TypeRef::Array(component) => format!("{}[]", component.simple_name()),
            TypeRef::Variable(name) => name.clone(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Primitive(p) => write!(f, "{}", p.name()),
            TypeRef::Named(name) => write!(f, "{}", name),
            TypeRef::Generic { raw, args } => {
                write!(f, "{}<", raw)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ">")
            }
            TypeRef::Array(component) => write!(f, "{}[]", component),
            TypeRef::Variable(name) => write!(f, "{}", name),
        }
    }
}

fn split_type_args(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = text[start..].trim();
    if !last.is_empty() {
        parts.push(last);
    }
    parts
}

/// Class or interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// Instantiable class
    Class,
    /// Interface (mapper interfaces are declared this way)
    Interface,
}

/// Computes a value from an object, used for derived getters
pub type ComputeFn = Arc<dyn Fn(&ObjectValue) -> Result<Value, ReflectionError> + Send + Sync>;

/// Applies a value to an object, used for derived setters
pub type UpdateFn = Arc<dyn Fn(&mut ObjectValue, Value) -> Result<(), ReflectionError> + Send + Sync>;

/// How an accessor method acts on an instance
#[derive(Clone)]
pub enum MethodBody {
    /// Return the named field slot
    ReadField(String),
    /// Store the argument into the named field slot
    WriteField(String),
    /// Derived getter
    Compute(ComputeFn),
    /// Derived setter
    Update(UpdateFn),
}

impl fmt::Debug for MethodBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodBody::ReadField(field) => f.debug_tuple("ReadField").field(field).finish(),
            MethodBody::WriteField(field) => f.debug_tuple("WriteField").field(field).finish(),
            MethodBody::Compute(_) => f.write_str("Compute(..)"),
            MethodBody::Update(_) => f.write_str("Update(..)"),
        }
    }
}

/// Declared method or constructor parameter
#[derive(Debug, Clone)]
pub struct ParamDecl {
    /// Declared type
    pub ty: TypeRef,
    /// Declared identifier, if the declaration preserved it
    pub name: Option<String>,
    /// Parameter annotations
    pub annotations: Vec<Node>,
}

impl ParamDecl {
    /// Anonymous parameter
    pub fn new(ty: TypeRef) -> Self {
        Self {
            ty,
            name: None,
            annotations: Vec::new(),
        }
    }

    /// Parameter with a preserved identifier
    pub fn named(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            ty,
            name: Some(name.into()),
            annotations: Vec::new(),
        }
    }

    /// Builder-style annotation
    pub fn annotate(mut self, annotation: Node) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// First annotation with the given name
    pub fn annotation(&self, name: &str) -> Option<&Node> {
        self.annotations.iter().find(|a| a.name() == name)
    }
}

/// Declared constructor
#[derive(Debug, Clone)]
pub struct ConstructorDecl {
    /// Parameters; named parameters initialize the field slot of the same name
    pub params: Vec<ParamDecl>,
    /// Whether the constructor is callable from outside the type
    pub accessible: bool,
}

impl ConstructorDecl {
    /// Accessible constructor with the given parameters
    pub fn new(params: Vec<ParamDecl>) -> Self {
        Self {
            params,
            accessible: true,
        }
    }

    /// Accessible zero-argument constructor
    pub fn no_args() -> Self {
        Self::new(Vec::new())
    }
}

/// Declared method
#[derive(Debug, Clone)]
pub struct MethodDecl {
    /// Method name
    pub name: String,
    /// Parameters
    pub params: Vec<ParamDecl>,
    /// Declared return type
    pub return_type: TypeRef,
    /// Compiler-generated bridge method
    pub bridge: bool,
    /// Interface method with a default implementation
    pub default_method: bool,
    /// Method annotations
    pub annotations: Vec<Node>,
    /// Implementation used when invoked as an accessor
    pub body: Option<MethodBody>,
}

impl MethodDecl {
    /// Abstract method with no parameters
    pub fn new(name: impl Into<String>, return_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            return_type,
            bridge: false,
            default_method: false,
            annotations: Vec::new(),
            body: None,
        }
    }

    /// Getter returning a field slot
    pub fn getter(name: impl Into<String>, ty: TypeRef, field: impl Into<String>) -> Self {
        Self::new(name, ty).with_body(MethodBody::ReadField(field.into()))
    }

    /// Setter storing into a field slot
    pub fn setter(name: impl Into<String>, ty: TypeRef, field: impl Into<String>) -> Self {
        Self::new(name, TypeRef::void())
            .param(ty)
            .with_body(MethodBody::WriteField(field.into()))
    }

    /// Builder-style anonymous parameter
    pub fn param(mut self, ty: TypeRef) -> Self {
        self.params.push(ParamDecl::new(ty));
        self
    }

    /// Builder-style parameter declaration
    pub fn param_decl(mut self, param: ParamDecl) -> Self {
        self.params.push(param);
        self
    }

    /// Builder-style annotation
    pub fn annotate(mut self, annotation: Node) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Builder-style body
    pub fn with_body(mut self, body: MethodBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Mark as a bridge method
    pub fn bridge(mut self) -> Self {
        self.bridge = true;
        self
    }

    /// Mark as a default interface method
    pub fn default_method(mut self) -> Self {
        self.default_method = true;
        self
    }

    /// First annotation with the given name
    pub fn annotation(&self, name: &str) -> Option<&Node> {
        self.annotations.iter().find(|a| a.name() == name)
    }

    /// All annotations with the given name
    pub fn annotations_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.annotations.iter().filter(move |a| a.name() == name)
    }

    /// Signature unique across overloads and covariant returns:
    /// `ret#name:param1,param2`
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.params.iter().map(|p| p.ty.erasure().to_string()).collect();
        format!(
            "{}#{}:{}",
            self.return_type.erasure(),
            self.name,
            params.join(",")
        )
    }

    /// Call-site key ignoring the return type: `name(param1,param2)`
    pub fn call_key(&self) -> String {
        let params: Vec<String> = self.params.iter().map(|p| p.ty.erasure().to_string()).collect();
        format!("{}({})", self.name, params.join(","))
    }
}

/// Declared field
#[derive(Debug, Clone)]
pub struct FieldDecl {
    /// Field name
    pub name: String,
    /// Declared type
    pub ty: TypeRef,
    /// Static field
    pub is_static: bool,
    /// Final field
    pub is_final: bool,
}

impl FieldDecl {
    /// Mutable instance field
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            is_static: false,
            is_final: false,
        }
    }

    /// Static final constant
    pub fn constant(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            is_static: true,
            is_final: true,
            ..Self::new(name, ty)
        }
    }
}

/// Registration record for one class or interface
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    name: String,
    kind: TypeKind,
    type_params: Vec<String>,
    supertype: Option<String>,
    interfaces: Vec<String>,
    constructors: Vec<ConstructorDecl>,
    methods: Vec<MethodDecl>,
    fields: Vec<FieldDecl>,
    annotations: Vec<Node>,
}

impl TypeDescriptor {
    fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            type_params: Vec::new(),
            supertype: None,
            interfaces: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Class descriptor (extends `Object` unless told otherwise)
    pub fn class(name: impl Into<String>) -> Self {
        let mut desc = Self::new(name, TypeKind::Class);
        if desc.name != "Object" {
            desc.supertype = Some("Object".to_string());
        }
        desc
    }

    /// Interface descriptor
    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Interface)
    }

    /// Builder-style superclass
    pub fn extends(mut self, supertype: impl Into<String>) -> Self {
        self.supertype = Some(supertype.into());
        self
    }

    /// Builder-style implemented (or, for interfaces, extended) interface
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Builder-style type parameters
    pub fn type_params(mut self, params: &[&str]) -> Self {
        self.type_params = params.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Builder-style accessible zero-argument constructor
    pub fn default_constructor(self) -> Self {
        self.constructor(ConstructorDecl::no_args())
    }

    /// Builder-style constructor
    pub fn constructor(mut self, ctor: ConstructorDecl) -> Self {
        self.constructors.push(ctor);
        self
    }

    /// Builder-style field
    pub fn field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    /// Builder-style method
    pub fn method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    /// Builder-style annotation
    pub fn annotate(mut self, annotation: Node) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Field backed by a conventional getter/setter pair
    pub fn property(self, name: &str, ty: TypeRef) -> Self {
        let cap = capitalize(name);
        let getter_prefix = if ty.is_boolean() { "is" } else { "get" };
        self.field(FieldDecl::new(name, ty.clone()))
            .method(MethodDecl::getter(
                format!("{}{}", getter_prefix, cap),
                ty.clone(),
                name,
            ))
            .method(MethodDecl::setter(format!("set{}", cap), ty, name))
    }

    /// Fully qualified name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last segment of the qualified name
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Class or interface
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Check for an interface
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    /// Declared type parameters
    pub fn declared_type_params(&self) -> &[String] {
        &self.type_params
    }

    /// Direct superclass
    pub fn supertype(&self) -> Option<&str> {
        self.supertype.as_deref()
    }

    /// Directly implemented or extended interfaces
    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    /// Declared constructors
    pub fn constructors(&self) -> &[ConstructorDecl] {
        &self.constructors
    }

    /// Declared methods
    pub fn methods(&self) -> &[MethodDecl] {
        &self.methods
    }

    /// Declared fields
    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    /// Type-level annotations
    pub fn annotations(&self) -> &[Node] {
        &self.annotations
    }

    /// First type-level annotation with the given name
    pub fn annotation(&self, name: &str) -> Option<&Node> {
        self.annotations.iter().find(|a| a.name() == name)
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_type_refs() {
        let params = vec!["T".to_string()];
        assert_eq!(TypeRef::parse("int", &params), TypeRef::int());
        assert_eq!(TypeRef::parse("T", &params), TypeRef::Variable("T".into()));
        assert_eq!(
            TypeRef::parse("String[]", &params),
            TypeRef::string().array_of()
        );
        assert_eq!(
            TypeRef::parse("Map<String, List<demo.Post>>", &params),
            TypeRef::generic(
                "Map",
                vec![
                    TypeRef::string(),
                    TypeRef::generic("List", vec![TypeRef::named("demo.Post")])
                ]
            )
        );
    }

    #[test]
    fn test_erasure_and_names() {
        let list = TypeRef::generic("List", vec![TypeRef::named("demo.Post")]);
        assert_eq!(list.erasure(), TypeRef::named("List"));
        assert_eq!(TypeRef::Variable("T".into()).erasure(), TypeRef::object());
        assert_eq!(TypeRef::named("demo.Post").simple_name(), "Post");
        assert_eq!(TypeRef::int().boxed(), TypeRef::named("Integer"));
        assert_eq!(list.to_string(), "List<demo.Post>");
    }

    #[test]
    fn test_method_signatures() {
        let method = MethodDecl::new("find", TypeRef::named("demo.Blog"))
            .param(TypeRef::int())
            .param(TypeRef::generic("List", vec![TypeRef::string()]));
        assert_eq!(method.signature(), "demo.Blog#find:int,List");
        assert_eq!(method.call_key(), "find(int,List)");
    }

    #[test]
    fn test_property_shortcut() {
        let desc = TypeDescriptor::class("demo.Blog")
            .property("title", TypeRef::string())
            .property("active", TypeRef::boolean());
        let names: Vec<&str> = desc.methods().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["getTitle", "setTitle", "isActive", "setActive"]);
        assert_eq!(desc.supertype(), Some("Object"));
        assert_eq!(desc.simple_name(), "Blog");
    }
}
