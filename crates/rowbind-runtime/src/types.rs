//! Type descriptor sources
//!
//! Object and mapper-interface types are declared in XML and registered in
//! the engine's type catalog before any mapper source is read:
//!
//! ```xml
//! <types>
//!   <class name="demo.Blog" extends="demo.Entity">
//!     <constructor/>
//!     <property name="title" type="String"/>
//!   </class>
//!   <interface name="demo.BlogMapper">
//!     <method name="selectBlog" returns="demo.Blog">
//!       <param name="id" type="int"/>
//!       <Select>select * from blog where id = #{id}</Select>
//!     </method>
//!   </interface>
//! </types>
//! ```
//!
//! Any child of `<class>`, `<interface>`, `<method>` or `<param>` that is not
//! a structural element is kept as an annotation node.

use rowbind_engine::node::NodeError;
use rowbind_engine::reflect::{ConstructorDecl, FieldDecl, MethodBody, MethodDecl, ParamDecl};
use rowbind_engine::{Node, TypeCatalog, TypeDescriptor, TypeRef};
use tracing::debug;

use crate::error::RuntimeError;

/// Build the descriptors declared under a `<types>` root
pub fn read_types(root: &Node) -> Result<Vec<TypeDescriptor>, RuntimeError> {
    if root.name() != "types" {
        return Err(RuntimeError::InvalidTypeSource(format!(
            "expected a <types> root element, found <{}>",
            root.name()
        )));
    }
    root.children()
        .iter()
        .map(|node| match node.name() {
            "class" | "interface" => read_type(node),
            other => Err(RuntimeError::InvalidTypeSource(format!(
                "unexpected element <{}> in <types>",
                other
            ))),
        })
        .collect()
}

/// Register every descriptor declared under a `<types>` root
///
/// Returns the registered type names in declaration order.
pub fn register_types(catalog: &TypeCatalog, root: &Node) -> Result<Vec<String>, RuntimeError> {
    let mut names = Vec::new();
    for desc in read_types(root)? {
        names.push(catalog.register(desc)?.name().to_string());
    }
    debug!(count = names.len(), "registered type descriptors");
    Ok(names)
}

fn read_type(node: &Node) -> Result<TypeDescriptor, RuntimeError> {
    let name = node.required_attr("name")?;
    let is_interface = node.name() == "interface";
    let mut desc = if is_interface {
        TypeDescriptor::interface(name)
    } else {
        TypeDescriptor::class(name)
    };

    let type_params = node.list_attr("typeParams");
    if !type_params.is_empty() {
        let params: Vec<&str> = type_params.iter().map(String::as_str).collect();
        desc = desc.type_params(&params);
    }

    // Interfaces extend interfaces; classes extend one class and implement many
    if is_interface {
        for parent in node.list_attr("extends") {
            desc = desc.implements(parent);
        }
    } else if let Some(parent) = node.non_empty_attr("extends") {
        desc = desc.extends(parent);
    }
    for interface in node.list_attr("implements") {
        desc = desc.implements(interface);
    }

    for child in node.children() {
        desc = match child.name() {
            "constructor" => desc.constructor(read_constructor(child, &type_params)?),
            "property" => desc.property(child.required_attr("name")?, type_attr(child, "type", &type_params)?),
            "field" => desc.field(read_field(child, &type_params)?),
            "getter" => desc.method(MethodDecl::getter(
                child.required_attr("name")?,
                type_attr(child, "type", &type_params)?,
                child.required_attr("field")?,
            )),
            "setter" => desc.method(MethodDecl::setter(
                child.required_attr("name")?,
                type_attr(child, "type", &type_params)?,
                child.required_attr("field")?,
            )),
            "method" => desc.method(read_method(child, &type_params)?),
            _ => desc.annotate(annotation(child)),
        };
    }
    Ok(desc)
}

fn read_constructor(node: &Node, type_params: &[String]) -> Result<ConstructorDecl, RuntimeError> {
    let params = node
        .children_named("param")
        .map(|param| read_param(param, type_params))
        .collect::<Result<Vec<_>, _>>()?;
    let mut ctor = ConstructorDecl::new(params);
    if let Some(accessible) = node.bool_attr("accessible")? {
        ctor.accessible = accessible;
    }
    Ok(ctor)
}

fn read_field(node: &Node, type_params: &[String]) -> Result<FieldDecl, RuntimeError> {
    let mut field = FieldDecl::new(node.required_attr("name")?, type_attr(node, "type", type_params)?);
    field.is_static = node.bool_attr("static")?.unwrap_or(false);
    field.is_final = node.bool_attr("final")?.unwrap_or(false);
    Ok(field)
}

fn read_method(node: &Node, type_params: &[String]) -> Result<MethodDecl, RuntimeError> {
    let return_type = match node.non_empty_attr("returns") {
        Some(text) => TypeRef::parse(text, type_params),
        None => TypeRef::void(),
    };
    let mut method = MethodDecl::new(node.required_attr("name")?, return_type);
    for child in node.children() {
        method = match child.name() {
            "param" => method.param_decl(read_param(child, type_params)?),
            _ => method.annotate(annotation(child)),
        };
    }
    if node.bool_attr("bridge")?.unwrap_or(false) {
        method = method.bridge();
    }
    if node.bool_attr("default")?.unwrap_or(false) {
        method = method.default_method();
    }
    if let Some(field) = node.non_empty_attr("reads") {
        method = method.with_body(MethodBody::ReadField(field.to_string()));
    } else if let Some(field) = node.non_empty_attr("writes") {
        method = method.with_body(MethodBody::WriteField(field.to_string()));
    }
    Ok(method)
}

fn read_param(node: &Node, type_params: &[String]) -> Result<ParamDecl, RuntimeError> {
    let ty = type_attr(node, "type", type_params)?;
    let mut param = match node.non_empty_attr("name") {
        Some(name) => ParamDecl::named(name, ty),
        None => ParamDecl::new(ty),
    };
    for child in node.children() {
        param = param.annotate(annotation(child));
    }
    Ok(param)
}

fn type_attr(node: &Node, key: &str, type_params: &[String]) -> Result<TypeRef, NodeError> {
    Ok(TypeRef::parse(node.required_attr(key)?, type_params))
}

/// Annotation node; body text stands in for a missing `value` attribute
fn annotation(node: &Node) -> Node {
    let mut annotation = node.clone();
    if annotation.attr("value").is_none() {
        if let Some(text) = node.trimmed_text() {
            annotation.set_attr("value", text);
        }
    }
    annotation
}
