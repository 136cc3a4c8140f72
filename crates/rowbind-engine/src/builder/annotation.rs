//! Annotation reader
//!
//! Builds statements from the annotations attached to a mapper interface's
//! methods. An interface's companion XML source is read first when a source
//! lookup is installed, so annotated methods may reference result maps
//! declared there.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::binding::{interface_methods, is_control_type};
use crate::mapping::{CommandKind, Discriminator, KeyGenerator, ResultFlag, ResultMapping, SqlSource};
use crate::node::Node;
use crate::reflect::{MethodDecl, TypeDescriptor, TypeRef};
use crate::types::JdbcType;

use super::assistant::{
    BuilderAssistant, CacheSpec, DiscriminatorSpec, ResultMapSpec, ResultMappingSpec, StatementGroup,
    StatementSpec,
};
use super::linker::{interface_marker, namespace_marker};
use super::pending::{resolver, FragmentKey, FragmentKind};
use super::{BuildError, Linker};

const STATEMENT_ANNOTATIONS: [&str; 4] = ["Select", "Insert", "Update", "Delete"];
const PROVIDER_ANNOTATIONS: [&str; 4] = [
    "SelectProvider",
    "InsertProvider",
    "UpdateProvider",
    "DeleteProvider",
];

/// Reads one mapper interface into the linker
pub struct AnnotationReader<'l> {
    linker: &'l mut Linker,
    interface: Arc<TypeDescriptor>,
    resource: String,
}

impl<'l> AnnotationReader<'l> {
    /// Reader for a registered interface descriptor
    pub fn new(linker: &'l mut Linker, interface: Arc<TypeDescriptor>) -> Self {
        let resource = format!("{} (annotations)", interface.name());
        Self {
            linker,
            interface,
            resource,
        }
    }

    /// Read the interface's cache settings and statement methods
    ///
    /// An interface already read is skipped; parked fragments are retried
    /// either way.
    pub fn parse(mut self) -> Result<(), BuildError> {
        let namespace = self.interface.name().to_string();
        let marker = interface_marker(&namespace);
        if !self.linker.configuration().is_resource_loaded(&marker) {
            self.load_xml_resource()?;
            self.linker.configuration_mut().add_loaded_resource(&marker);
            self.cache_namespace()?;
            self.cache_namespace_ref()?;
            for method in self.statement_methods() {
                let Some(group) = self.statement_group(&method)? else {
                    continue;
                };
                let key = FragmentKey::new(FragmentKind::Method, namespace.clone(), method.call_key());
                let namespace = namespace.clone();
                let resource = self.resource.clone();
                self.linker.resolve_or_park(
                    key,
                    resolver(move |config| {
                        Ok(BuilderAssistant::for_namespace(config, namespace.as_str(), resource.as_str())
                            .add_statement_group(&group)?
                            .map(|_| ()))
                    }),
                )?;
            }
        }
        self.linker.retry_pending()?;
        Ok(())
    }

    fn assistant(&mut self) -> BuilderAssistant<'_> {
        BuilderAssistant::for_namespace(
            self.linker.configuration_mut(),
            self.interface.name(),
            self.resource.as_str(),
        )
    }

    fn resolve_type(&self, name: &str) -> Result<TypeRef, BuildError> {
        Ok(self.linker.configuration().resolve_type(name)?)
    }

    fn load_xml_resource(&mut self) -> Result<(), BuildError> {
        let name = self.interface.name();
        if self.linker.configuration().is_resource_loaded(&namespace_marker(name)) {
            return Ok(());
        }
        let resource = format!("{}.xml", name.replace('.', "/"));
        if let Some(root) = self.linker.lookup_source(&resource) {
            self.linker.load_mapper(&resource, &root)?;
        }
        Ok(())
    }

    fn statement_methods(&self) -> Vec<MethodDecl> {
        interface_methods(self.linker.configuration().catalog(), &self.interface)
            .into_iter()
            .map(|(method, _)| method)
            .collect()
    }

    // ========================================================================
    // Caches
    // ========================================================================

    fn cache_namespace(&mut self) -> Result<(), BuildError> {
        let Some(annotation) = self.interface.annotation("CacheNamespace").cloned() else {
            return Ok(());
        };
        let mut properties = BTreeMap::new();
        for property in annotation.children_named("Property") {
            properties.insert(
                property.required_attr("name")?.to_string(),
                property.required_attr("value")?.to_string(),
            );
        }
        let spec = CacheSpec {
            implementation: annotation.non_empty_attr("implementation").map(str::to_string),
            eviction: annotation.non_empty_attr("eviction").map(str::to_string),
            flush_interval: annotation.u64_attr("flushInterval")?.filter(|v| *v > 0),
            size: annotation.u64_attr("size")?.filter(|v| *v > 0),
            read_only: !annotation.bool_attr("readWrite")?.unwrap_or(true),
            blocking: annotation.bool_attr("blocking")?.unwrap_or(false),
            properties,
        };
        self.assistant().use_new_cache(&spec)?;
        Ok(())
    }

    fn cache_namespace_ref(&mut self) -> Result<(), BuildError> {
        let Some(annotation) = self.interface.annotation("CacheNamespaceRef") else {
            return Ok(());
        };
        let referenced = match (annotation.non_empty_attr("value"), annotation.non_empty_attr("name")) {
            (Some(_), Some(_)) => {
                return Err(BuildError::InvalidCacheRef(
                    "Cannot use both value() and name() attribute in the @CacheNamespaceRef".into(),
                ))
            }
            (None, None) => {
                return Err(BuildError::InvalidCacheRef(
                    "Should be specified either value() or name() attribute in the @CacheNamespaceRef".into(),
                ))
            }
            (Some(referenced), None) | (None, Some(referenced)) => referenced.to_string(),
        };

        let namespace = self.interface.name().to_string();
        let resource = self.resource.clone();
        self.linker
            .configuration_mut()
            .add_cache_ref(&namespace, &referenced);
        let key = FragmentKey::new(FragmentKind::CacheRef, namespace.clone(), referenced.clone());
        self.linker.resolve_or_park(
            key,
            resolver(move |config| {
                Ok(BuilderAssistant::for_namespace(config, namespace.as_str(), resource.as_str())
                    .use_cache_ref(&referenced)?
                    .map(|_| ()))
            }),
        )?;
        Ok(())
    }

    // ========================================================================
    // Statements
    // ========================================================================

    /// Everything one annotated method declares, or `None` for a method
    /// without statement annotations
    fn statement_group(&mut self, method: &MethodDecl) -> Result<Option<StatementGroup>, BuildError> {
        let statement = method
            .annotations
            .iter()
            .find(|a| STATEMENT_ANNOTATIONS.contains(&a.name()));
        let provider = method
            .annotations
            .iter()
            .find(|a| PROVIDER_ANNOTATIONS.contains(&a.name()));
        let (command, sql) = match (statement, provider) {
            (Some(_), Some(_)) => return Err(BuildError::ConflictingSqlSource(method.name.clone())),
            (Some(annotation), None) => (
                CommandKind::from_element(annotation.name()),
                SqlSource::text(annotation_text(annotation, "value")),
            ),
            (None, Some(annotation)) => (
                CommandKind::from_element(annotation.name()),
                SqlSource {
                    text: String::new(),
                    provider: Some(format!(
                        "{}#{}",
                        annotation.required_attr("type")?,
                        annotation.non_empty_attr("method").unwrap_or("provideSql")
                    )),
                },
            ),
            (None, None) => return Ok(None),
        };

        let id = format!("{}.{}", self.interface.name(), method.name);
        let options = method.annotation("Options");
        let parameter_type = self.parameter_type(method);
        let mut spec = StatementSpec::new(id.as_str(), command, sql);
        spec.parameter_type = parameter_type.clone();
        spec.lang = method
            .annotation("Lang")
            .and_then(|lang| lang.non_empty_attr("value"))
            .map(str::to_string);

        let mut select_key = None;
        if matches!(command, CommandKind::Insert | CommandKind::Update) {
            if let Some(annotation) = method.annotation("SelectKey") {
                let (key, execute_before) = self.select_key(annotation, &id, parameter_type)?;
                spec.key_generator = KeyGenerator::SelectKey {
                    statement_id: key.id.clone(),
                    execute_before,
                };
                spec.key_properties = key.key_properties.clone();
                select_key = Some(key);
            } else if let Some(options) = options {
                if options.bool_attr("useGeneratedKeys")?.unwrap_or(false) {
                    spec.key_generator = KeyGenerator::Jdbc3;
                }
                spec.key_properties = match options.list_attr("keyProperty") {
                    list if list.is_empty() => vec!["id".to_string()],
                    list => list,
                };
                spec.key_columns = options.list_attr("keyColumn");
            } else if self.linker.configuration().settings().use_generated_keys {
                spec.key_generator = KeyGenerator::Jdbc3;
            }
        }

        if let Some(options) = options {
            spec.flush_cache = flush_cache_option(options)?;
            spec.use_cache = options.bool_attr("useCache")?;
            spec.fetch_size = hint_attr(options, "fetchSize")?;
            spec.timeout = hint_attr(options, "timeout")?;
            if let Some(kind) = options.non_empty_attr("statementType") {
                spec.statement_kind = kind.parse().map_err(|_| invalid(options, "statement type", kind))?;
            }
            if let Some(kind) = options.non_empty_attr("resultSetType") {
                spec.result_set_kind = kind.parse().map_err(|_| invalid(options, "result set type", kind))?;
            }
            spec.result_sets = options.list_attr("resultSets");
        }

        let mut result_maps = Vec::new();
        if command.is_select() {
            match method.annotation("ResultMap") {
                Some(annotation) => spec.result_map = Some(annotation.list_attr("value").join(",")),
                None => {
                    let (result_map_id, generated) = self.generated_result_maps(method)?;
                    spec.result_map = Some(result_map_id);
                    result_maps = generated;
                }
            }
        }
        if spec.result_map.is_none() {
            let return_type = self.return_type(method)?;
            if !return_type.is_void() {
                spec.result_type = Some(return_type);
            }
        }

        Ok(Some(StatementGroup {
            result_maps,
            select_key,
            statement: spec,
        }))
    }

    /// The single logical parameter's type, or the parameter map type when
    /// there are several
    fn parameter_type(&self, method: &MethodDecl) -> Option<TypeRef> {
        let catalog = self.linker.configuration().catalog();
        let logical: Vec<&TypeRef> = method
            .params
            .iter()
            .map(|p| &p.ty)
            .filter(|ty| !is_control_type(catalog, ty))
            .collect();
        match logical.as_slice() {
            [] => None,
            [single] => Some(single.erasure()),
            _ => Some(TypeRef::named("ParamMap")),
        }
    }

    /// Element type the statement's rows map to
    fn return_type(&self, method: &MethodDecl) -> Result<TypeRef, BuildError> {
        let declared = &method.return_type;
        if let Some(component) = declared.component() {
            return Ok(component.clone());
        }
        if declared.is_void() {
            return match method.annotation("ResultType") {
                Some(annotation) => self.resolve_type(annotation.required_attr("value")?),
                None => Ok(TypeRef::void()),
            };
        }

        let catalog = self.linker.configuration().catalog();
        let raw = declared.erasure();
        let args = declared.type_args();
        if catalog.is_collection(&raw) || raw == TypeRef::named("Cursor") {
            if let Some(element) = args.first() {
                return Ok(element.erasure());
            }
        } else if method.annotation("MapKey").is_some() && catalog.is_map(&raw) {
            if let [_, value] = args {
                return Ok(value.erasure());
            }
        }
        Ok(raw)
    }

    fn select_key(
        &self,
        annotation: &Node,
        parent_id: &str,
        parameter_type: Option<TypeRef>,
    ) -> Result<(StatementSpec, bool), BuildError> {
        let mut spec = StatementSpec::new(
            format!("{}!selectKey", parent_id),
            CommandKind::Select,
            SqlSource::text(annotation_text(annotation, "statement")),
        );
        spec.parameter_type = parameter_type;
        spec.result_type = Some(self.resolve_type(annotation.required_attr("resultType")?)?);
        if let Some(kind) = annotation.non_empty_attr("statementType") {
            spec.statement_kind = kind.parse().map_err(|_| invalid(annotation, "statement type", kind))?;
        }
        spec.key_properties = annotation.list_attr("keyProperty");
        spec.key_columns = annotation.list_attr("keyColumn");
        spec.flush_cache = Some(false);
        spec.use_cache = Some(false);
        Ok((spec, annotation.bool_attr("before")?.unwrap_or(false)))
    }

    // ========================================================================
    // Generated result maps
    // ========================================================================

    /// Result map built from `ConstructorArgs`, `Results` and
    /// `TypeDiscriminator`, followed by one map per discriminator case
    fn generated_result_maps(&mut self, method: &MethodDecl) -> Result<(String, Vec<ResultMapSpec>), BuildError> {
        let return_type = self.return_type(method)?;
        let results = method.annotation("Results");
        let id = match results.and_then(|r| r.non_empty_attr("id")) {
            Some(id) => format!("{}.{}", self.interface.name(), id),
            None => self.generated_id(method),
        };

        let mut mappings = Vec::new();
        if let Some(args) = method.annotation("ConstructorArgs") {
            mappings.extend(self.annotated_mappings(args, &return_type)?);
        }
        if let Some(results) = results {
            mappings.extend(self.annotated_mappings(results, &return_type)?);
        }

        let mut maps = Vec::new();
        let mut discriminator = None;
        let mut case_maps = Vec::new();
        if let Some(annotation) = method.annotation("TypeDiscriminator") {
            let (built, cases) = self.discriminator(&id, &return_type, annotation)?;
            discriminator = Some(built);
            case_maps = cases;
        }
        maps.push(ResultMapSpec {
            id: id.clone(),
            type_ref: return_type,
            extends: None,
            discriminator,
            mappings,
            auto_mapping: None,
        });
        maps.extend(case_maps);
        Ok((id, maps))
    }

    /// `Type.method-ParamSimpleNames`, or `Type.method-void` without
    /// parameters
    fn generated_id(&self, method: &MethodDecl) -> String {
        let suffix = if method.params.is_empty() {
            "-void".to_string()
        } else {
            method
                .params
                .iter()
                .map(|p| format!("-{}", p.ty.erasure().simple_name()))
                .collect()
        };
        format!("{}.{}{}", self.interface.name(), method.name, suffix)
    }

    /// Mappings from the `Arg` and `Result` children of an annotation
    fn annotated_mappings(&mut self, parent: &Node, result_type: &TypeRef) -> Result<Vec<ResultMapping>, BuildError> {
        let mut mappings = Vec::new();
        for child in parent.children() {
            let mut flags = match child.name() {
                "Arg" => vec![ResultFlag::Constructor],
                "Result" => Vec::new(),
                _ => continue,
            };
            if child.bool_attr("id")?.unwrap_or(false) {
                flags.push(ResultFlag::Id);
            }
            mappings.push(self.annotated_mapping(child, result_type, flags)?);
        }
        Ok(mappings)
    }

    fn annotated_mapping(
        &mut self,
        node: &Node,
        result_type: &TypeRef,
        flags: Vec<ResultFlag>,
    ) -> Result<ResultMapping, BuildError> {
        let nested_select = match (node.non_empty_attr("one"), node.non_empty_attr("many")) {
            (Some(_), Some(_)) => {
                return Err(invalid(node, "nested select", "both one and many"));
            }
            (Some(select), None) | (None, Some(select)) if select.contains('.') => Some(select.to_string()),
            (Some(select), None) | (None, Some(select)) => {
                Some(format!("{}.{}", self.interface.name(), select))
            }
            (None, None) => None,
        };
        let lazy = match node.non_empty_attr("fetchType").map(str::to_ascii_uppercase).as_deref() {
            Some("LAZY") => Some(true),
            Some("EAGER") => Some(false),
            Some("DEFAULT") | None => None,
            Some(other) => return Err(invalid(node, "fetch type", other)),
        };
        let property = if flags.contains(&ResultFlag::Constructor) {
            node.non_empty_attr("name")
        } else {
            node.non_empty_attr("property")
        };
        let spec = ResultMappingSpec {
            property: property.map(str::to_string),
            column: node.non_empty_attr("column").map(str::to_string),
            value_type: match node.non_empty_attr("javaType") {
                Some("void") | None => None,
                Some(name) => Some(self.resolve_type(name)?),
            },
            jdbc_type: jdbc_type(node)?,
            nested_select,
            type_handler: node.non_empty_attr("typeHandler").map(str::to_string),
            flags,
            lazy,
            ..ResultMappingSpec::default()
        };
        self.assistant().build_result_mapping(result_type, spec)
    }

    fn discriminator(
        &mut self,
        result_map_id: &str,
        result_type: &TypeRef,
        annotation: &Node,
    ) -> Result<(Discriminator, Vec<ResultMapSpec>), BuildError> {
        let mut cases = Vec::new();
        let mut case_maps = Vec::new();
        for case in annotation.children_named("Case") {
            let value = case.required_attr("value")?;
            let case_id = format!("{}-{}", result_map_id, value);
            let case_type = self.resolve_type(case.required_attr("type")?)?;
            let mappings = self.annotated_mappings(case, &case_type)?;
            case_maps.push(ResultMapSpec {
                id: case_id.clone(),
                type_ref: case_type,
                extends: Some(result_map_id.to_string()),
                discriminator: None,
                mappings,
                auto_mapping: None,
            });
            cases.push((value.to_string(), case_id));
        }

        let spec = DiscriminatorSpec {
            column: annotation.non_empty_attr("column").map(str::to_string),
            value_type: Some(match annotation.non_empty_attr("javaType") {
                Some(name) => self.resolve_type(name)?,
                None => TypeRef::string(),
            }),
            jdbc_type: jdbc_type(annotation)?,
            type_handler: annotation.non_empty_attr("typeHandler").map(str::to_string),
            cases,
        };
        let discriminator = self.assistant().build_discriminator(result_type, &spec)?;
        Ok((discriminator, case_maps))
    }
}

/// Statement text from an attribute, falling back to the node's text
fn annotation_text(annotation: &Node, attr: &str) -> String {
    annotation
        .non_empty_attr(attr)
        .or_else(|| annotation.trimmed_text())
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

/// `TRUE`, `FALSE`, or `DEFAULT` (the statement kind decides)
fn flush_cache_option(options: &Node) -> Result<Option<bool>, BuildError> {
    match options.non_empty_attr("flushCache").map(str::to_ascii_uppercase).as_deref() {
        Some("TRUE") => Ok(Some(true)),
        Some("FALSE") => Ok(Some(false)),
        Some("DEFAULT") | None => Ok(None),
        Some(other) => Err(invalid(options, "flush cache option", other)),
    }
}

/// Non-negative driver hint; negative values mean unset
fn hint_attr(node: &Node, attr: &str) -> Result<Option<u64>, BuildError> {
    let Some(text) = node.non_empty_attr(attr) else {
        return Ok(None);
    };
    let value: i64 = text.trim().parse().map_err(|_| invalid(node, "number", text))?;
    Ok(u64::try_from(value).ok())
}

fn jdbc_type(node: &Node) -> Result<Option<JdbcType>, BuildError> {
    match node.non_empty_attr("jdbcType") {
        Some(text) => match text.parse() {
            Ok(JdbcType::Undefined) => Ok(None),
            Ok(jdbc_type) => Ok(Some(jdbc_type)),
            Err(_) => Err(invalid(node, "jdbc type", text)),
        },
        None => Ok(None),
    }
}

fn invalid(node: &Node, what: &'static str, value: &str) -> BuildError {
    BuildError::InvalidValue {
        element: node.name().to_string(),
        what,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::Configuration;
    use crate::reflect::ParamDecl;
    use crate::settings::Settings;

    fn catalog_config() -> Configuration {
        let config = Configuration::new(Settings::default());
        config
            .catalog()
            .register(
                TypeDescriptor::class("demo.Blog")
                    .default_constructor()
                    .property("id", TypeRef::int())
                    .property("title", TypeRef::string()),
            )
            .unwrap();
        config
            .catalog()
            .register(TypeDescriptor::class("demo.DraftBlog").extends("demo.Blog").default_constructor())
            .unwrap();
        config
    }

    fn select(sql: &str) -> Node {
        Node::new("Select").with_attr("value", sql)
    }

    fn blog_mapper() -> TypeDescriptor {
        TypeDescriptor::interface("demo.BlogMapper")
            .method(
                MethodDecl::new("selectBlog", TypeRef::named("demo.Blog"))
                    .param(TypeRef::int())
                    .annotate(select("select * from blog where id = #{id}"))
                    .annotate(
                        Node::new("Results")
                            .with_child(Node::new("Result").with_attr("id", "true").with_attr("property", "id").with_attr("column", "blog_id"))
                            .with_child(Node::new("Result").with_attr("property", "title").with_attr("column", "title")),
                    ),
            )
            .method(
                MethodDecl::new("selectAll", TypeRef::generic("List", vec![TypeRef::named("demo.Blog")]))
                    .annotate(select("select * from blog"))
                    .annotate(
                        Node::new("TypeDiscriminator")
                            .with_attr("column", "draft")
                            .with_child(Node::new("Case").with_attr("value", "1").with_attr("type", "demo.DraftBlog")),
                    ),
            )
            .method(
                MethodDecl::new("insertBlog", TypeRef::int())
                    .param(TypeRef::named("demo.Blog"))
                    .annotate(Node::new("Insert").with_text("insert into blog (title)\n  values (#{title})"))
                    .annotate(Node::new("Options").with_attr("useGeneratedKeys", "true")),
            )
            .method(
                MethodDecl::new("countByTitle", TypeRef::int())
                    .param_decl(ParamDecl::named("title", TypeRef::string()).annotate(Node::new("Param").with_attr("value", "title")))
                    .param(TypeRef::named("RowBounds"))
                    .annotate(select("select count(*) from blog where title = #{title}")),
            )
            .method(MethodDecl::new("flush", TypeRef::void()).annotate(Node::new("Flush")))
    }

    #[test]
    fn test_builds_annotated_statements() {
        let config = catalog_config();
        config.catalog().register(blog_mapper()).unwrap();
        let mut linker = Linker::new(config);
        linker.add_mapper("demo.BlogMapper").unwrap();
        assert!(linker.pending().is_empty());
        assert!(linker.mappers().has_mapper("demo.BlogMapper"));

        let config = linker.configuration();
        let select = config.get_statement("demo.BlogMapper.selectBlog").unwrap();
        assert_eq!(select.result_maps[0].id(), "demo.BlogMapper.selectBlog-int");
        assert_eq!(select.result_maps[0].id_mappings().len(), 1);
        assert_eq!(select.parameter_map.type_ref, Some(TypeRef::int()));

        let insert = config.get_statement("demo.BlogMapper.insertBlog").unwrap();
        assert_eq!(insert.key_generator, KeyGenerator::Jdbc3);
        assert_eq!(insert.key_properties, vec!["id"]);
        assert_eq!(insert.sql.text, "insert into blog (title) values (#{title})");
        assert!(insert.flush_cache);

        let count = config.get_statement("demo.BlogMapper.countByTitle").unwrap();
        assert_eq!(count.parameter_map.type_ref, Some(TypeRef::string()));
        assert!(!config.has_statement("demo.BlogMapper.flush"));
    }

    #[test]
    fn test_discriminator_cases_extend_generated_map() {
        let config = catalog_config();
        config.catalog().register(blog_mapper()).unwrap();
        let mut linker = Linker::new(config);
        linker.add_mapper("demo.BlogMapper").unwrap();

        let config = linker.configuration();
        let select_all = config.get_statement("demo.BlogMapper.selectAll").unwrap();
        let map = &select_all.result_maps[0];
        assert_eq!(map.id(), "demo.BlogMapper.selectAll-void");
        assert_eq!(map.type_ref(), &TypeRef::named("demo.Blog"));
        let case_id = map.discriminator().unwrap().map_id_for("1").unwrap();
        assert_eq!(case_id, "demo.BlogMapper.selectAll-void-1");
        assert_eq!(config.get_result_map(case_id).unwrap().type_ref(), &TypeRef::named("demo.DraftBlog"));
    }

    #[test]
    fn test_method_waits_for_result_map() {
        let config = catalog_config();
        config
            .catalog()
            .register(
                TypeDescriptor::interface("demo.PostMapper").method(
                    MethodDecl::new("selectBlogs", TypeRef::generic("List", vec![TypeRef::named("demo.Blog")]))
                        .annotate(select("select * from blog"))
                        .annotate(Node::new("ResultMap").with_attr("value", "demo.Shared.blogMap")),
                ),
            )
            .unwrap();
        let mut linker = Linker::new(config);
        linker.add_mapper("demo.PostMapper").unwrap();
        assert_eq!(linker.pending().count(FragmentKind::Method), 1);

        let shared = Node::new("mapper")
            .with_attr("namespace", "demo.Shared")
            .with_child(Node::new("resultMap").with_attr("id", "blogMap").with_attr("type", "demo.Blog"));
        linker.load_mapper("mappers/shared.xml", &shared).unwrap();
        assert!(linker.pending().is_empty());
        assert!(linker.configuration().has_statement("demo.PostMapper.selectBlogs"));
    }

    #[test]
    fn test_companion_xml_is_read_first() {
        let config = catalog_config();
        config
            .catalog()
            .register(
                TypeDescriptor::interface("demo.AuthorMapper").method(
                    MethodDecl::new("selectBlog", TypeRef::named("demo.Blog"))
                        .param(TypeRef::int())
                        .annotate(select("select * from blog"))
                        .annotate(Node::new("ResultMap").with_attr("value", "detail")),
                ),
            )
            .unwrap();
        let mut linker = Linker::new(config);
        linker.set_source_lookup(Box::new(|resource| {
            (resource == "demo/AuthorMapper.xml").then(|| {
                Node::new("mapper")
                    .with_attr("namespace", "demo.AuthorMapper")
                    .with_child(Node::new("resultMap").with_attr("id", "detail").with_attr("type", "demo.Blog"))
            })
        }));
        linker.add_mapper("demo.AuthorMapper").unwrap();
        assert!(linker.pending().is_empty());
        assert!(linker.configuration().is_resource_loaded("demo/AuthorMapper.xml"));
        let statement = linker.configuration().get_statement("demo.AuthorMapper.selectBlog").unwrap();
        assert_eq!(statement.result_maps[0].id(), "demo.AuthorMapper.detail");
    }

    #[test]
    fn test_cache_namespace_ref_requires_one_target() {
        let config = catalog_config();
        config
            .catalog()
            .register(
                TypeDescriptor::interface("demo.BadMapper")
                    .annotate(Node::new("CacheNamespaceRef").with_attr("value", "demo.A").with_attr("name", "demo.B")),
            )
            .unwrap();
        let mut linker = Linker::new(config);
        let err = linker.add_mapper("demo.BadMapper").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot use both value() and name() attribute in the @CacheNamespaceRef"
        );
        assert!(!linker.mappers().has_mapper("demo.BadMapper"));
    }

    #[test]
    fn test_static_sql_and_provider_conflict() {
        let config = catalog_config();
        config
            .catalog()
            .register(
                TypeDescriptor::interface("demo.MixedMapper").method(
                    MethodDecl::new("find", TypeRef::named("demo.Blog"))
                        .annotate(select("select 1"))
                        .annotate(Node::new("SelectProvider").with_attr("type", "demo.Sql")),
                ),
            )
            .unwrap();
        let mut linker = Linker::new(config);
        assert!(matches!(
            linker.add_mapper("demo.MixedMapper"),
            Err(BuildError::ConflictingSqlSource(name)) if name == "find"
        ));
    }

    #[test]
    fn test_cache_namespace_attaches_cache() {
        let config = catalog_config();
        config
            .catalog()
            .register(
                TypeDescriptor::interface("demo.CachedMapper")
                    .annotate(Node::new("CacheNamespace").with_attr("size", "512"))
                    .method(
                        MethodDecl::new("find", TypeRef::named("demo.Blog"))
                            .annotate(Node::new("SelectProvider").with_attr("type", "demo.Sql").with_attr("method", "find")),
                    ),
            )
            .unwrap();
        let mut linker = Linker::new(config);
        linker.add_mapper("demo.CachedMapper").unwrap();
        let statement = linker.configuration().get_statement("demo.CachedMapper.find").unwrap();
        assert_eq!(statement.sql.provider.as_deref(), Some("demo.Sql#find"));
        let cache = statement.cache.as_ref().unwrap();
        assert_eq!(cache.size, Some(512));
        assert!(cache.read_write);
    }
}
