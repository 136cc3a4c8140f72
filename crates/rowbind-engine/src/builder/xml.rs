//! XML mapper reader
//!
//! Walks a `mapper` node tree and hands every declaration to the builder
//! assistant through the linker, so declarations with missing references
//! are parked instead of failing.

use std::collections::BTreeMap;

use crate::mapping::{CommandKind, KeyGenerator, ParameterMapping, ResultFlag, ResultMapping, SqlSource};
use crate::node::{value_based_identifier, Node};
use crate::reflect::TypeRef;
use crate::types::JdbcType;

use super::assistant::{
    BuilderAssistant, CacheSpec, DiscriminatorSpec, ParameterMappingSpec, ResultMapSpec,
    ResultMappingSpec, StatementGroup, StatementSpec,
};
use super::pending::{resolver, FragmentKey, FragmentKind, Resolution};
use super::{BuildError, Linker};

/// Reads one `mapper` source into the linker
pub struct XmlMapperReader<'l> {
    linker: &'l mut Linker,
    resource: String,
    namespace: String,
}

impl<'l> XmlMapperReader<'l> {
    /// Reader for a source identified by `resource`
    pub fn new(linker: &'l mut Linker, resource: &str) -> Self {
        Self {
            linker,
            resource: resource.to_string(),
            namespace: String::new(),
        }
    }

    /// Read every declaration; returns the mapper's namespace
    pub fn parse(mut self, root: &Node) -> Result<String, BuildError> {
        if root.name() != "mapper" {
            return Err(BuildError::InvalidValue {
                element: self.resource.clone(),
                what: "root element",
                value: root.name().to_string(),
            });
        }
        self.namespace = root
            .non_empty_attr("namespace")
            .ok_or(BuildError::MissingNamespace)?
            .to_string();

        if let Some(cache_ref) = root.child("cache-ref") {
            self.cache_ref_element(cache_ref)?;
        }
        if let Some(cache) = root.child("cache") {
            self.cache_element(cache)?;
        }
        for node in root.children_named("parameterMap") {
            self.parameter_map_element(node)?;
        }
        for node in root.children_named("resultMap") {
            self.result_map_element(&[root, node], Vec::new(), None)?;
        }

        let statements: Vec<&Node> = root
            .children()
            .iter()
            .filter(|n| matches!(n.name(), "select" | "insert" | "update" | "delete"))
            .collect();
        if let Some(database_id) = self.linker.configuration().settings().database_id.clone() {
            for node in &statements {
                self.statement_element(node, Some(&database_id))?;
            }
        }
        for node in &statements {
            self.statement_element(node, None)?;
        }
        Ok(self.namespace)
    }

    fn assistant(&mut self) -> BuilderAssistant<'_> {
        BuilderAssistant::for_namespace(
            self.linker.configuration_mut(),
            self.namespace.as_str(),
            self.resource.as_str(),
        )
    }

    fn resolve_type(&self, name: Option<&str>) -> Result<Option<TypeRef>, BuildError> {
        name.map(|n| self.linker.configuration().resolve_type(n))
            .transpose()
            .map_err(BuildError::from)
    }

    // ========================================================================
    // Caches
    // ========================================================================

    fn cache_ref_element(&mut self, node: &Node) -> Result<(), BuildError> {
        let referenced = node
            .non_empty_attr("namespace")
            .ok_or(BuildError::MissingCacheRefNamespace)?
            .to_string();
        let namespace = self.namespace.clone();
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

    fn cache_element(&mut self, node: &Node) -> Result<(), BuildError> {
        let mut properties = BTreeMap::new();
        for property in node.children_named("property") {
            properties.insert(
                property.required_attr("name")?.to_string(),
                property.required_attr("value")?.to_string(),
            );
        }
        let spec = CacheSpec {
            implementation: node.non_empty_attr("type").map(str::to_string),
            eviction: node.non_empty_attr("eviction").map(str::to_string),
            flush_interval: node.u64_attr("flushInterval")?,
            size: node.u64_attr("size")?,
            read_only: node.bool_attr("readOnly")?.unwrap_or(false),
            blocking: node.bool_attr("blocking")?.unwrap_or(false),
            properties,
        };
        self.assistant().use_new_cache(&spec)?;
        Ok(())
    }

    // ========================================================================
    // Parameter maps
    // ========================================================================

    fn parameter_map_element(&mut self, node: &Node) -> Result<(), BuildError> {
        let id = node.required_attr("id")?;
        let type_ref = self.resolve_type(node.non_empty_attr("type"))?;
        let mut specs = Vec::new();
        for parameter in node.children_named("parameter") {
            specs.push(ParameterMappingSpec {
                property: parameter.required_attr("property")?.to_string(),
                value_type: self.resolve_type(parameter.non_empty_attr("javaType"))?,
                jdbc_type: jdbc_type(parameter)?,
                result_map: parameter.non_empty_attr("resultMap").map(str::to_string),
                mode: match parameter.non_empty_attr("mode") {
                    Some(mode) => mode.parse().map_err(|_| invalid(parameter, "parameter mode", mode))?,
                    None => Default::default(),
                },
                type_handler: parameter.non_empty_attr("typeHandler").map(str::to_string),
                numeric_scale: parameter.u64_attr("numericScale")?,
            });
        }

        let mut assistant = self.assistant();
        let mappings = specs
            .iter()
            .map(|spec| assistant.build_parameter_mapping(type_ref.as_ref(), spec))
            .collect::<Result<Vec<ParameterMapping>, BuildError>>()?;
        assistant.add_parameter_map(id, type_ref, mappings)?;
        Ok(())
    }

    // ========================================================================
    // Result maps
    // ========================================================================

    /// Read a result map (top-level or nested) and hand it to the linker;
    /// returns its qualified id whether or not it resolved yet
    ///
    /// `path` runs from the mapper root to the node being read.
    fn result_map_element(
        &mut self,
        path: &[&Node],
        additional: Vec<ResultMapping>,
        enclosing: Option<&TypeRef>,
    ) -> Result<String, BuildError> {
        let Some(node) = path.last().copied() else {
            return Err(BuildError::InvalidValue {
                element: self.resource.clone(),
                what: "result map path",
                value: String::new(),
            });
        };
        let id = match node.non_empty_attr("id") {
            Some(id) => id.to_string(),
            None => value_based_identifier(path),
        };
        let declared = ["type", "ofType", "resultType", "javaType"]
            .iter()
            .find_map(|attr| node.non_empty_attr(attr));
        let type_ref = match self.resolve_type(declared)? {
            Some(ty) => ty,
            None => self.enclosed_type(node, enclosing),
        };

        let mut mappings = additional;
        let mut discriminator = None;
        for child in node.children() {
            let mut child_path = path.to_vec();
            child_path.push(child);
            match child.name() {
                "constructor" => {
                    for arg in child.children() {
                        let mut flags = vec![ResultFlag::Constructor];
                        if arg.name() == "idArg" {
                            flags.push(ResultFlag::Id);
                        }
                        let mut arg_path = child_path.clone();
                        arg_path.push(arg);
                        mappings.push(self.result_mapping_element(&arg_path, &type_ref, flags)?);
                    }
                }
                "discriminator" => {
                    discriminator = Some(self.discriminator_element(&child_path, &type_ref, &mappings)?);
                }
                "id" | "result" | "association" | "collection" => {
                    let flags = if child.name() == "id" {
                        vec![ResultFlag::Id]
                    } else {
                        Vec::new()
                    };
                    mappings.push(self.result_mapping_element(&child_path, &type_ref, flags)?);
                }
                _ => {}
            }
        }

        let spec = ResultMapSpec {
            id,
            type_ref,
            extends: node.non_empty_attr("extends").map(str::to_string),
            discriminator,
            mappings,
            auto_mapping: node.bool_attr("autoMapping")?,
        };
        let qualified = self.assistant().apply_current_namespace(&spec.id, false)?;
        let key = FragmentKey::new(FragmentKind::ResultMap, self.namespace.clone(), spec.id.clone());
        let namespace = self.namespace.clone();
        let resource = self.resource.clone();
        self.linker.resolve_or_park(
            key,
            resolver(move |config| {
                Ok(BuilderAssistant::for_namespace(config, namespace.as_str(), resource.as_str())
                    .add_result_map(&spec)?
                    .map(|_| ()))
            }),
        )?;
        Ok(qualified)
    }

    /// Type of a nested map that declares none: an association takes the
    /// enclosing property's type, a case takes the enclosing map's type
    fn enclosed_type(&self, node: &Node, enclosing: Option<&TypeRef>) -> TypeRef {
        let Some(enclosing) = enclosing else {
            return TypeRef::object();
        };
        match (node.name(), node.non_empty_attr("property")) {
            ("association", Some(property)) => self
                .linker
                .configuration()
                .meta_class(enclosing)
                .and_then(|meta| meta.setter_type(property))
                .unwrap_or_else(|_| TypeRef::object()),
            ("case", _) => enclosing.clone(),
            _ => TypeRef::object(),
        }
    }

    fn result_mapping_element(
        &mut self,
        path: &[&Node],
        result_type: &TypeRef,
        flags: Vec<ResultFlag>,
    ) -> Result<ResultMapping, BuildError> {
        let Some(node) = path.last().copied() else {
            return Err(BuildError::InvalidValue {
                element: self.resource.clone(),
                what: "result mapping path",
                value: String::new(),
            });
        };
        let property = if flags.contains(&ResultFlag::Constructor) {
            node.non_empty_attr("name")
        } else {
            node.non_empty_attr("property")
        };
        let nested_result_map = match node.non_empty_attr("resultMap") {
            Some(reference) => Some(reference.to_string()),
            None if matches!(node.name(), "association" | "collection")
                && node.attr("select").is_none() =>
            {
                Some(self.result_map_element(path, Vec::new(), Some(result_type))?)
            }
            None => None,
        };
        let lazy = match node.non_empty_attr("fetchType") {
            Some("lazy") => Some(true),
            Some("eager") => Some(false),
            Some(other) => return Err(invalid(node, "fetch type", other)),
            None => None,
        };

        let spec = ResultMappingSpec {
            property: property.map(str::to_string),
            column: node.non_empty_attr("column").map(str::to_string),
            value_type: self.resolve_type(node.non_empty_attr("javaType"))?,
            jdbc_type: jdbc_type(node)?,
            nested_select: node.non_empty_attr("select").map(str::to_string),
            nested_result_map,
            not_null_column: node.non_empty_attr("notNullColumn").map(str::to_string),
            column_prefix: node.non_empty_attr("columnPrefix").map(str::to_string),
            type_handler: node.non_empty_attr("typeHandler").map(str::to_string),
            flags,
            result_set: node.non_empty_attr("resultSet").map(str::to_string),
            foreign_column: node.non_empty_attr("foreignColumn").map(str::to_string),
            lazy,
        };
        self.assistant().build_result_mapping(result_type, spec)
    }

    fn discriminator_element(
        &mut self,
        path: &[&Node],
        result_type: &TypeRef,
        mappings_so_far: &[ResultMapping],
    ) -> Result<crate::mapping::Discriminator, BuildError> {
        let Some(node) = path.last().copied() else {
            return Err(BuildError::InvalidValue {
                element: self.resource.clone(),
                what: "discriminator path",
                value: String::new(),
            });
        };
        let mut cases = Vec::new();
        for case in node.children_named("case") {
            let value = case.required_attr("value")?.to_string();
            let reference = match case.non_empty_attr("resultMap") {
                Some(reference) => reference.to_string(),
                None => {
                    let mut case_path = path.to_vec();
                    case_path.push(case);
                    self.result_map_element(&case_path, mappings_so_far.to_vec(), Some(result_type))?
                }
            };
            cases.push((value, reference));
        }
        let spec = DiscriminatorSpec {
            column: node.non_empty_attr("column").map(str::to_string),
            value_type: self.resolve_type(node.non_empty_attr("javaType"))?,
            jdbc_type: jdbc_type(node)?,
            type_handler: node.non_empty_attr("typeHandler").map(str::to_string),
            cases,
        };
        self.assistant().build_discriminator(result_type, &spec)
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn statement_element(&mut self, node: &Node, required_database_id: Option<&str>) -> Result<(), BuildError> {
        let id = node.required_attr("id")?.to_string();
        let database_id = node.non_empty_attr("databaseId").map(str::to_string);
        if !database_id_matches(required_database_id, database_id.as_deref()) {
            return Ok(());
        }

        let command = CommandKind::from_element(node.name());
        let parameter_type = self.resolve_type(node.non_empty_attr("parameterType"))?;
        let mut spec = StatementSpec::new(id.as_str(), command, SqlSource::text(node.trimmed_text().unwrap_or_default()));
        spec.statement_kind = match node.non_empty_attr("statementType") {
            Some(kind) => kind.parse().map_err(|_| invalid(node, "statement type", kind))?,
            None => Default::default(),
        };
        spec.result_set_kind = match node.non_empty_attr("resultSetType") {
            Some(kind) => kind.parse().map_err(|_| invalid(node, "result set type", kind))?,
            None => Default::default(),
        };
        spec.fetch_size = node.u64_attr("fetchSize")?;
        spec.timeout = node.u64_attr("timeout")?;
        spec.parameter_map = node.non_empty_attr("parameterMap").map(str::to_string);
        spec.parameter_type = parameter_type.clone();
        spec.result_map = node.non_empty_attr("resultMap").map(str::to_string);
        spec.result_type = self.resolve_type(node.non_empty_attr("resultType"))?;
        spec.flush_cache = node.bool_attr("flushCache")?;
        spec.use_cache = node.bool_attr("useCache")?;
        spec.result_ordered = node.bool_attr("resultOrdered")?.unwrap_or(false);
        spec.key_properties = node.list_attr("keyProperty");
        spec.key_columns = node.list_attr("keyColumn");
        spec.database_id = database_id.clone();
        spec.lang = node.non_empty_attr("lang").map(str::to_string);
        spec.result_sets = node.list_attr("resultSets");

        let select_key = self.select_key_element(node, &id, parameter_type.as_ref())?;
        spec.key_generator = match &select_key {
            Some((key, execute_before)) => KeyGenerator::SelectKey {
                statement_id: self.assistant().apply_current_namespace(&key.id, true)?,
                execute_before: *execute_before,
            },
            None => {
                let use_generated = node.bool_attr("useGeneratedKeys")?.unwrap_or(
                    self.linker.configuration().settings().use_generated_keys
                        && command == CommandKind::Insert,
                );
                if use_generated {
                    KeyGenerator::Jdbc3
                } else {
                    KeyGenerator::None
                }
            }
        };

        let qualified = self.assistant().apply_current_namespace(&id, false)?;
        let group = StatementGroup {
            result_maps: Vec::new(),
            select_key: select_key.map(|(key, _)| key),
            statement: spec,
        };
        let key = FragmentKey::new(FragmentKind::Statement, self.namespace.clone(), id);
        let namespace = self.namespace.clone();
        let resource = self.resource.clone();
        self.linker.resolve_or_park(
            key,
            resolver(move |config| {
                // a vendor-specific variant already claimed this id
                if database_id.is_none()
                    && config
                        .get_statement(&qualified)
                        .is_ok_and(|existing| existing.database_id.is_some())
                {
                    return Ok(Resolution::Resolved(()));
                }
                Ok(BuilderAssistant::for_namespace(config, namespace.as_str(), resource.as_str())
                    .add_statement_group(&group)?
                    .map(|_| ()))
            }),
        )?;
        Ok(())
    }

    /// The `selectKey` child matching the active database, if any
    fn select_key_element(
        &self,
        node: &Node,
        parent_id: &str,
        parameter_type: Option<&TypeRef>,
    ) -> Result<Option<(StatementSpec, bool)>, BuildError> {
        let active = self.linker.configuration().settings().database_id.clone();
        let candidates: Vec<&Node> = node.children_named("selectKey").collect();
        let chosen = active
            .as_deref()
            .and_then(|db| {
                candidates
                    .iter()
                    .find(|k| k.non_empty_attr("databaseId") == Some(db))
            })
            .or_else(|| {
                candidates
                    .iter()
                    .find(|k| k.non_empty_attr("databaseId").is_none())
            });
        let Some(key) = chosen else {
            return Ok(None);
        };

        let mut spec = StatementSpec::new(
            format!("{}!selectKey", parent_id),
            CommandKind::Select,
            SqlSource::text(key.trimmed_text().unwrap_or_default()),
        );
        spec.statement_kind = match key.non_empty_attr("statementType") {
            Some(kind) => kind.parse().map_err(|_| invalid(key, "statement type", kind))?,
            None => Default::default(),
        };
        spec.parameter_type = parameter_type.cloned();
        spec.result_type = self.resolve_type(key.non_empty_attr("resultType"))?;
        spec.key_properties = key.list_attr("keyProperty");
        spec.key_columns = key.list_attr("keyColumn");
        spec.flush_cache = Some(false);
        spec.use_cache = Some(false);
        spec.database_id = key.non_empty_attr("databaseId").map(str::to_string);
        let execute_before = key
            .non_empty_attr("order")
            .is_some_and(|order| order.eq_ignore_ascii_case("BEFORE"));
        Ok(Some((spec, execute_before)))
    }
}

/// Vendor pass accepts only matching ids; the generic pass only unmarked ones
fn database_id_matches(required: Option<&str>, declared: Option<&str>) -> bool {
    match required {
        Some(required) => declared == Some(required),
        None => declared.is_none(),
    }
}

fn jdbc_type(node: &Node) -> Result<Option<JdbcType>, BuildError> {
    node.non_empty_attr("jdbcType")
        .map(|text| text.parse().map_err(|_| invalid(node, "jdbc type", text)))
        .transpose()
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
    use crate::reflect::TypeDescriptor;
    use crate::settings::Settings;

    fn linker_with(settings: Settings) -> Linker {
        let config = Configuration::new(settings);
        config
            .catalog()
            .register(
                TypeDescriptor::class("demo.Author")
                    .default_constructor()
                    .property("id", TypeRef::int())
                    .property("name", TypeRef::string()),
            )
            .unwrap();
        config
            .catalog()
            .register(
                TypeDescriptor::class("demo.Blog")
                    .default_constructor()
                    .property("id", TypeRef::int())
                    .property("title", TypeRef::string())
                    .property("author", TypeRef::named("demo.Author")),
            )
            .unwrap();
        Linker::new(config)
    }

    fn blog_mapper() -> Node {
        Node::new("mapper")
            .with_attr("namespace", "demo.BlogMapper")
            .with_child(
                Node::new("resultMap")
                    .with_attr("id", "blogMap")
                    .with_attr("type", "demo.Blog")
                    .with_child(Node::new("id").with_attr("property", "id").with_attr("column", "blog_id"))
                    .with_child(
                        Node::new("association")
                            .with_attr("property", "author")
                            .with_attr("columnPrefix", "author_")
                            .with_child(Node::new("id").with_attr("property", "id").with_attr("column", "id"))
                            .with_child(Node::new("result").with_attr("property", "name").with_attr("column", "name")),
                    )
                    .with_child(
                        Node::new("discriminator")
                            .with_attr("column", "kind")
                            .with_attr("javaType", "string")
                            .with_child(
                                Node::new("case")
                                    .with_attr("value", "draft")
                                    .with_child(Node::new("result").with_attr("property", "title").with_attr("column", "draft_title")),
                            ),
                    ),
            )
            .with_child(
                Node::new("select")
                    .with_attr("id", "selectBlog")
                    .with_attr("resultMap", "blogMap")
                    .with_text("select * from blog where id = #{id}"),
            )
            .with_child(
                Node::new("insert")
                    .with_attr("id", "insertBlog")
                    .with_attr("parameterType", "demo.Blog")
                    .with_child(
                        Node::new("selectKey")
                            .with_attr("keyProperty", "id")
                            .with_attr("resultType", "int")
                            .with_attr("order", "BEFORE")
                            .with_text("select next_id()"),
                    )
                    .with_text("insert into blog values (#{id}, #{title})"),
            )
    }

    #[test]
    fn test_reads_result_maps_and_nested_shapes() {
        let mut linker = linker_with(Settings::default());
        linker.load_mapper("mappers/blog.xml", &blog_mapper()).unwrap();
        assert!(linker.pending().is_empty());

        let config = linker.configuration();
        let blog_map = config.get_result_map("demo.BlogMapper.blogMap").unwrap();
        let author = &blog_map.mappings()[1];
        let nested_id = "demo.BlogMapper.mapper_resultMap[blogMap]_association[author]";
        assert_eq!(author.nested_result_map.as_deref(), Some(nested_id));
        assert_eq!(author.column_prefix.as_deref(), Some("author_"));
        assert_eq!(config.get_result_map(nested_id).unwrap().type_ref(), &TypeRef::named("demo.Author"));

        let discriminator = blog_map.discriminator().unwrap();
        let case_id = discriminator.map_id_for("draft").unwrap();
        let case_map = config.get_result_map(case_id).unwrap();
        // the case sees the parent's mappings read before the discriminator
        assert_eq!(case_map.mappings().len(), 3);
        assert_eq!(case_map.type_ref(), &TypeRef::named("demo.Blog"));
    }

    #[test]
    fn test_select_key_statement() {
        let mut linker = linker_with(Settings::default());
        linker.load_mapper("mappers/blog.xml", &blog_mapper()).unwrap();
        let config = linker.configuration();

        let insert = config.get_statement("demo.BlogMapper.insertBlog").unwrap();
        assert_eq!(
            insert.key_generator,
            KeyGenerator::SelectKey {
                statement_id: "demo.BlogMapper.insertBlog!selectKey".into(),
                execute_before: true,
            }
        );
        assert_eq!(insert.sql.text, "insert into blog values (#{id}, #{title})");
        let key = config.get_statement("demo.BlogMapper.insertBlog!selectKey").unwrap();
        assert_eq!(key.sql.text, "select next_id()");
        assert!(!key.use_cache);
        assert_eq!(key.result_maps[0].type_ref(), &TypeRef::named("Integer"));
    }

    #[test]
    fn test_statement_waits_for_result_map_in_later_source() {
        let mut linker = linker_with(Settings::default());
        let posts = Node::new("mapper").with_attr("namespace", "demo.PostMapper").with_child(
            Node::new("select")
                .with_attr("id", "selectWithBlog")
                .with_attr("resultMap", "demo.BlogMapper.blogMap")
                .with_text("select * from post"),
        );
        linker.load_mapper("mappers/post.xml", &posts).unwrap();
        assert_eq!(linker.pending().count(FragmentKind::Statement), 1);

        linker.load_mapper("mappers/blog.xml", &blog_mapper()).unwrap();
        assert!(linker.pending().is_empty());
        assert!(linker.configuration().has_statement("demo.PostMapper.selectWithBlog"));
    }

    #[test]
    fn test_database_specific_statements() {
        let settings = Settings {
            database_id: Some("pg".into()),
            ..Settings::default()
        };
        let mut linker = linker_with(settings);
        let mapper = Node::new("mapper")
            .with_attr("namespace", "demo.Clock")
            .with_child(Node::new("select").with_attr("id", "now").with_text("select now()"))
            .with_child(
                Node::new("select")
                    .with_attr("id", "now")
                    .with_attr("databaseId", "pg")
                    .with_text("select current_timestamp"),
            )
            .with_child(
                Node::new("select")
                    .with_attr("id", "now")
                    .with_attr("databaseId", "oracle")
                    .with_text("select sysdate from dual"),
            );
        linker.load_mapper("mappers/clock.xml", &mapper).unwrap();
        let now = linker.configuration().get_statement("demo.Clock.now").unwrap();
        assert_eq!(now.sql.text, "select current_timestamp");
        assert_eq!(now.database_id.as_deref(), Some("pg"));
    }

    #[test]
    fn test_resource_loaded_once() {
        let mut linker = linker_with(Settings::default());
        linker.load_mapper("mappers/blog.xml", &blog_mapper()).unwrap();
        linker.load_mapper("mappers/blog.xml", &blog_mapper()).unwrap();
        assert_eq!(linker.configuration().statements().count(), 3);
    }

    #[test]
    fn test_errors_name_the_resource() {
        let mut linker = linker_with(Settings::default());
        let mapper = Node::new("mapper")
            .with_attr("namespace", "demo.Bad")
            .with_child(Node::new("select").with_attr("id", "other.find").with_text("select 1"));
        let err = linker.load_mapper("mappers/bad.xml", &mapper).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error parsing mapper resource 'mappers/bad.xml': Dots are not allowed in element names, please remove it from other.find"
        );

        let unnamed = Node::new("mapper");
        assert!(matches!(
            linker.load_mapper("mappers/none.xml", &unnamed),
            Err(BuildError::InResource { source, .. }) if matches!(*source, BuildError::MissingNamespace)
        ));
    }
}
