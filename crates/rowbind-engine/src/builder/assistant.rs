//! Builder assistant
//!
//! Qualifies local ids into the namespace, fills in omitted types through
//! the property-path resolver, and commits finished entities into the
//! [`Configuration`]. Every commit method first checks that all referenced
//! entities exist and reports [`Resolution::Pending`] without touching the
//! registry when one is missing.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::mapping::{
    Cache, CommandKind, Configuration, Discriminator, KeyGenerator, MappedStatement, ParameterMap,
    ParameterMapping, ParameterMode, ResultFlag, ResultMap, ResultMapping, ResultSetKind, SqlSource,
    StatementKind,
};
use crate::reflect::TypeRef;
use crate::types::{JdbcType, TypeHandlerRef};

use super::pending::{try_resolve, Resolution};
use super::BuildError;

/// Settings of a newly declared cache
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheSpec {
    /// Base implementation name (defaults to `PERPETUAL`)
    pub implementation: Option<String>,
    /// Eviction policy name (defaults to `LRU`)
    pub eviction: Option<String>,
    /// Flush interval in milliseconds
    pub flush_interval: Option<u64>,
    /// Maximum number of entries
    pub size: Option<u64>,
    /// Hand out shared instances instead of copies
    pub read_only: bool,
    /// Block concurrent misses for the same key
    pub blocking: bool,
    /// Implementation-specific properties
    pub properties: BTreeMap<String, String>,
}

/// Inputs of one parameter mapping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterMappingSpec {
    /// Property path read from the parameter object
    pub property: String,
    /// Explicit value type
    pub value_type: Option<TypeRef>,
    /// Column type
    pub jdbc_type: Option<JdbcType>,
    /// Result map for cursor out-parameters (reference)
    pub result_map: Option<String>,
    /// Direction
    pub mode: ParameterMode,
    /// Explicit handler name
    pub type_handler: Option<String>,
    /// Numeric scale
    pub numeric_scale: Option<u64>,
}

/// Inputs of one result mapping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultMappingSpec {
    /// Target property or constructor parameter name
    pub property: Option<String>,
    /// Source column, or `{prop=col,...}` composite
    pub column: Option<String>,
    /// Explicit value type
    pub value_type: Option<TypeRef>,
    /// Column type
    pub jdbc_type: Option<JdbcType>,
    /// Nested select (reference)
    pub nested_select: Option<String>,
    /// Nested result map (reference)
    pub nested_result_map: Option<String>,
    /// Comma-separated non-null columns
    pub not_null_column: Option<String>,
    /// Column prefix for the nested result map
    pub column_prefix: Option<String>,
    /// Explicit handler name
    pub type_handler: Option<String>,
    /// Role flags
    pub flags: Vec<ResultFlag>,
    /// Named result set
    pub result_set: Option<String>,
    /// Foreign column in the named result set
    pub foreign_column: Option<String>,
    /// Explicit fetch mode; `None` follows the lazy-loading setting
    pub lazy: Option<bool>,
}

/// Inputs of a discriminator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscriminatorSpec {
    /// Column read to pick a case
    pub column: Option<String>,
    /// Value type
    pub value_type: Option<TypeRef>,
    /// Column type
    pub jdbc_type: Option<JdbcType>,
    /// Explicit handler name
    pub type_handler: Option<String>,
    /// Column value → result map reference
    pub cases: Vec<(String, String)>,
}

/// A result map ready to commit
#[derive(Debug, Clone, PartialEq)]
pub struct ResultMapSpec {
    /// Local or qualified id
    pub id: String,
    /// Target type
    pub type_ref: TypeRef,
    /// Parent result map (reference)
    pub extends: Option<String>,
    /// Built discriminator
    pub discriminator: Option<Discriminator>,
    /// Local mappings in declaration order
    pub mappings: Vec<ResultMapping>,
    /// Explicit auto-mapping switch
    pub auto_mapping: Option<bool>,
}

/// A statement ready to commit
#[derive(Debug, Clone, PartialEq)]
pub struct StatementSpec {
    /// Local or qualified id
    pub id: String,
    /// Command kind
    pub command: CommandKind,
    /// Statement kind
    pub statement_kind: StatementKind,
    /// Statement text
    pub sql: SqlSource,
    /// Fetch size hint
    pub fetch_size: Option<u64>,
    /// Timeout in seconds
    pub timeout: Option<u64>,
    /// Parameter map (reference)
    pub parameter_map: Option<String>,
    /// Inline parameter type
    pub parameter_type: Option<TypeRef>,
    /// Comma-separated result maps (references)
    pub result_map: Option<String>,
    /// Inline result type
    pub result_type: Option<TypeRef>,
    /// Result set scrollability
    pub result_set_kind: ResultSetKind,
    /// Explicit flush switch; defaults to "not a select"
    pub flush_cache: Option<bool>,
    /// Explicit cache switch; defaults to "is a select"
    pub use_cache: Option<bool>,
    /// Nested results arrive grouped
    pub result_ordered: bool,
    /// Generated key source
    pub key_generator: KeyGenerator,
    /// Properties receiving generated keys
    pub key_properties: Vec<String>,
    /// Columns holding generated keys
    pub key_columns: Vec<String>,
    /// Vendor id
    pub database_id: Option<String>,
    /// Scripting language driver name
    pub lang: Option<String>,
    /// Named result sets
    pub result_sets: Vec<String>,
}

impl StatementSpec {
    /// Statement with default options
    pub fn new(id: impl Into<String>, command: CommandKind, sql: SqlSource) -> Self {
        Self {
            id: id.into(),
            command,
            statement_kind: StatementKind::default(),
            sql,
            fetch_size: None,
            timeout: None,
            parameter_map: None,
            parameter_type: None,
            result_map: None,
            result_type: None,
            result_set_kind: ResultSetKind::default(),
            flush_cache: None,
            use_cache: None,
            result_ordered: false,
            key_generator: KeyGenerator::None,
            key_properties: Vec::new(),
            key_columns: Vec::new(),
            database_id: None,
            lang: None,
            result_sets: Vec::new(),
        }
    }

    fn result_map_refs(&self) -> impl Iterator<Item = &str> {
        self.result_map
            .as_deref()
            .into_iter()
            .flat_map(|list| list.split(','))
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// A statement committed together with the entities it alone depends on
#[derive(Debug, Clone, PartialEq)]
pub struct StatementGroup {
    /// Result maps generated for this statement, parents first
    pub result_maps: Vec<ResultMapSpec>,
    /// Key statement run around the main statement
    pub select_key: Option<StatementSpec>,
    /// The statement itself
    pub statement: StatementSpec,
}

/// Per-source builder over the global registry
pub struct BuilderAssistant<'c> {
    config: &'c mut Configuration,
    namespace: Option<String>,
    resource: String,
}

impl<'c> BuilderAssistant<'c> {
    /// Assistant for a source with no namespace yet
    pub fn new(config: &'c mut Configuration, resource: impl Into<String>) -> Self {
        Self {
            config,
            namespace: None,
            resource: resource.into(),
        }
    }

    /// Assistant bound to a namespace
    pub fn for_namespace(
        config: &'c mut Configuration,
        namespace: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            config,
            namespace: Some(namespace.into()),
            resource: resource.into(),
        }
    }

    /// The registry
    pub fn configuration(&self) -> &Configuration {
        self.config
    }

    /// The registry, mutable
    pub fn configuration_mut(&mut self) -> &mut Configuration {
        self.config
    }

    /// Namespace in effect
    pub fn current_namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Source being built
    pub fn resource(&self) -> &str {
        &self.resource
    }

    // ========================================================================
    // Namespaces
    // ========================================================================

    /// Set the namespace; it may not change once set
    pub fn set_current_namespace(&mut self, namespace: Option<&str>) -> Result<(), BuildError> {
        let namespace = match namespace {
            Some(ns) if !ns.is_empty() => ns,
            _ => return Err(BuildError::MissingNamespace),
        };
        if let Some(current) = &self.namespace {
            if current != namespace {
                return Err(BuildError::NamespaceMismatch {
                    expected: current.clone(),
                    found: namespace.to_string(),
                });
            }
        }
        self.namespace = Some(namespace.to_string());
        Ok(())
    }

    /// Qualify an id with the current namespace
    ///
    /// References containing a dot are taken as already qualified. Local
    /// declarations may only contain dots when qualified with the current
    /// namespace itself.
    pub fn apply_current_namespace(&self, base: &str, is_reference: bool) -> Result<String, BuildError> {
        let namespace = self.namespace.as_deref().ok_or(BuildError::MissingNamespace)?;
        if is_reference {
            if base.contains('.') {
                return Ok(base.to_string());
            }
        } else {
            if base.starts_with(namespace) && base[namespace.len()..].starts_with('.') {
                return Ok(base.to_string());
            }
            if base.contains('.') {
                return Err(BuildError::DottedId(base.to_string()));
            }
        }
        Ok(format!("{}.{}", namespace, base))
    }

    fn qualify_ref(&self, reference: Option<&str>) -> Result<Option<String>, BuildError> {
        reference
            .map(|r| self.apply_current_namespace(r, true))
            .transpose()
    }

    fn namespace_key(&self) -> Result<String, BuildError> {
        self.namespace.clone().ok_or(BuildError::MissingNamespace)
    }

    // ========================================================================
    // Caches
    // ========================================================================

    /// Share another namespace's cache
    ///
    /// Marks the namespace as having an unresolved cache reference until the
    /// referenced cache exists; statements built meanwhile stay pending.
    pub fn use_cache_ref(&mut self, referenced: &str) -> Result<Resolution<Arc<Cache>>, BuildError> {
        if referenced.is_empty() {
            return Err(BuildError::MissingCacheRefNamespace);
        }
        let namespace = self.namespace_key()?;
        let cache = self.config.get_cache(referenced).ok().cloned();
        let state = self.config.namespace_state_mut(&namespace);
        match cache {
            Some(cache) => {
                state.current_cache = Some(cache.clone());
                state.unresolved_cache_ref = false;
                Ok(Resolution::Resolved(cache))
            }
            None => {
                state.unresolved_cache_ref = true;
                Ok(Resolution::Pending(format!(
                    "No cache for namespace '{}' could be found.",
                    referenced
                )))
            }
        }
    }

    /// Declare this namespace's own cache
    pub fn use_new_cache(&mut self, spec: &CacheSpec) -> Result<Arc<Cache>, BuildError> {
        let namespace = self.namespace_key()?;
        let mut cache = Cache::new(namespace.clone());
        if let Some(implementation) = &spec.implementation {
            cache.implementation = implementation.clone();
        }
        if let Some(eviction) = &spec.eviction {
            cache.eviction = eviction.clone();
        }
        cache.flush_interval = spec.flush_interval;
        cache.size = spec.size;
        cache.read_write = !spec.read_only;
        cache.blocking = spec.blocking;
        cache.properties = spec.properties.clone();

        let cache = self.config.add_cache(cache)?;
        self.config.namespace_state_mut(&namespace).current_cache = Some(cache.clone());
        Ok(cache)
    }

    // ========================================================================
    // Parameter maps
    // ========================================================================

    /// Commit a named parameter map
    pub fn add_parameter_map(
        &mut self,
        id: &str,
        type_ref: Option<TypeRef>,
        mappings: Vec<ParameterMapping>,
    ) -> Result<Arc<ParameterMap>, BuildError> {
        let id = self.apply_current_namespace(id, false)?;
        Ok(self.config.add_parameter_map(ParameterMap {
            id,
            type_ref,
            mappings,
        })?)
    }

    /// Build one parameter mapping, inferring the value type when omitted
    pub fn build_parameter_mapping(
        &self,
        parameter_type: Option<&TypeRef>,
        spec: &ParameterMappingSpec,
    ) -> Result<ParameterMapping, BuildError> {
        let result_map_id = self.qualify_ref(spec.result_map.as_deref())?;
        let value_type = match &spec.value_type {
            Some(ty) => ty.clone(),
            None => self.parameter_value_type(parameter_type, &spec.property, spec.jdbc_type),
        };
        let type_handler = self.type_handler(&value_type, spec.jdbc_type, spec.type_handler.as_deref());
        Ok(ParameterMapping {
            property: spec.property.clone(),
            mode: spec.mode,
            value_type,
            jdbc_type: spec.jdbc_type,
            numeric_scale: spec.numeric_scale,
            type_handler,
            result_map_id,
        })
    }

    fn parameter_value_type(
        &self,
        owner: Option<&TypeRef>,
        property: &str,
        jdbc_type: Option<JdbcType>,
    ) -> TypeRef {
        if jdbc_type == Some(JdbcType::Cursor) {
            return TypeRef::named("Cursor");
        }
        let Some(owner) = owner else {
            return TypeRef::object();
        };
        if self.config.catalog().is_map(owner) {
            return TypeRef::object();
        }
        self.config
            .meta_class(owner)
            .and_then(|meta| meta.getter_type(property))
            .unwrap_or_else(|_| TypeRef::object())
    }

    // ========================================================================
    // Result maps
    // ========================================================================

    /// Build one result mapping, inferring the value type when omitted
    pub fn build_result_mapping(
        &self,
        result_type: &TypeRef,
        spec: ResultMappingSpec,
    ) -> Result<ResultMapping, BuildError> {
        let value_type = match spec.value_type {
            Some(ty) => ty,
            None => self.result_value_type(result_type, spec.property.as_deref()),
        };
        let nested_select = self.qualify_ref(spec.nested_select.as_deref())?;
        let nested_result_map = self.qualify_ref(spec.nested_result_map.as_deref())?;
        let type_handler = match (&spec.type_handler, &nested_select, &nested_result_map) {
            (Some(name), _, _) => Some(TypeHandlerRef::new(name)),
            (None, None, None) => Some(self.config.handlers().handler_for(&value_type, spec.jdbc_type)),
            _ => None,
        };
        let composites = parse_composite_columns(spec.column.as_deref())
            .into_iter()
            .map(|(property, column)| {
                let mut composite = ResultMapping::new(Some(property), Some(column), TypeRef::object());
                composite.type_handler = Some(self.config.handlers().handler_for(&TypeRef::object(), None));
                composite
            })
            .collect();

        let mut mapping = ResultMapping::new(spec.property, spec.column, value_type);
        mapping.jdbc_type = spec.jdbc_type;
        mapping.type_handler = type_handler;
        mapping.nested_select = nested_select;
        mapping.nested_result_map = nested_result_map;
        mapping.not_null_columns = parse_multiple_columns(spec.not_null_column.as_deref());
        mapping.column_prefix = spec.column_prefix;
        mapping.composites = composites;
        mapping.result_set = spec.result_set;
        mapping.foreign_column = spec.foreign_column;
        mapping.lazy = spec
            .lazy
            .unwrap_or(self.config.settings().lazy_loading_enabled);
        for flag in spec.flags {
            mapping = mapping.with_flag(flag);
        }
        Ok(mapping)
    }

    fn result_value_type(&self, result_type: &TypeRef, property: Option<&str>) -> TypeRef {
        let Some(property) = property else {
            return TypeRef::object();
        };
        self.config
            .meta_class(result_type)
            .and_then(|meta| meta.setter_type(property))
            .unwrap_or_else(|_| TypeRef::object())
    }

    /// Build a discriminator; case references are qualified
    pub fn build_discriminator(
        &self,
        result_type: &TypeRef,
        spec: &DiscriminatorSpec,
    ) -> Result<Discriminator, BuildError> {
        let mapping = self.build_result_mapping(
            result_type,
            ResultMappingSpec {
                column: spec.column.clone(),
                value_type: spec.value_type.clone(),
                jdbc_type: spec.jdbc_type,
                type_handler: spec.type_handler.clone(),
                ..ResultMappingSpec::default()
            },
        )?;
        let mut cases = BTreeMap::new();
        for (value, reference) in &spec.cases {
            cases.insert(value.clone(), self.apply_current_namespace(reference, true)?);
        }
        Ok(Discriminator { mapping, cases })
    }

    /// Commit a result map, merging in its parent's mappings
    ///
    /// Inherited mappings overridden by a local mapping of the same identity
    /// are dropped; if any local mapping is a constructor argument, every
    /// inherited constructor argument is dropped too. Local mappings come
    /// first.
    pub fn add_result_map(&mut self, spec: &ResultMapSpec) -> Result<Resolution<Arc<ResultMap>>, BuildError> {
        let id = self.apply_current_namespace(&spec.id, false)?;
        let extends = self.qualify_ref(spec.extends.as_deref())?;
        let mut mappings = spec.mappings.clone();

        if let Some(parent_id) = &extends {
            if !self.config.has_result_map(parent_id) {
                return Ok(Resolution::Pending(format!(
                    "Could not find a parent resultmap with id '{}'",
                    parent_id
                )));
            }
            let parent = self.config.get_result_map(parent_id)?.clone();
            let overridden: Vec<String> = mappings
                .iter()
                .filter_map(|m| m.identity().map(str::to_string))
                .collect();
            let declares_constructor = mappings.iter().any(ResultMapping::is_constructor);
            let inherited: Vec<ResultMapping> = parent
                .mappings()
                .iter()
                .filter(|m| !m.identity().is_some_and(|key| overridden.iter().any(|o| o == key)))
                .filter(|m| !(declares_constructor && m.is_constructor()))
                .cloned()
                .collect();
            mappings.extend(inherited);
        }

        let result_map = ResultMap::new(
            id,
            spec.type_ref.clone(),
            mappings,
            spec.discriminator.clone(),
            spec.auto_mapping,
        );
        Ok(Resolution::Resolved(self.config.add_result_map(result_map)?))
    }

    // ========================================================================
    // Statements
    // ========================================================================

    /// Check that everything a statement references exists
    ///
    /// `provided` lists qualified result map ids that will be committed
    /// alongside the statement.
    pub fn statement_ready(
        &self,
        spec: &StatementSpec,
        provided: &[String],
    ) -> Result<Resolution<()>, BuildError> {
        let namespace = self.namespace_key()?;
        if self
            .config
            .namespace_state(&namespace)
            .is_some_and(|state| state.unresolved_cache_ref)
        {
            return Ok(Resolution::Pending("Cache-ref not yet resolved".to_string()));
        }
        for name in spec.result_map_refs() {
            let id = self.apply_current_namespace(name, true)?;
            if !provided.contains(&id) && !self.config.has_result_map(&id) {
                return Ok(Resolution::Pending(format!("Could not find result map '{}'", id)));
            }
        }
        if let Some(name) = self.qualify_ref(spec.parameter_map.as_deref())? {
            if !self.config.has_parameter_map(&name) {
                return Ok(Resolution::Pending(format!("Could not find parameter map '{}'", name)));
            }
        }
        Ok(Resolution::Resolved(()))
    }

    /// Commit a statement
    ///
    /// Defers while the namespace's cache reference is unresolved or a
    /// referenced result map or parameter map is missing. A select with
    /// neither a result map nor a result type gets no result maps.
    pub fn add_mapped_statement(
        &mut self,
        spec: &StatementSpec,
    ) -> Result<Resolution<Arc<MappedStatement>>, BuildError> {
        let id = self.apply_current_namespace(&spec.id, false)?;
        if spec.result_map.is_some() && spec.result_type.is_some() {
            return Err(BuildError::ConflictingOutputShape(id));
        }
        try_resolve!(self.statement_ready(spec, &[]));

        let mut result_maps = Vec::new();
        for name in spec.result_map_refs() {
            let reference = self.apply_current_namespace(name, true)?;
            result_maps.push(self.config.get_result_map(&reference)?.clone());
        }
        if result_maps.is_empty() {
            if let Some(result_type) = &spec.result_type {
                result_maps.push(Arc::new(ResultMap::new(
                    format!("{}-Inline", id),
                    result_type.clone(),
                    Vec::new(),
                    None,
                    None,
                )));
            }
        }

        let parameter_map = match self.qualify_ref(spec.parameter_map.as_deref())? {
            Some(name) => self.config.get_parameter_map(&name)?.clone(),
            None => Arc::new(ParameterMap::inline(
                format!("{}-Inline", id),
                spec.parameter_type.clone(),
            )),
        };

        let is_select = spec.command.is_select();
        let settings = self.config.settings();
        let cache = if settings.cache_enabled {
            self.namespace
                .as_deref()
                .and_then(|ns| self.config.namespace_state(ns))
                .and_then(|state| state.current_cache.clone())
        } else {
            None
        };

        let statement = MappedStatement {
            id,
            resource: self.resource.clone(),
            command: spec.command,
            statement_kind: spec.statement_kind,
            sql: spec.sql.clone(),
            parameter_map,
            result_maps,
            fetch_size: spec.fetch_size.or(settings.default_fetch_size),
            timeout: spec.timeout.or(settings.default_statement_timeout),
            result_set_kind: spec.result_set_kind,
            flush_cache: spec.flush_cache.unwrap_or(!is_select),
            use_cache: spec.use_cache.unwrap_or(is_select),
            result_ordered: spec.result_ordered,
            cache,
            key_generator: spec.key_generator.clone(),
            key_properties: spec.key_properties.clone(),
            key_columns: spec.key_columns.clone(),
            database_id: spec.database_id.clone(),
            lang: spec.lang.clone(),
            result_sets: spec.result_sets.clone(),
        };
        Ok(Resolution::Resolved(self.config.add_statement(statement)?))
    }

    /// Commit a statement with its generated result maps and key statement
    ///
    /// Nothing is committed until every external reference of the group
    /// resolves.
    pub fn add_statement_group(
        &mut self,
        group: &StatementGroup,
    ) -> Result<Resolution<Arc<MappedStatement>>, BuildError> {
        let mut provided = Vec::with_capacity(group.result_maps.len());
        for map in &group.result_maps {
            if let Some(parent) = self.qualify_ref(map.extends.as_deref())? {
                if !provided.contains(&parent) && !self.config.has_result_map(&parent) {
                    return Ok(Resolution::Pending(format!(
                        "Could not find a parent resultmap with id '{}'",
                        parent
                    )));
                }
            }
            provided.push(self.apply_current_namespace(&map.id, false)?);
        }
        try_resolve!(self.statement_ready(&group.statement, &provided));
        if let Some(key) = &group.select_key {
            try_resolve!(self.statement_ready(key, &provided));
        }

        for map in &group.result_maps {
            try_resolve!(self.add_result_map(map));
        }
        if let Some(key) = &group.select_key {
            try_resolve!(self.add_mapped_statement(key));
        }
        self.add_mapped_statement(&group.statement)
    }

    /// Handler for a value type, or the explicitly named one
    fn type_handler(&self, value_type: &TypeRef, jdbc_type: Option<JdbcType>, explicit: Option<&str>) -> TypeHandlerRef {
        match explicit {
            Some(name) => TypeHandlerRef::new(name),
            None => self.config.handlers().handler_for(value_type, jdbc_type),
        }
    }
}

/// Split `{prop=col,prop2=col2}` into pairs; plain column names yield none
fn parse_composite_columns(column: Option<&str>) -> Vec<(String, String)> {
    let Some(column) = column else {
        return Vec::new();
    };
    if !column.contains('=') && !column.contains(',') {
        return Vec::new();
    }
    let tokens: Vec<&str> = column
        .split(|c: char| matches!(c, '{' | '}' | '=' | ',' | ' '))
        .filter(|t| !t.is_empty())
        .collect();
    tokens
        .chunks_exact(2)
        .map(|pair| (pair[0].to_string(), pair[1].to_string()))
        .collect()
}

fn parse_multiple_columns(columns: Option<&str>) -> Vec<String> {
    let Some(columns) = columns else {
        return Vec::new();
    };
    let mut out: Vec<String> = Vec::new();
    for column in columns
        .split(|c: char| matches!(c, '{' | '}' | ',' | ' '))
        .filter(|t| !t.is_empty())
    {
        if !out.iter().any(|c| c == column) {
            out.push(column.to_string());
        }
    }
    out
}
