//! Mapper method classification and dispatch

use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::executor::{ExecutionError, ResultHandlerRef, RowBounds, Session};
use crate::mapping::{CommandKind, Configuration, StatementKind};
use crate::reflect::{MethodDecl, TypeCatalog, TypeDescriptor, TypeRef};
use crate::value::Value;

use super::param::ParamNameResolver;
use super::BindingError;

/// Methods of an interface and every interface it extends, nearest
/// declaration first, paired with the declaring interface's name
///
/// Bridge and default methods are skipped; an overridden method appears
/// once, as declared by the nearest interface.
pub(crate) fn interface_methods(catalog: &TypeCatalog, interface: &Arc<TypeDescriptor>) -> Vec<(MethodDecl, String)> {
    let mut seen_types = FxHashSet::default();
    let mut seen_methods = FxHashSet::default();
    let mut queue = std::collections::VecDeque::from([interface.clone()]);
    let mut methods = Vec::new();
    while let Some(current) = queue.pop_front() {
        if !seen_types.insert(current.name().to_string()) {
            continue;
        }
        for method in current.methods() {
            if method.bridge || method.default_method {
                continue;
            }
            if seen_methods.insert(method.call_key()) {
                methods.push((method.clone(), current.name().to_string()));
            }
        }
        queue.extend(current.interfaces().iter().filter_map(|name| catalog.get(name)));
    }
    methods
}

// ============================================================================
// Statement lookup
// ============================================================================

/// The statement a method runs
#[derive(Debug, Clone, PartialEq)]
pub struct SqlCommand {
    /// Qualified statement id; `None` for flush methods
    pub name: Option<String>,
    /// What the statement does
    pub kind: CommandKind,
}

impl SqlCommand {
    /// Find the statement for `method`, declared by `declaring`, when called
    /// through `interface`
    ///
    /// `interface.method` is tried first, then the super-interfaces of
    /// `interface` that extend the declaring interface.
    pub fn new(
        config: &Configuration,
        interface: &TypeDescriptor,
        method: &MethodDecl,
        declaring: &str,
    ) -> Result<Self, BindingError> {
        match resolve_statement(config, interface, &method.name, declaring) {
            Some(id) => {
                let kind = config
                    .get_statement(&id)
                    .map(|statement| statement.command)
                    .unwrap_or(CommandKind::Unknown);
                if kind == CommandKind::Unknown {
                    return Err(BindingError::UnknownCommand(id));
                }
                Ok(Self { name: Some(id), kind })
            }
            None if method.annotation("Flush").is_some() => Ok(Self {
                name: None,
                kind: CommandKind::Flush,
            }),
            None => Err(BindingError::StatementNotFound(format!(
                "{}.{}",
                interface.name(),
                method.name
            ))),
        }
    }
}

fn resolve_statement(config: &Configuration, interface: &TypeDescriptor, method: &str, declaring: &str) -> Option<String> {
    let id = format!("{}.{}", interface.name(), method);
    if config.has_statement(&id) {
        return Some(id);
    }
    if interface.name() == declaring {
        return None;
    }
    let catalog = config.catalog();
    interface
        .interfaces()
        .iter()
        .filter(|parent| catalog.is_subtype(parent, declaring))
        .filter_map(|parent| catalog.get(parent))
        .find_map(|parent| resolve_statement(config, &parent, method, declaring))
}

// ============================================================================
// Return-shape classification
// ============================================================================

/// How a method's arguments and result are shaped
#[derive(Debug, Clone)]
pub struct MethodSignature {
    return_type: TypeRef,
    returns_many: bool,
    returns_void: bool,
    returns_cursor: bool,
    map_key: Option<String>,
    row_bounds_index: Option<usize>,
    handler_index: Option<usize>,
    params: ParamNameResolver,
}

impl MethodSignature {
    /// Classify a method
    pub fn new(config: &Configuration, method: &MethodDecl) -> Result<Self, BindingError> {
        let catalog = config.catalog();
        let return_type = method.return_type.clone();
        let raw = return_type.erasure();
        let map_key = if catalog.is_map(&raw) {
            method
                .annotation("MapKey")
                .and_then(|a| a.attr("value"))
                .map(str::to_string)
        } else {
            None
        };
        Ok(Self {
            returns_many: return_type.is_array() || config.object_factory().is_collection(&raw),
            returns_void: return_type.is_void(),
            returns_cursor: raw == TypeRef::named("Cursor"),
            map_key,
            row_bounds_index: control_index(catalog, method, "RowBounds")?,
            handler_index: control_index(catalog, method, "ResultHandler")?,
            params: ParamNameResolver::new(config, method),
            return_type,
        })
    }

    /// Declared return type
    pub fn return_type(&self) -> &TypeRef {
        &self.return_type
    }

    /// Returns a collection or array
    pub fn returns_many(&self) -> bool {
        self.returns_many
    }

    /// Returns a map keyed by a `MapKey` property
    pub fn returns_map(&self) -> bool {
        self.map_key.is_some()
    }

    /// Returns nothing
    pub fn returns_void(&self) -> bool {
        self.returns_void
    }

    /// Returns a cursor
    pub fn returns_cursor(&self) -> bool {
        self.returns_cursor
    }

    /// Property keying a returned map
    pub fn map_key(&self) -> Option<&str> {
        self.map_key.as_deref()
    }

    /// Position of the `RowBounds` parameter
    pub fn row_bounds_index(&self) -> Option<usize> {
        self.row_bounds_index
    }

    /// Position of the `ResultHandler` parameter
    pub fn handler_index(&self) -> Option<usize> {
        self.handler_index
    }

    /// Parameter value for a call
    pub fn convert_args(&self, args: &[Value]) -> Value {
        self.params.named_params(args)
    }

    fn row_bounds(&self, args: &[Value]) -> RowBounds {
        match self.row_bounds_index.and_then(|i| args.get(i)) {
            Some(Value::Bounds(bounds)) => *bounds,
            _ => RowBounds::default(),
        }
    }

    fn handler<'a>(&self, args: &'a [Value]) -> Option<&'a ResultHandlerRef> {
        match self.handler_index.and_then(|i| args.get(i)) {
            Some(Value::Handler(handler)) => Some(handler),
            _ => None,
        }
    }
}

fn control_index(catalog: &TypeCatalog, method: &MethodDecl, control: &'static str) -> Result<Option<usize>, BindingError> {
    let target = TypeRef::named(control);
    let mut found = None;
    for (index, param) in method.params.iter().enumerate() {
        if catalog.is_assignable(&target, &param.ty) {
            if found.is_some() {
                return Err(BindingError::MultipleControlParams {
                    method: method.name.clone(),
                    control,
                });
            }
            found = Some(index);
        }
    }
    Ok(found)
}

// ============================================================================
// Dispatch
// ============================================================================

/// A classified mapper method, ready to execute
#[derive(Debug, Clone)]
pub struct MapperMethod {
    method_name: String,
    command: SqlCommand,
    signature: MethodSignature,
}

impl MapperMethod {
    /// Classify `method` of `interface`, declared by `declaring`
    pub fn new(
        config: &Configuration,
        interface: &TypeDescriptor,
        method: &MethodDecl,
        declaring: &str,
    ) -> Result<Self, BindingError> {
        Ok(Self {
            method_name: format!("{}.{}", interface.name(), method.name),
            command: SqlCommand::new(config, interface, method, declaring)?,
            signature: MethodSignature::new(config, method)?,
        })
    }

    /// The statement this method runs
    pub fn command(&self) -> &SqlCommand {
        &self.command
    }

    /// The method's classification
    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    /// Run the statement and convert its result to the declared return type
    pub fn execute(&self, session: &Session, args: &[Value]) -> Result<Value, BindingError> {
        let statement = self.command.name.as_deref().unwrap_or_default();
        let param = self.signature.convert_args(args);
        let result = match self.command.kind {
            CommandKind::Insert => {
                let rows = session.insert(statement, &param).map_err(|e| self.failed(e))?;
                self.row_count_result(rows)?
            }
            CommandKind::Update => {
                let rows = session.update(statement, &param).map_err(|e| self.failed(e))?;
                self.row_count_result(rows)?
            }
            CommandKind::Delete => {
                let rows = session.delete(statement, &param).map_err(|e| self.failed(e))?;
                self.row_count_result(rows)?
            }
            CommandKind::Select => self.select(session, statement, &param, args)?,
            CommandKind::Flush => {
                let batches = session.flush_statements().map_err(|e| self.failed(e))?;
                Value::List(
                    batches
                        .into_iter()
                        .map(|batch| {
                            Value::Map(
                                [
                                    ("statementId".to_string(), Value::Str(batch.statement_id)),
                                    (
                                        "updateCounts".to_string(),
                                        Value::List(batch.update_counts.into_iter().map(Value::Long).collect()),
                                    ),
                                ]
                                .into_iter()
                                .collect(),
                            )
                        })
                        .collect(),
                )
            }
            CommandKind::Unknown => return Err(BindingError::UnknownCommand(statement.to_string())),
        };

        let return_type = self.signature.return_type();
        if result.is_null() && return_type.is_primitive() && !self.signature.returns_void() {
            return Err(BindingError::NullToPrimitive {
                method: self.method_name.clone(),
                return_type: return_type.to_string(),
            });
        }
        Ok(result)
    }

    fn select(&self, session: &Session, statement: &str, param: &Value, args: &[Value]) -> Result<Value, BindingError> {
        let signature = &self.signature;
        let bounds = signature.row_bounds(args);
        if signature.returns_void() {
            if let Some(handler) = signature.handler(args) {
                self.check_handler_target(session, statement)?;
                session
                    .select_with_handler(statement, param, bounds, handler)
                    .map_err(|e| self.failed(e))?;
                return Ok(Value::Null);
            }
        }
        if signature.returns_many() {
            let rows = session
                .select_list(statement, param, bounds)
                .map_err(|e| self.failed(e))?;
            return self.convert_many(session.configuration(), rows);
        }
        if let Some(map_key) = signature.map_key() {
            let keyed = session
                .select_map(statement, param, map_key, bounds)
                .map_err(|e| self.failed(e))?;
            return Ok(Value::KeyedMap(keyed));
        }
        if signature.returns_cursor() {
            let cursor = session
                .select_cursor(statement, param, bounds)
                .map_err(|e| self.failed(e))?;
            return Ok(Value::Cursor(cursor));
        }
        session.select_one(statement, param).map_err(|e| self.failed(e))
    }

    fn check_handler_target(&self, session: &Session, statement: &str) -> Result<(), BindingError> {
        let Ok(mapped) = session.configuration().get_statement(statement) else {
            return Ok(());
        };
        let maps_to_nothing = mapped
            .result_maps
            .first()
            .map_or(true, |map| map.type_ref().is_void());
        if mapped.statement_kind != StatementKind::Callable && maps_to_nothing {
            return Err(BindingError::HandlerWithoutResultType(mapped.id.clone()));
        }
        Ok(())
    }

    /// Rows as the declared collection or array type
    fn convert_many(&self, config: &Configuration, rows: Vec<Value>) -> Result<Value, BindingError> {
        let return_type = self.signature.return_type();
        if config
            .catalog()
            .is_assignable(&return_type.erasure(), &TypeRef::named("ArrayList"))
        {
            return Ok(Value::List(rows));
        }
        if matches!(return_type.component(), Some(TypeRef::Primitive(_))) && rows.iter().any(Value::is_null) {
            return Err(BindingError::NullInPrimitiveArray {
                method: self.method_name.clone(),
                return_type: return_type.to_string(),
            });
        }
        let mut collection = config.object_factory().create(return_type)?;
        collection.extend_collection(rows)?;
        Ok(collection)
    }

    fn row_count_result(&self, rows: i64) -> Result<Value, BindingError> {
        let return_type = self.signature.return_type();
        if self.signature.returns_void() {
            return Ok(Value::Null);
        }
        match return_type.boxed().erasure().raw_name() {
            Some("Integer") => i32::try_from(rows)
                .map(Value::Int)
                .map_err(|_| BindingError::RowCountOverflow {
                    method: self.method_name.clone(),
                    rows,
                    return_type: return_type.to_string(),
                }),
            Some("Long") => Ok(Value::Long(rows)),
            Some("Boolean") => Ok(Value::Bool(rows > 0)),
            _ => Err(BindingError::UnsupportedReturnType {
                method: self.method_name.clone(),
                return_type: return_type.to_string(),
            }),
        }
    }

    fn failed(&self, source: ExecutionError) -> BindingError {
        BindingError::Execution {
            method: self.method_name.clone(),
            statement: self.command.name.clone().unwrap_or_default(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Linker;
    use crate::node::Node;

    fn config() -> Arc<Configuration> {
        let config = Configuration::default();
        let catalog = config.catalog();
        catalog
            .register(TypeDescriptor::interface("demo.BaseMapper").method(MethodDecl::new("count", TypeRef::int())))
            .unwrap();
        catalog
            .register(
                TypeDescriptor::interface("demo.BlogMapper")
                    .implements("demo.BaseMapper")
                    .method(MethodDecl::new("flush", TypeRef::named("List")).annotate(Node::new("Flush")))
                    .method(MethodDecl::new("missing", TypeRef::void())),
            )
            .unwrap();
        let mut linker = Linker::new(config);
        linker
            .load_mapper(
                "base.xml",
                &Node::new("mapper")
                    .with_attr("namespace", "demo.BaseMapper")
                    .with_child(Node::new("select").with_attr("id", "count").with_attr("resultType", "_int")),
            )
            .unwrap();
        linker.finish().unwrap().configuration
    }

    #[test]
    fn test_statement_found_through_super_interface() {
        let config = config();
        let mapper = config.catalog().require("demo.BlogMapper").unwrap();
        let base = config.catalog().require("demo.BaseMapper").unwrap();
        let count = &base.methods()[0];

        let command = SqlCommand::new(&config, &mapper, count, "demo.BaseMapper").unwrap();
        assert_eq!(command.name.as_deref(), Some("demo.BaseMapper.count"));
        assert_eq!(command.kind, CommandKind::Select);

        let flush = SqlCommand::new(&config, &mapper, &mapper.methods()[0], "demo.BlogMapper").unwrap();
        assert_eq!(flush, SqlCommand { name: None, kind: CommandKind::Flush });

        let err = SqlCommand::new(&config, &mapper, &mapper.methods()[1], "demo.BlogMapper").unwrap_err();
        assert_eq!(err.to_string(), "Invalid bound statement (not found): demo.BlogMapper.missing");
    }

    #[test]
    fn test_signature_classification() {
        let config = Configuration::default();
        let list = MethodDecl::new("all", TypeRef::generic("List", vec![TypeRef::named("demo.Blog")]))
            .param(TypeRef::named("RowBounds"));
        let signature = MethodSignature::new(&config, &list).unwrap();
        assert!(signature.returns_many() && !signature.returns_map());
        assert_eq!(signature.row_bounds_index(), Some(0));

        let keyed = MethodDecl::new("byId", TypeRef::named("Map"))
            .annotate(Node::new("MapKey").with_attr("value", "id"));
        assert_eq!(MethodSignature::new(&config, &keyed).unwrap().map_key(), Some("id"));

        let cursor = MethodDecl::new("scan", TypeRef::named("Cursor"));
        assert!(MethodSignature::new(&config, &cursor).unwrap().returns_cursor());

        let twice = MethodDecl::new("page", TypeRef::void())
            .param(TypeRef::named("RowBounds"))
            .param(TypeRef::named("RowBounds"));
        let err = MethodSignature::new(&config, &twice).unwrap_err();
        assert_eq!(err.to_string(), "page cannot have multiple RowBounds parameters");
    }
}
