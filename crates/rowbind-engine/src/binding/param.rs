//! Parameter naming

use crate::mapping::Configuration;
use crate::reflect::{MethodDecl, TypeCatalog, TypeRef};
use crate::value::{ParamMap, Value};

const GENERIC_NAME_PREFIX: &str = "param";

/// Check whether a parameter type is a pagination or result-callback
/// control type
pub(crate) fn is_control_type(catalog: &TypeCatalog, ty: &TypeRef) -> bool {
    catalog.is_assignable(&TypeRef::named("RowBounds"), ty)
        || catalog.is_assignable(&TypeRef::named("ResultHandler"), ty)
}

/// Names a method's logical parameters and builds the parameter value handed
/// to the executor
///
/// Control parameters take no name. Every other parameter is named by its
/// `Param` annotation, else by its declared name when
/// `use_actual_param_name` is set, else by its position among the logical
/// parameters.
#[derive(Debug, Clone)]
pub struct ParamNameResolver {
    /// `(argument index, name)` per logical parameter
    names: Vec<(usize, String)>,
    has_param_annotation: bool,
}

impl ParamNameResolver {
    /// Resolve names for a method
    pub fn new(config: &Configuration, method: &MethodDecl) -> Self {
        let catalog = config.catalog();
        let use_actual_name = config.settings().use_actual_param_name;
        let mut names = Vec::new();
        let mut has_param_annotation = false;

        for (index, param) in method.params.iter().enumerate() {
            if is_control_type(catalog, &param.ty) {
                continue;
            }
            let annotated = param
                .annotation("Param")
                .and_then(|a| a.attr("value"))
                .map(str::to_string);
            has_param_annotation |= annotated.is_some();
            let name = annotated
                .or_else(|| param.name.clone().filter(|_| use_actual_name))
                .unwrap_or_else(|| names.len().to_string());
            names.push((index, name));
        }

        Self {
            names,
            has_param_annotation,
        }
    }

    /// Logical parameter names in declaration order
    pub fn names(&self) -> Vec<&str> {
        self.names.iter().map(|(_, name)| name.as_str()).collect()
    }

    /// Parameter value for a call
    ///
    /// No logical parameters yields null. A single unannotated parameter is
    /// passed through unwrapped. Otherwise the result is a parameter map
    /// holding every resolved name plus the generic `param1`, `param2`, ...
    /// aliases that do not collide with a resolved name.
    pub fn named_params(&self, args: &[Value]) -> Value {
        let arg = |index: usize| args.get(index).cloned().unwrap_or_default();
        match self.names.as_slice() {
            [] => Value::Null,
            [(index, _)] if !self.has_param_annotation => arg(*index),
            names => {
                let mut params = ParamMap::new();
                for (position, (index, name)) in names.iter().enumerate() {
                    params.insert(name.clone(), arg(*index));
                    let generic = format!("{}{}", GENERIC_NAME_PREFIX, position + 1);
                    if !names.iter().any(|(_, n)| *n == generic) {
                        params.insert(generic, arg(*index));
                    }
                }
                Value::Params(params)
            }
        }
    }
}
