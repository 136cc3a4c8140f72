//! Parameter maps

use std::str::FromStr;

use crate::reflect::TypeRef;
use crate::types::{JdbcType, TypeHandlerRef};

/// Direction of a statement parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterMode {
    /// Input only
    #[default]
    In,
    /// Output only
    Out,
    /// Input and output
    InOut,
}

impl FromStr for ParameterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IN" => Ok(ParameterMode::In),
            "OUT" => Ok(ParameterMode::Out),
            "INOUT" => Ok(ParameterMode::InOut),
            other => Err(format!("Unknown parameter mode '{}'", other)),
        }
    }
}

/// One statement parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterMapping {
    /// Property path read from the parameter object
    pub property: String,
    /// Direction
    pub mode: ParameterMode,
    /// Value type
    pub value_type: TypeRef,
    /// Column type
    pub jdbc_type: Option<JdbcType>,
    /// Numeric scale for decimal out-parameters
    pub numeric_scale: Option<u64>,
    /// Coercion strategy
    pub type_handler: TypeHandlerRef,
    /// Result map for cursor out-parameters
    pub result_map_id: Option<String>,
}

/// Named list of parameter mappings
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterMap {
    /// Qualified id
    pub id: String,
    /// Parameter object type
    pub type_ref: Option<TypeRef>,
    /// Ordered parameter mappings
    pub mappings: Vec<ParameterMapping>,
}

impl ParameterMap {
    /// Parameter map with no explicit mappings
    pub fn inline(id: impl Into<String>, type_ref: Option<TypeRef>) -> Self {
        Self {
            id: id.into(),
            type_ref,
            mappings: Vec::new(),
        }
    }
}
