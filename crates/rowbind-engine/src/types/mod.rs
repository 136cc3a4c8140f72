//! Type aliases and type handlers
//!
//! Both are opaque lookups from the linker's point of view: aliases turn a
//! short written name into a [`TypeRef`](crate::reflect::TypeRef), handlers
//! name the coercion strategy a field or argument mapping will use.

mod alias;
mod handler;

pub use alias::{AliasError, TypeAliasRegistry};
pub use handler::{TypeHandlerRef, TypeHandlerRegistry};

use std::fmt;
use std::str::FromStr;

/// Column types understood by type handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JdbcType {
    /// BIT
    Bit,
    /// BOOLEAN
    Boolean,
    /// TINYINT
    TinyInt,
    /// SMALLINT
    SmallInt,
    /// INTEGER
    Integer,
    /// BIGINT
    BigInt,
    /// FLOAT
    Float,
    /// DOUBLE
    Double,
    /// DECIMAL
    Decimal,
    /// NUMERIC
    Numeric,
    /// CHAR
    Char,
    /// VARCHAR
    Varchar,
    /// CLOB
    Clob,
    /// BLOB
    Blob,
    /// DATE
    Date,
    /// TIMESTAMP
    Timestamp,
    /// CURSOR (stored procedure out-parameter holding a result set)
    Cursor,
    /// ARRAY
    Array,
    /// NULL
    Null,
    /// OTHER
    Other,
    /// UNDEFINED
    Undefined,
}

impl JdbcType {
    /// Canonical upper-case name
    pub fn name(self) -> &'static str {
        match self {
            JdbcType::Bit => "BIT",
            JdbcType::Boolean => "BOOLEAN",
            JdbcType::TinyInt => "TINYINT",
            JdbcType::SmallInt => "SMALLINT",
            JdbcType::Integer => "INTEGER",
            JdbcType::BigInt => "BIGINT",
            JdbcType::Float => "FLOAT",
            JdbcType::Double => "DOUBLE",
            JdbcType::Decimal => "DECIMAL",
            JdbcType::Numeric => "NUMERIC",
            JdbcType::Char => "CHAR",
            JdbcType::Varchar => "VARCHAR",
            JdbcType::Clob => "CLOB",
            JdbcType::Blob => "BLOB",
            JdbcType::Date => "DATE",
            JdbcType::Timestamp => "TIMESTAMP",
            JdbcType::Cursor => "CURSOR",
            JdbcType::Array => "ARRAY",
            JdbcType::Null => "NULL",
            JdbcType::Other => "OTHER",
            JdbcType::Undefined => "UNDEFINED",
        }
    }
}

impl fmt::Display for JdbcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for JdbcType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "BIT" => JdbcType::Bit,
            "BOOLEAN" => JdbcType::Boolean,
            "TINYINT" => JdbcType::TinyInt,
            "SMALLINT" => JdbcType::SmallInt,
            "INTEGER" => JdbcType::Integer,
            "BIGINT" => JdbcType::BigInt,
            "FLOAT" => JdbcType::Float,
            "DOUBLE" => JdbcType::Double,
            "DECIMAL" => JdbcType::Decimal,
            "NUMERIC" => JdbcType::Numeric,
            "CHAR" => JdbcType::Char,
            "VARCHAR" => JdbcType::Varchar,
            "CLOB" => JdbcType::Clob,
            "BLOB" => JdbcType::Blob,
            "DATE" => JdbcType::Date,
            "TIMESTAMP" => JdbcType::Timestamp,
            "CURSOR" => JdbcType::Cursor,
            "ARRAY" => JdbcType::Array,
            "NULL" => JdbcType::Null,
            "OTHER" => JdbcType::Other,
            "UNDEFINED" => JdbcType::Undefined,
            other => return Err(format!("Unknown JDBC type '{}'", other)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jdbc_type_parse() {
        assert_eq!("varchar".parse::<JdbcType>().unwrap(), JdbcType::Varchar);
        assert_eq!(JdbcType::Cursor.to_string(), "CURSOR");
        assert!("TEXTISH".parse::<JdbcType>().is_err());
    }
}
