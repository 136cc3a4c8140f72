//! Dynamic values
//!
//! Mapper arguments, named-parameter bags, executor rows, and reconstructed
//! objects are all carried as [`Value`]s. Objects are plain field slots tagged
//! with their type name; typed access goes through the reflector.

use std::collections::BTreeMap;
use std::fmt;

use crate::executor::{Cursor, ResultHandlerRef, RowBounds};
use crate::reflect::ReflectionError;

/// A dynamically typed value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    Long(i64),
    /// Floating point
    Double(f64),
    /// String
    Str(String),
    /// Generic list, the shape every row sequence starts as
    List(Vec<Value>),
    /// Typed array
    Array(ArrayValue),
    /// Non-list collection created through an object factory
    Collection(CollectionValue),
    /// String-keyed map
    Map(BTreeMap<String, Value>),
    /// Rows keyed by a property value, as returned for `MapKey` methods
    KeyedMap(BTreeMap<MapKey, Value>),
    /// Named-parameter bag produced by parameter name resolution
    Params(ParamMap),
    /// Object instance
    Object(ObjectValue),
    /// Lazily consumed row sequence
    Cursor(Cursor),
    /// Pagination bounds control argument
    Bounds(RowBounds),
    /// Streaming result callback control argument
    Handler(ResultHandlerRef),
}

impl Value {
    /// Convenience constructor for strings
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    /// Check for [`Value::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the runtime type of this value
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "Object",
            Value::Bool(_) => "Boolean",
            Value::Int(_) => "Integer",
            Value::Long(_) => "Long",
            Value::Double(_) => "Double",
            Value::Str(_) => "String",
            Value::List(_) => "ArrayList",
            Value::Array(_) => "Array",
            Value::Collection(c) => &c.type_name,
            Value::Map(_) | Value::KeyedMap(_) => "HashMap",
            Value::Params(_) => "ParamMap",
            Value::Object(o) => &o.type_name,
            Value::Cursor(_) => "Cursor",
            Value::Bounds(_) => "RowBounds",
            Value::Handler(_) => "ResultHandler",
        }
    }

    /// Integral view used by row-count and primitive coercions
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(i64::from(*i)),
            Value::Long(l) => Some(*l),
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// String rendering used for discriminator values and map keys
    pub fn key_string(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Long(l) => Some(l.to_string()),
            Value::Double(d) => Some(d.to_string()),
            Value::Str(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Elements of a list-like value
    pub fn elements(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            Value::Array(a) => Some(&a.items),
            Value::Collection(c) => Some(&c.items),
            _ => None,
        }
    }

    /// Append all items to a list-like value
    pub fn extend_collection(&mut self, items: Vec<Value>) -> Result<(), ReflectionError> {
        match self {
            Value::List(existing) => existing.extend(items),
            Value::Array(a) => a.items.extend(items),
            Value::Collection(c) => c.extend(items),
            other => {
                return Err(ReflectionError::NotACollection(other.type_name().to_string()));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Long(l) => write!(f, "{}", l),
            Value::Double(d) => write!(f, "{}", d),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(items) => write_seq(f, items),
            Value::Array(a) => write_seq(f, &a.items),
            Value::Collection(c) => write_seq(f, &c.items),
            Value::Map(m) => write_map(f, m),
            Value::KeyedMap(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", k.to_value(), v)?;
                }
                write!(f, "}}")
            }
            Value::Params(p) => write_map(f, &p.entries),
            Value::Object(o) => {
                write!(f, "{}", o.type_name)?;
                write_map(f, &o.fields)
            }
            Value::Cursor(_) => write!(f, "<cursor>"),
            Value::Bounds(b) => write!(f, "RowBounds(offset={}, limit={})", b.offset, b.limit),
            Value::Handler(_) => write!(f, "<result handler>"),
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    write!(f, "[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, "]")
}

fn write_map(f: &mut fmt::Formatter<'_>, map: &BTreeMap<String, Value>) -> fmt::Result {
    write!(f, "{{")?;
    for (i, (k, v)) in map.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}={}", k, v)?;
    }
    write!(f, "}}")
}

/// Map key taken from a row value
///
/// Keys of different value types never collide, and null is a key of its
/// own.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapKey {
    /// Null key
    Null,
    /// Boolean key
    Bool(bool),
    /// 32-bit integer key
    Int(i32),
    /// 64-bit integer key
    Long(i64),
    /// Floating point key, by bit pattern
    Double(u64),
    /// String key
    Str(String),
    /// Any other value, by type name and rendering
    Other {
        /// Runtime type name
        type_name: String,
        /// Display rendering
        rendered: String,
    },
}

impl MapKey {
    /// The value this key was taken from, or its rendering for
    /// [`MapKey::Other`]
    pub fn to_value(&self) -> Value {
        match self {
            MapKey::Null => Value::Null,
            MapKey::Bool(b) => Value::Bool(*b),
            MapKey::Int(i) => Value::Int(*i),
            MapKey::Long(l) => Value::Long(*l),
            MapKey::Double(bits) => Value::Double(f64::from_bits(*bits)),
            MapKey::Str(s) => Value::Str(s.clone()),
            MapKey::Other { rendered, .. } => Value::Str(rendered.clone()),
        }
    }
}

impl From<&Value> for MapKey {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => MapKey::Null,
            Value::Bool(b) => MapKey::Bool(*b),
            Value::Int(i) => MapKey::Int(*i),
            Value::Long(l) => MapKey::Long(*l),
            Value::Double(d) => MapKey::Double(d.to_bits()),
            Value::Str(s) => MapKey::Str(s.clone()),
            other => MapKey::Other {
                type_name: other.type_name().to_string(),
                rendered: other.to_string(),
            },
        }
    }
}

/// Typed array value
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    /// Element type name (`int`, `demo.Blog`, ...)
    pub element: String,
    /// Elements
    pub items: Vec<Value>,
}

/// Collection value of a declared non-list collection type
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionValue {
    /// Concrete collection type name
    pub type_name: String,
    /// Elements
    pub items: Vec<Value>,
    /// Set semantics: an element equal to one already held is not added
    pub unique: bool,
}

impl CollectionValue {
    /// Empty collection of the given type
    pub fn new(type_name: impl Into<String>, unique: bool) -> Self {
        Self {
            type_name: type_name.into(),
            items: Vec::new(),
            unique,
        }
    }

    /// Append elements in order, skipping duplicates for sets
    pub fn extend(&mut self, items: Vec<Value>) {
        if !self.unique {
            self.items.extend(items);
            return;
        }
        for item in items {
            if !self.items.contains(&item) {
                self.items.push(item);
            }
        }
    }
}

/// An object instance: field slots tagged with the owning type
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectValue {
    /// Fully qualified type name
    pub type_name: String,
    /// Field slots by field name
    pub fields: BTreeMap<String, Value>,
}

impl ObjectValue {
    /// Create an instance with no populated slots
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style slot assignment
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Read a raw field slot
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Strict name → value map handed to the executor for multi-argument calls
///
/// Reading a name that was never bound is an error rather than `null`, so a
/// misspelled parameter reference fails loudly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamMap {
    entries: BTreeMap<String, Value>,
}

impl ParamMap {
    /// Create an empty parameter map
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a name
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.entries.insert(name.into(), value);
    }

    /// Check whether a name is bound
    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Read a bound name
    pub fn get(&self, name: &str) -> Result<&Value, ReflectionError> {
        self.entries
            .get(name)
            .ok_or_else(|| ReflectionError::ParameterNotFound {
                name: name.to_string(),
                available: self.entries.keys().cloned().collect::<Vec<_>>().join(", "),
            })
    }

    /// Bound names in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Number of bound names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether no names are bound
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_map_strict_get() {
        let mut params = ParamMap::new();
        params.insert("id", Value::Int(7));
        params.insert("param1", Value::Int(7));

        assert_eq!(params.get("id").unwrap(), &Value::Int(7));
        let err = params.get("name").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parameter 'name' not found. Available parameters are [id, param1]"
        );
    }

    #[test]
    fn test_key_string() {
        assert_eq!(Value::Int(3).key_string().as_deref(), Some("3"));
        assert_eq!(Value::str("D").key_string().as_deref(), Some("D"));
        assert_eq!(Value::Null.key_string(), None);
    }

    #[test]
    fn test_extend_collection() {
        let mut list = Value::List(vec![Value::Int(1)]);
        list.extend_collection(vec![Value::Int(2)]).unwrap();
        assert_eq!(list.elements().map(|e| e.len()), Some(2));
        assert!(Value::Int(1).extend_collection(vec![]).is_err());
    }

    #[test]
    fn test_extend_set_skips_duplicates() {
        let mut set = Value::Collection(CollectionValue::new("HashSet", true));
        set.extend_collection(vec![Value::Int(1), Value::Int(1), Value::Int(2)]).unwrap();
        set.extend_collection(vec![Value::Int(2), Value::Long(1)]).unwrap();
        assert_eq!(
            set.elements(),
            Some(&[Value::Int(1), Value::Int(2), Value::Long(1)][..])
        );

        let mut bag = Value::Collection(CollectionValue::new("demo.Bag", false));
        bag.extend_collection(vec![Value::Int(1), Value::Int(1)]).unwrap();
        assert_eq!(bag.elements().map(|e| e.len()), Some(2));
    }

    #[test]
    fn test_map_keys_keep_types_apart() {
        let keys: Vec<MapKey> = [Value::Int(1), Value::str("1"), Value::Long(1), Value::Null, Value::str("null")]
            .iter()
            .map(MapKey::from)
            .collect();
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(MapKey::from(&Value::Double(1.5)).to_value(), Value::Double(1.5));
        assert_eq!(MapKey::Null.to_value(), Value::Null);
    }

    #[test]
    fn test_display_object() {
        let blog = ObjectValue::new("demo.Blog").with_field("id", Value::Int(1));
        assert_eq!(Value::Object(blog).to_string(), "demo.Blog{id=1}");
    }
}
