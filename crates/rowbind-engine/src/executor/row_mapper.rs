//! Row reconstruction
//!
//! Turns column rows into result objects the way a result map describes:
//! constructor arguments first, then property mappings, nested single-row
//! associations, and auto-mapped leftovers.

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;

use crate::mapping::{Configuration, MappedStatement, ResultMap, ResultMapping};
use crate::reflect::TypeRef;
use crate::value::Value;

use super::ExecutionError;

type Row = BTreeMap<String, Value>;

/// Maps column rows through a statement's result map
pub struct RowMapper<'a> {
    config: &'a Configuration,
}

impl<'a> RowMapper<'a> {
    /// Mapper over a configuration
    pub fn new(config: &'a Configuration) -> Self {
        Self { config }
    }

    /// Map every row through the statement's first result map
    ///
    /// A statement without result maps returns its rows untouched.
    pub fn map_rows(&self, statement: &MappedStatement, rows: Vec<Value>) -> Result<Vec<Value>, ExecutionError> {
        let Some(result_map) = statement.result_maps.first() else {
            return Ok(rows);
        };
        rows.into_iter()
            .map(|row| match row {
                Value::Map(columns) => self.map_row(result_map, &columns, ""),
                other => Ok(other),
            })
            .collect()
    }

    /// Map one row through a result map, reading columns under `prefix`
    pub fn map_row(&self, result_map: &ResultMap, row: &Row, prefix: &str) -> Result<Value, ExecutionError> {
        let result_map = self.discriminated(result_map, row, prefix)?;
        let ty = result_map.type_ref();
        let catalog = self.config.catalog();

        if catalog.is_map(ty) || *ty == TypeRef::object() {
            if result_map.mappings().is_empty() {
                return Ok(Value::Map(prefixed_columns(row, prefix)));
            }
        } else if result_map.mappings().is_empty() && self.config.handlers().has_handler(ty) {
            return Ok(row
                .values()
                .next()
                .cloned()
                .unwrap_or_default());
        }

        let args = result_map
            .constructor_mappings()
            .map(|m| (m.value_type.clone(), self.column_value(m, row, prefix)))
            .collect();
        let mut object = self.config.object_factory().create_with_args(ty, args)?;
        let meta = self.config.meta_object();

        for mapping in result_map.property_mappings() {
            let Some(property) = mapping.property.as_deref() else {
                continue;
            };
            if let Some(nested_id) = &mapping.nested_result_map {
                let nested_prefix = format!("{}{}", prefix, mapping.column_prefix.as_deref().unwrap_or(""));
                if !self.has_nested_values(mapping, row, &nested_prefix) {
                    continue;
                }
                let nested_map = self.config.get_result_map(nested_id)?;
                let mut value = self.map_row(nested_map, row, &nested_prefix)?;
                if catalog.is_collection(&mapping.value_type) {
                    value = Value::List(vec![value]);
                }
                meta.set_value(&mut object, property, value)?;
            } else if mapping.nested_select.is_none() && mapping.column.is_some() {
                meta.set_value(&mut object, property, self.column_value(mapping, row, prefix))?;
            }
        }

        if result_map
            .auto_mapping()
            .unwrap_or(!result_map.has_nested_result_maps())
        {
            self.auto_map(result_map, row, prefix, &mut object)?;
        }
        Ok(object)
    }

    /// Follow discriminator cases until a map without a matching case
    fn discriminated<'m>(&'m self, result_map: &'m ResultMap, row: &Row, prefix: &str) -> Result<&'m ResultMap, ExecutionError> {
        let mut current = result_map;
        let mut visited = FxHashSet::default();
        while let Some(discriminator) = current.discriminator() {
            if !visited.insert(current.id().to_string()) {
                break;
            }
            let value = self.column_value(&discriminator.mapping, row, prefix);
            let Some(case_id) = value.key_string().and_then(|key| discriminator.map_id_for(&key)) else {
                break;
            };
            current = self.config.get_result_map(case_id)?;
        }
        Ok(current)
    }

    fn column_value(&self, mapping: &ResultMapping, row: &Row, prefix: &str) -> Value {
        mapping
            .column
            .as_deref()
            .and_then(|column| column_in(row, &format!("{}{}", prefix, column)))
            .cloned()
            .unwrap_or_default()
    }

    /// A nested row exists when its not-null columns (or, without any, any
    /// prefixed column) hold a value
    fn has_nested_values(&self, mapping: &ResultMapping, row: &Row, prefix: &str) -> bool {
        if !mapping.not_null_columns.is_empty() {
            return mapping.not_null_columns.iter().any(|column| {
                column_in(row, &format!("{}{}", prefix, column)).is_some_and(|v| !v.is_null())
            });
        }
        prefixed_columns(row, prefix).values().any(|v| !v.is_null())
    }

    fn auto_map(&self, result_map: &ResultMap, row: &Row, prefix: &str, object: &mut Value) -> Result<(), ExecutionError> {
        let meta = self.config.meta_object();
        let meta_class = self.config.meta_class(result_map.type_ref())?;
        let camel_case = self.config.settings().map_underscore_to_camel_case;
        for (column, value) in prefixed_columns(row, prefix) {
            if result_map.is_column_mapped(&column) {
                continue;
            }
            match object {
                Value::Map(map) => {
                    map.insert(column, value);
                }
                _ => {
                    let Some(property) = meta_class.find_property(&column, camel_case) else {
                        continue;
                    };
                    if result_map.is_property_mapped(&property) || !meta_class.has_setter(&property)? {
                        continue;
                    }
                    meta.set_value(object, &property, value)?;
                }
            }
        }
        Ok(())
    }
}

/// Case-insensitive column lookup
fn column_in<'r>(row: &'r Row, column: &str) -> Option<&'r Value> {
    row.get(column).or_else(|| {
        row.iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, value)| value)
    })
}

/// Columns starting with `prefix` (case-insensitive), prefix removed
fn prefixed_columns(row: &Row, prefix: &str) -> Row {
    if prefix.is_empty() {
        return row.clone();
    }
    row.iter()
        .filter(|(name, _)| {
            name.len() >= prefix.len() && name[..prefix.len()].eq_ignore_ascii_case(prefix)
        })
        .map(|(name, value)| (name[prefix.len()..].to_string(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{Discriminator, ResultFlag};
    use crate::reflect::{ConstructorDecl, ParamDecl, TypeDescriptor};
    use crate::settings::Settings;
    use crate::value::ObjectValue;

    fn config(settings: Settings) -> Configuration {
        let config = Configuration::new(settings);
        let catalog = config.catalog();
        catalog
            .register(
                TypeDescriptor::class("demo.Author")
                    .default_constructor()
                    .property("id", TypeRef::int())
                    .property("name", TypeRef::string()),
            )
            .unwrap();
        catalog
            .register(
                TypeDescriptor::class("demo.Blog")
                    .default_constructor()
                    .constructor(ConstructorDecl::new(vec![ParamDecl::named("id", TypeRef::int())]))
                    .property("id", TypeRef::int())
                    .property("blogTitle", TypeRef::string())
                    .property("author", TypeRef::named("demo.Author")),
            )
            .unwrap();
        catalog
            .register(TypeDescriptor::class("demo.Draft").extends("demo.Blog").default_constructor())
            .unwrap();
        config
    }

    fn row(columns: &[(&str, Value)]) -> Row {
        columns.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn object(value: &Value) -> &ObjectValue {
        match value {
            Value::Object(object) => object,
            other => panic!("expected an object, got {:?}", other),
        }
    }

    #[test]
    fn test_constructor_nested_and_auto_mapping() {
        let mut config = config(Settings {
            map_underscore_to_camel_case: true,
            ..Settings::default()
        });
        let author = ResultMap::new(
            "demo.authorMap",
            TypeRef::named("demo.Author"),
            vec![ResultMapping::new(Some("name".into()), Some("name".into()), TypeRef::string())],
            None,
            Some(true),
        );
        config.add_result_map(author).unwrap();

        let mut association = ResultMapping::new(Some("author".into()), None, TypeRef::named("demo.Author"));
        association.nested_result_map = Some("demo.authorMap".into());
        association.column_prefix = Some("author_".into());
        let blog = ResultMap::new(
            "demo.blogMap",
            TypeRef::named("demo.Blog"),
            vec![
                ResultMapping::new(Some("id".into()), Some("id".into()), TypeRef::int())
                    .with_flag(ResultFlag::Constructor),
                association,
            ],
            None,
            Some(true),
        );
        let mapper = RowMapper::new(&config);
        let mapped = mapper
            .map_row(
                &blog,
                &row(&[
                    ("ID", Value::Int(7)),
                    ("blog_title", Value::str("Rust")),
                    ("author_name", Value::str("Ferris")),
                    ("author_id", Value::Int(3)),
                ]),
                "",
            )
            .unwrap();

        let blog = object(&mapped);
        assert_eq!(blog.field("id"), Some(&Value::Int(7)));
        assert_eq!(blog.field("blogTitle"), Some(&Value::str("Rust")));
        let author = object(blog.field("author").unwrap());
        assert_eq!(author.field("name"), Some(&Value::str("Ferris")));
        assert_eq!(author.field("id"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_discriminator_selects_case_map() {
        let mut config = config(Settings::default());
        config
            .add_result_map(ResultMap::new("demo.draftMap", TypeRef::named("demo.Draft"), Vec::new(), None, None))
            .unwrap();
        let discriminator = Discriminator {
            mapping: ResultMapping::new(None, Some("kind".into()), TypeRef::string()),
            cases: [("draft".to_string(), "demo.draftMap".to_string())].into_iter().collect(),
        };
        let base = ResultMap::new("demo.base", TypeRef::named("demo.Blog"), Vec::new(), Some(discriminator), None);

        let mapper = RowMapper::new(&config);
        let draft = mapper
            .map_row(&base, &row(&[("kind", Value::str("draft")), ("id", Value::Int(1))]), "")
            .unwrap();
        assert_eq!(object(&draft).type_name, "demo.Draft");
        assert_eq!(object(&draft).field("id"), Some(&Value::Int(1)));

        let plain = mapper
            .map_row(&base, &row(&[("kind", Value::str("live"))]), "")
            .unwrap();
        assert_eq!(object(&plain).type_name, "demo.Blog");
    }

    #[test]
    fn test_simple_and_map_types() {
        let config = config(Settings::default());
        let mapper = RowMapper::new(&config);
        let count = ResultMap::new("demo.count-Inline", TypeRef::named("Integer"), Vec::new(), None, None);
        assert_eq!(
            mapper.map_row(&count, &row(&[("count", Value::Int(4))]), "").unwrap(),
            Value::Int(4)
        );

        let map = ResultMap::new("demo.map-Inline", TypeRef::named("HashMap"), Vec::new(), None, None);
        let mapped = mapper.map_row(&map, &row(&[("a", Value::Int(1))]), "").unwrap();
        assert_eq!(mapped, Value::Map(row(&[("a", Value::Int(1))])));
    }
}
