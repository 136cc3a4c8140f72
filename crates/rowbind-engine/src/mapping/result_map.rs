//! Result maps
//!
//! A result map describes how one row becomes one object: an ordered list of
//! field/column mappings, each tagged with role flags, plus an optional
//! discriminator that switches to another result map by column value.

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;

use crate::reflect::TypeRef;
use crate::types::{JdbcType, TypeHandlerRef};

/// Role of a result mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultFlag {
    /// Part of the row identity
    Id,
    /// Passed to the constructor instead of set as a property
    Constructor,
}

/// One field/column mapping
#[derive(Debug, Clone, PartialEq)]
pub struct ResultMapping {
    /// Target property (or constructor parameter name)
    pub property: Option<String>,
    /// Source column
    pub column: Option<String>,
    /// Value type
    pub value_type: TypeRef,
    /// Column type
    pub jdbc_type: Option<JdbcType>,
    /// Coercion strategy
    pub type_handler: Option<TypeHandlerRef>,
    /// Statement loading the value in a separate query
    pub nested_select: Option<String>,
    /// Result map building the value from the same row
    pub nested_result_map: Option<String>,
    /// Columns that must be non-null for a nested value to be created
    pub not_null_columns: Vec<String>,
    /// Prefix applied to nested result map columns
    pub column_prefix: Option<String>,
    /// Role flags
    pub flags: Vec<ResultFlag>,
    /// Composite key columns passed to a nested select
    pub composites: Vec<ResultMapping>,
    /// Named result set supplying nested rows
    pub result_set: Option<String>,
    /// Column joined against in a named result set
    pub foreign_column: Option<String>,
    /// Load the nested select on first access
    pub lazy: bool,
}

impl ResultMapping {
    /// Plain mapping of a column onto a property
    pub fn new(property: Option<String>, column: Option<String>, value_type: TypeRef) -> Self {
        Self {
            property,
            column,
            value_type,
            jdbc_type: None,
            type_handler: None,
            nested_select: None,
            nested_result_map: None,
            not_null_columns: Vec::new(),
            column_prefix: None,
            flags: Vec::new(),
            composites: Vec::new(),
            result_set: None,
            foreign_column: None,
            lazy: false,
        }
    }

    /// Builder-style flag
    pub fn with_flag(mut self, flag: ResultFlag) -> Self {
        if !self.flags.contains(&flag) {
            self.flags.push(flag);
        }
        self
    }

    /// Check for the identity flag
    pub fn is_id(&self) -> bool {
        self.flags.contains(&ResultFlag::Id)
    }

    /// Check for the constructor flag
    pub fn is_constructor(&self) -> bool {
        self.flags.contains(&ResultFlag::Constructor)
    }

    /// Key under which a child mapping overrides an inherited one:
    /// the property, or the column when there is no property
    pub fn identity(&self) -> Option<&str> {
        self.property.as_deref().or(self.column.as_deref())
    }

    /// Check whether the mapping builds its value from another result map
    pub fn is_nested_result(&self) -> bool {
        self.nested_result_map.is_some() && self.result_set.is_none()
    }
}

/// Column-value switch between result maps
#[derive(Debug, Clone, PartialEq)]
pub struct Discriminator {
    /// Column read to pick a case
    pub mapping: ResultMapping,
    /// Column value → qualified result map id
    pub cases: BTreeMap<String, String>,
}

impl Discriminator {
    /// Result map id for a column value
    pub fn map_id_for(&self, value: &str) -> Option<&str> {
        self.cases.get(value).map(String::as_str)
    }
}

/// A committed result map
#[derive(Debug, Clone, PartialEq)]
pub struct ResultMap {
    id: String,
    type_ref: TypeRef,
    mappings: Vec<ResultMapping>,
    discriminator: Option<Discriminator>,
    auto_mapping: Option<bool>,
    mapped_columns: FxHashSet<String>,
    mapped_properties: FxHashSet<String>,
    has_nested_result_maps: bool,
    has_nested_queries: bool,
}

impl ResultMap {
    /// Create a result map and derive its lookup sets
    pub fn new(
        id: impl Into<String>,
        type_ref: TypeRef,
        mappings: Vec<ResultMapping>,
        discriminator: Option<Discriminator>,
        auto_mapping: Option<bool>,
    ) -> Self {
        let mut mapped_columns = FxHashSet::default();
        let mut mapped_properties = FxHashSet::default();
        let mut has_nested_result_maps = false;
        let mut has_nested_queries = false;

        for mapping in &mappings {
            has_nested_queries |= mapping.nested_select.is_some();
            has_nested_result_maps |= mapping.is_nested_result();
            if let Some(column) = &mapping.column {
                mapped_columns.insert(column.to_uppercase());
            }
            for composite in &mapping.composites {
                if let Some(column) = &composite.column {
                    mapped_columns.insert(column.to_uppercase());
                }
            }
            if let Some(property) = &mapping.property {
                mapped_properties.insert(property.clone());
            }
        }

        Self {
            id: id.into(),
            type_ref,
            mappings,
            discriminator,
            auto_mapping,
            mapped_columns,
            mapped_properties,
            has_nested_result_maps,
            has_nested_queries,
        }
    }

    /// Qualified id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Owning namespace
    pub fn namespace(&self) -> &str {
        super::namespace_of(&self.id)
    }

    /// Target type
    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }

    /// All mappings in declaration order (local first, then inherited)
    pub fn mappings(&self) -> &[ResultMapping] {
        &self.mappings
    }

    /// Identity mappings; every mapping counts when none is flagged
    pub fn id_mappings(&self) -> Vec<&ResultMapping> {
        let ids: Vec<&ResultMapping> = self.mappings.iter().filter(|m| m.is_id()).collect();
        if ids.is_empty() {
            self.mappings.iter().collect()
        } else {
            ids
        }
    }

    /// Constructor-argument mappings
    pub fn constructor_mappings(&self) -> impl Iterator<Item = &ResultMapping> {
        self.mappings.iter().filter(|m| m.is_constructor())
    }

    /// Property mappings (everything that is not a constructor argument)
    pub fn property_mappings(&self) -> impl Iterator<Item = &ResultMapping> {
        self.mappings.iter().filter(|m| !m.is_constructor())
    }

    /// Discriminator, if any
    pub fn discriminator(&self) -> Option<&Discriminator> {
        self.discriminator.as_ref()
    }

    /// Explicit auto-mapping switch
    pub fn auto_mapping(&self) -> Option<bool> {
        self.auto_mapping
    }

    /// Check whether a column (case-insensitive) is explicitly mapped
    pub fn is_column_mapped(&self, column: &str) -> bool {
        self.mapped_columns.contains(&column.to_uppercase())
    }

    /// Check whether a property is explicitly mapped
    pub fn is_property_mapped(&self, property: &str) -> bool {
        self.mapped_properties.contains(property)
    }

    /// Check for mappings built from other result maps
    pub fn has_nested_result_maps(&self) -> bool {
        self.has_nested_result_maps
    }

    /// Check for mappings loaded by nested selects
    pub fn has_nested_queries(&self) -> bool {
        self.has_nested_queries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(property: &str, column: &str) -> ResultMapping {
        ResultMapping::new(Some(property.into()), Some(column.into()), TypeRef::object())
    }

    #[test]
    fn test_derived_sets() {
        let mut author = mapping("author", "author_id");
        author.nested_result_map = Some("demo.Author.base".into());
        let map = ResultMap::new(
            "demo.Blog.detail",
            TypeRef::named("demo.Blog"),
            vec![mapping("id", "blog_id").with_flag(ResultFlag::Id), mapping("title", "title"), author],
            None,
            None,
        );

        assert_eq!(map.namespace(), "demo.Blog");
        assert!(map.is_column_mapped("BLOG_ID"));
        assert!(map.is_property_mapped("title"));
        assert!(map.has_nested_result_maps());
        assert!(!map.has_nested_queries());
        assert_eq!(map.id_mappings().len(), 1);
    }

    #[test]
    fn test_all_mappings_are_ids_without_flags() {
        let map = ResultMap::new(
            "demo.Blog.plain",
            TypeRef::named("demo.Blog"),
            vec![mapping("id", "id"), mapping("title", "title")],
            None,
            None,
        );
        assert_eq!(map.id_mappings().len(), 2);
    }

    #[test]
    fn test_identity_falls_back_to_column() {
        let arg = ResultMapping::new(None, Some("id".into()), TypeRef::int())
            .with_flag(ResultFlag::Constructor)
            .with_flag(ResultFlag::Constructor);
        assert_eq!(arg.identity(), Some("id"));
        assert_eq!(arg.flags.len(), 1);
        assert!(arg.is_constructor());
    }
}
