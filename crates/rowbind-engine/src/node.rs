//! Attributed-node trees
//!
//! Both fragment readers consume declarations that have already been reduced
//! to a generic tree of named nodes carrying string attributes, child nodes,
//! and optional body text. Markup parsing lives outside the engine.

use thiserror::Error;

/// Errors raised while reading typed attributes from a node
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    /// A required attribute is absent
    #[error("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute {
        /// Element name
        element: String,
        /// Attribute name
        attribute: String,
    },

    /// An attribute value could not be parsed into the expected type
    #[error("Invalid value '{value}' for attribute '{attribute}' on <{element}>: expected {expected}")]
    InvalidAttribute {
        /// Element name
        element: String,
        /// Attribute name
        attribute: String,
        /// Raw attribute value
        value: String,
        /// Human-readable expected type
        expected: &'static str,
    },
}

/// A single node of an attributed tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
    text: Option<String>,
}

impl Node {
    /// Create an empty node with the given element name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder-style child append
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Builder-style body text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.append_text(&text.into());
        self
    }

    /// Set or replace an attribute
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Append a child node
    pub fn push_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Append body text, concatenating with any text already present
    pub fn append_text(&mut self, text: &str) {
        match &mut self.text {
            Some(existing) => existing.push_str(text),
            None => self.text = Some(text.to_string()),
        }
    }

    /// Element name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Body text, if any
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Body text with surrounding whitespace removed
    pub fn trimmed_text(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// All attributes in declaration order
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// All child nodes in document order
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Children with the given element name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First child with the given element name
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Raw attribute value
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute value treating empty strings as absent
    pub fn non_empty_attr(&self, key: &str) -> Option<&str> {
        self.attr(key).filter(|v| !v.trim().is_empty())
    }

    /// Attribute value, or an error if it is absent
    pub fn required_attr(&self, key: &str) -> Result<&str, NodeError> {
        self.non_empty_attr(key)
            .ok_or_else(|| NodeError::MissingAttribute {
                element: self.name.clone(),
                attribute: key.to_string(),
            })
    }

    /// Boolean attribute (`true`/`false`, case-insensitive)
    pub fn bool_attr(&self, key: &str) -> Result<Option<bool>, NodeError> {
        match self.non_empty_attr(key) {
            None => Ok(None),
            Some(v) if v.eq_ignore_ascii_case("true") => Ok(Some(true)),
            Some(v) if v.eq_ignore_ascii_case("false") => Ok(Some(false)),
            Some(v) => Err(self.invalid(key, v, "a boolean")),
        }
    }

    /// Unsigned integer attribute
    pub fn u64_attr(&self, key: &str) -> Result<Option<u64>, NodeError> {
        match self.non_empty_attr(key) {
            None => Ok(None),
            Some(v) => v
                .trim()
                .parse::<u64>()
                .map(Some)
                .map_err(|_| self.invalid(key, v, "an unsigned integer")),
        }
    }

    /// Comma-separated attribute split into trimmed, non-empty parts
    pub fn list_attr(&self, key: &str) -> Vec<String> {
        self.attr(key)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn invalid(&self, key: &str, value: &str, expected: &'static str) -> NodeError {
        NodeError::InvalidAttribute {
            element: self.name.clone(),
            attribute: key.to_string(),
            value: value.to_string(),
            expected,
        }
    }
}

/// Build an identifier for an anonymous node from its ancestry
///
/// `path` runs from the root to the node itself. Each segment contributes its
/// element name, followed by `[value]` when it carries an `id`, `value`, or
/// `property` attribute (dots in the value become underscores). Segments are
/// joined with `_`, e.g. `mapper_resultMap[blogMap]_association[author]`.
pub fn value_based_identifier(path: &[&Node]) -> String {
    let mut parts = Vec::with_capacity(path.len());
    for node in path {
        let label = node
            .attr("id")
            .or_else(|| node.attr("value"))
            .or_else(|| node.attr("property"));
        match label {
            Some(value) => parts.push(format!("{}[{}]", node.name(), value.replace('.', "_"))),
            None => parts.push(node.name().to_string()),
        }
    }
    parts.join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_access() {
        let node = Node::new("select")
            .with_attr("id", "findAll")
            .with_attr("useCache", "TRUE")
            .with_attr("fetchSize", "100")
            .with_attr("keyProperty", "id, version");

        assert_eq!(node.attr("id"), Some("findAll"));
        assert_eq!(node.bool_attr("useCache").unwrap(), Some(true));
        assert_eq!(node.u64_attr("fetchSize").unwrap(), Some(100));
        assert_eq!(node.list_attr("keyProperty"), vec!["id", "version"]);
        assert_eq!(node.bool_attr("flushCache").unwrap(), None);
    }

    #[test]
    fn test_invalid_attribute() {
        let node = Node::new("cache").with_attr("size", "big");
        let err = node.u64_attr("size").unwrap_err();
        assert!(err.to_string().contains("'big'"));
        assert!(node.required_attr("eviction").is_err());
    }

    #[test]
    fn test_text_concatenation() {
        let node = Node::new("select")
            .with_text("  SELECT * ")
            .with_text("FROM blog  ");
        assert_eq!(node.trimmed_text(), Some("SELECT * FROM blog"));
    }

    #[test]
    fn test_value_based_identifier() {
        let mapper = Node::new("mapper").with_attr("namespace", "demo.Blog");
        let result_map = Node::new("resultMap").with_attr("id", "blogMap");
        let association = Node::new("association").with_attr("property", "author.profile");
        let id = value_based_identifier(&[&mapper, &result_map, &association]);
        assert_eq!(id, "mapper_resultMap[blogMap]_association[author_profile]");
    }
}
