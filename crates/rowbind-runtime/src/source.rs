//! XML sources
//!
//! Reduces XML documents to the attributed-node trees the engine consumes.
//! Whitespace-only text is dropped; other text and CDATA sections are
//! trimmed and joined onto the enclosing element with single spaces.

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use rowbind_engine::Node;
use thiserror::Error;

/// Errors raised while reading an XML source
#[derive(Debug, Error)]
pub enum SourceError {
    /// File could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Markup is not well formed
    #[error("XML parse error: {0}")]
    Syntax(String),

    /// Document holds no element
    #[error("XML parse error: no root element found")]
    NoRoot,

    /// Document ended inside an element
    #[error("XML parse error: unclosed element <{0}>")]
    Unclosed(String),
}

impl From<quick_xml::Error> for SourceError {
    fn from(err: quick_xml::Error) -> Self {
        SourceError::Syntax(err.to_string())
    }
}

/// Read and parse an XML file
pub fn read_source(path: &Path) -> Result<Node, SourceError> {
    let text = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_source(&text)
}

/// Parse an XML document into its root node
pub fn parse_source(xml: &str) -> Result<Node, SourceError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => stack.push(element(e)?),
            Event::Empty(ref e) => attach(&mut stack, &mut root, element(e)?)?,
            Event::End(_) => {
                let node = stack.pop().ok_or_else(|| SourceError::Syntax("unexpected closing tag".into()))?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(ref e) => {
                let text = e.unescape()?;
                append_text(&mut stack, &text);
            }
            Event::CData(ref e) => {
                let text = String::from_utf8_lossy(&e[..]).to_string();
                append_text(&mut stack, &text);
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(SourceError::Unclosed(open.name().to_string()));
    }
    root.ok_or(SourceError::NoRoot)
}

fn element(e: &BytesStart<'_>) -> Result<Node, SourceError> {
    let mut node = Node::new(String::from_utf8_lossy(e.name().as_ref()).to_string());
    for attr in e.attributes() {
        let attr = attr.map_err(|err| SourceError::Syntax(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr.unescape_value()?.to_string();
        node.set_attr(key, value);
    }
    Ok(node)
}

fn attach(stack: &mut [Node], root: &mut Option<Node>, node: Node) -> Result<(), SourceError> {
    match stack.last_mut() {
        Some(parent) => parent.push_child(node),
        None if root.is_none() => *root = Some(node),
        None => return Err(SourceError::Syntax(format!("second root element <{}>", node.name()))),
    }
    Ok(())
}

fn append_text(stack: &mut [Node], text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    if let Some(parent) = stack.last_mut() {
        if parent.text().is_some() {
            parent.append_text(" ");
        }
        parent.append_text(text);
    }
}
