//! Property naming and property-path tokenizing

use super::ReflectionError;

/// Derive the logical property name from an accessor method name
///
/// `getTitle` → `title`, `isActive` → `active`, `getURL` → `URL`.
pub fn method_to_property(method: &str) -> Result<String, ReflectionError> {
    let rest = if let Some(rest) = method.strip_prefix("is") {
        rest
    } else if let Some(rest) = method.strip_prefix("get").or_else(|| method.strip_prefix("set")) {
        rest
    } else {
        return Err(ReflectionError::NotAnAccessor(method.to_string()));
    };

    let mut chars: Vec<char> = rest.chars().collect();
    let keep_case = chars.len() > 1 && chars[1].is_uppercase();
    if !chars.is_empty() && !keep_case {
        chars[0] = chars[0].to_ascii_lowercase();
    }
    Ok(chars.into_iter().collect())
}

/// Check for an accessor-shaped method name
pub fn is_property(name: &str) -> bool {
    is_getter(name) || is_setter(name)
}

/// Check for a get-shaped method name
pub fn is_getter(name: &str) -> bool {
    (name.starts_with("get") && name.len() > 3) || (name.starts_with("is") && name.len() > 2)
}

/// Check for a set-shaped method name
pub fn is_setter(name: &str) -> bool {
    name.starts_with("set") && name.len() > 3
}

/// Check whether a property name may be exposed by the reflector
pub fn is_valid_property_name(name: &str) -> bool {
    !(name.starts_with('$') || name == "serialVersionUID" || name == "class")
}

/// One segment of a property path, with the remaining path
///
/// `orders[0].items.name` tokenizes to name `orders`, index `0`,
/// children `items.name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyTokenizer {
    name: String,
    indexed_name: String,
    index: Option<String>,
    children: Option<String>,
}

impl PropertyTokenizer {
    /// Tokenize the first segment of `path`
    pub fn new(path: &str) -> Self {
        let (head, children) = match path.find('.') {
            Some(dot) => (&path[..dot], Some(path[dot + 1..].to_string())),
            None => (path, None),
        };
        let indexed_name = head.to_string();
        let (name, index) = match head.find('[') {
            Some(open) => {
                let close = head.rfind(']').unwrap_or(head.len());
                let index = head.get(open + 1..close).unwrap_or("").to_string();
                (head[..open].to_string(), Some(index))
            }
            None => (head.to_string(), None),
        };
        Self {
            name,
            indexed_name,
            index,
            children,
        }
    }

    /// Segment name without index
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Segment as written, including any index
    pub fn indexed_name(&self) -> &str {
        &self.indexed_name
    }

    /// Index or map key inside brackets
    pub fn index(&self) -> Option<&str> {
        self.index.as_deref()
    }

    /// Remaining path after this segment
    pub fn children(&self) -> Option<&str> {
        self.children.as_deref()
    }

    /// Check whether more segments follow
    pub fn has_next(&self) -> bool {
        self.children.is_some()
    }

    /// Tokenizer for the remaining path
    pub fn next(&self) -> Option<PropertyTokenizer> {
        self.children.as_deref().map(PropertyTokenizer::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_to_property() {
        assert_eq!(method_to_property("getTitle").unwrap(), "title");
        assert_eq!(method_to_property("isActive").unwrap(), "active");
        assert_eq!(method_to_property("setX").unwrap(), "x");
        assert_eq!(method_to_property("getURL").unwrap(), "URL");
        assert!(method_to_property("fetchTitle").is_err());
    }

    #[test]
    fn test_accessor_shapes() {
        assert!(is_getter("getA"));
        assert!(!is_getter("get"));
        assert!(is_getter("isA"));
        assert!(!is_getter("is"));
        assert!(is_setter("setA"));
        assert!(!is_setter("set"));
        assert!(is_property("isOpen"));
    }

    #[test]
    fn test_reserved_names() {
        assert!(!is_valid_property_name("class"));
        assert!(!is_valid_property_name("$jacocoData"));
        assert!(!is_valid_property_name("serialVersionUID"));
        assert!(is_valid_property_name("title"));
    }

    #[test]
    fn test_tokenizer() {
        let tok = PropertyTokenizer::new("orders[0].items.name");
        assert_eq!(tok.name(), "orders");
        assert_eq!(tok.index(), Some("0"));
        assert_eq!(tok.indexed_name(), "orders[0]");
        assert_eq!(tok.children(), Some("items.name"));

        let next = tok.next().unwrap();
        assert_eq!(next.name(), "items");
        assert!(next.index().is_none());
        assert!(!next.next().unwrap().has_next());
    }
}
