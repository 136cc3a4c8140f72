//! Insert-once id maps with short-name lookup

use rustc_hash::FxHashMap;

use super::RegistryError;

#[derive(Debug, Clone)]
enum ShortName {
    Unique(String),
    Ambiguous(Vec<String>),
}

/// Map from qualified id to entity that rejects duplicate ids
///
/// Each qualified id is also reachable by its last segment as long as no
/// other id shares that segment.
#[derive(Debug, Clone)]
pub struct StrictMap<V> {
    kind: &'static str,
    entries: FxHashMap<String, V>,
    short_names: FxHashMap<String, ShortName>,
    order: Vec<String>,
}

impl<V> StrictMap<V> {
    /// Create an empty map labelled with the entity kind used in errors
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: FxHashMap::default(),
            short_names: FxHashMap::default(),
            order: Vec::new(),
        }
    }

    /// Entity kind label
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Insert under a new id
    pub fn add(&mut self, id: &str, value: V) -> Result<(), RegistryError> {
        if self.entries.contains_key(id) {
            return Err(RegistryError::Duplicate {
                kind: self.kind,
                id: id.to_string(),
            });
        }
        self.entries.insert(id.to_string(), value);
        self.order.push(id.to_string());

        let short = super::local_id_of(id);
        if short != id {
            let next = match self.short_names.remove(short) {
                None => ShortName::Unique(id.to_string()),
                Some(ShortName::Unique(other)) => ShortName::Ambiguous(vec![other, id.to_string()]),
                Some(ShortName::Ambiguous(mut all)) => {
                    all.push(id.to_string());
                    ShortName::Ambiguous(all)
                }
            };
            self.short_names.insert(short.to_string(), next);
        }
        Ok(())
    }

    /// Look up by qualified id or unique short name
    pub fn get(&self, id: &str) -> Result<&V, RegistryError> {
        if let Some(value) = self.entries.get(id) {
            return Ok(value);
        }
        match self.short_names.get(id) {
            Some(ShortName::Unique(full)) => self.entries.get(full).ok_or_else(|| self.not_found(id)),
            Some(ShortName::Ambiguous(candidates)) => Err(RegistryError::Ambiguous {
                kind: self.kind,
                id: id.to_string(),
                candidates: candidates.join(", "),
            }),
            None => Err(self.not_found(id)),
        }
    }

    /// Check whether `id` resolves to exactly one entity
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id) || matches!(self.short_names.get(id), Some(ShortName::Unique(_)))
    }

    /// Entities in insertion order
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    /// Qualified ids in insertion order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn not_found(&self, id: &str) -> RegistryError {
        RegistryError::NotFound {
            kind: self.kind,
            id: id.to_string(),
        }
    }
}
