//! Property mappings: which properties of which prototype nodes take per-row values.
//!
//! A mapping points at a node by its pre-order position in the prototype
//! tree, never by identity. The same position addresses the corresponding
//! node in every replica.

use indexmap::IndexMap;

/// How a caller names the node a mapping targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingTarget {
    /// The prototype widget itself.
    Root,
    /// The first node with this identity in the prototype tree.
    Id(String),
    /// The node at this pre-order position (the root is 0).
    Position(usize),
}

impl From<&str> for MappingTarget {
    fn from(id: &str) -> Self {
        MappingTarget::Id(id.to_string())
    }
}

impl From<String> for MappingTarget {
    fn from(id: String) -> Self {
        MappingTarget::Id(id)
    }
}

impl From<usize> for MappingTarget {
    fn from(position: usize) -> Self {
        MappingTarget::Position(position)
    }
}

impl std::fmt::Display for MappingTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MappingTarget::Root => write!(f, "root"),
            MappingTarget::Id(id) => write!(f, "`{id}`"),
            MappingTarget::Position(position) => write!(f, "at position {position}"),
        }
    }
}

/// A registered mapping. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    pub key: String,
    /// Pre-order position of the target node in the prototype tree.
    pub position: usize,
    /// Kind of the target node, checked again on every replica.
    pub kind: &'static str,
    pub property: String,
}

/// Mappings of one cell renderer, keyed by mapping key in registration order.
#[derive(Debug, Clone, Default)]
pub struct MappingRegistry {
    mappings: IndexMap<String, Mapping>,
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a mapping and returns its key.
    ///
    /// The key is `property` unless that is taken, in which case `property0`,
    /// `property1`, ... are tried in turn.
    pub fn register(&mut self, position: usize, kind: &'static str, property: &str) -> String {
        let mut key = property.to_string();
        let mut suffix = 0;
        while self.mappings.contains_key(&key) {
            key = format!("{property}{suffix}");
            suffix += 1;
        }
        self.mappings.insert(
            key.clone(),
            Mapping {
                key: key.clone(),
                position,
                kind,
                property: property.to_string(),
            },
        );
        key
    }

    pub fn binding(&self, key: &str) -> Option<&Mapping> {
        self.mappings.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.mappings.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.mappings.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
