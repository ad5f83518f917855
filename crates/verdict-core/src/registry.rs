//! Key-based entity registries
//!
//! Both the crowd (agents) and the sample (subjects) live in a registry
//! with create-on-first-sight semantics: `get_or_create_with` is the only
//! insertion path, so duplicate keys are unreachable by construction and
//! there is no delete.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{Agent, Subject};

/// All known agents, keyed by annotator identifier.
pub type CrowdRegistry = Registry<Agent>;

/// All known subjects, keyed by item identifier.
pub type SampleRegistry = Registry<Subject>;

/// Map from identifier to entity with get-or-create as the sole mutation
/// entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry<T> {
    entries: HashMap<String, T>,
}

impl<T> Registry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Return the entry for `key`, constructing and inserting it with
    /// `factory` on first sight.
    pub fn get_or_create_with(&mut self, key: &str, factory: impl FnOnce() -> T) -> &mut T {
        self.entries
            .entry(key.to_string())
            .or_insert_with(factory)
    }

    /// Look up an entry without creating it.
    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.get(key)
    }

    /// Check whether a key is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterate over all registered keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate over all entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate over all values.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn get_or_create_inserts_once() {
        let mut registry: Registry<u32> = Registry::new();

        let first = *registry.get_or_create_with("alice", || 1);
        let second = *registry.get_or_create_with("alice", || 2);

        assert_eq!(first, 1);
        assert_eq!(second, 1); // factory not called again
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn repeated_keys_never_duplicate() {
        let mut registry: Registry<u32> = Registry::new();
        for i in 0..100 {
            registry.get_or_create_with(&format!("key-{}", i % 7), || i);
        }
        assert_eq!(registry.len(), 7);
    }

    #[test]
    fn lookup_without_creation() {
        let mut registry: Registry<u32> = Registry::new();
        registry.get_or_create_with("alice", || 1);

        assert!(registry.contains("alice"));
        assert!(!registry.contains("bob"));
        assert_eq!(registry.get("alice"), Some(&1));
        assert_eq!(registry.get("bob"), None);
    }

    #[test]
    fn serializes_as_transparent_map() {
        let mut registry: Registry<u32> = Registry::new();
        registry.get_or_create_with("alice", || 1);

        let json = serde_json::to_string(&registry).unwrap();
        assert_eq!(json, r#"{"alice":1}"#);

        let back: Registry<u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, registry);
    }
}
