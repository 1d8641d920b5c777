//! Collection alias table
//!
//! Callers address collections by short aliases; the table maps each alias to
//! the real collection name. Names without an entry resolve to themselves.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Alias to real collection name mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionMapping {
    aliases: HashMap<String, String>,
}

impl CollectionMapping {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a collection reference to its real name
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Add or overwrite a single alias
    pub fn insert(&mut self, alias: impl Into<String>, real_name: impl Into<String>) {
        self.aliases.insert(alias.into(), real_name.into());
    }

    /// Merge aliases into the table, overwriting entries with the same alias
    pub fn merge<I, K, V>(&mut self, aliases: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (alias, real_name) in aliases {
            self.insert(alias, real_name);
        }
    }

    /// Remove an alias, returning the real name it pointed to
    pub fn remove(&mut self, alias: &str) -> Option<String> {
        self.aliases.remove(alias)
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.aliases.contains_key(alias)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Iterate over the known aliases
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.aliases.keys().map(String::as_str)
    }

    /// Iterate over `(alias, real_name)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for CollectionMapping
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        mapping.merge(iter);
        mapping
    }
}

impl From<HashMap<String, String>> for CollectionMapping {
    fn from(aliases: HashMap<String, String>) -> Self {
        Self { aliases }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CollectionMapping {
        [("a", "b"), ("c", "d")].into_iter().collect()
    }

    #[test]
    fn test_resolve_mapped_alias() {
        let mapping = sample();
        assert_eq!(mapping.resolve("a"), "b");
        assert_eq!(mapping.resolve("c"), "d");
    }

    #[test]
    fn test_resolve_unmapped_is_identity() {
        let mapping = sample();
        assert_eq!(mapping.resolve("b"), "b");
        assert_eq!(mapping.resolve("users"), "users");
        assert_eq!(CollectionMapping::new().resolve(""), "");
    }

    #[test]
    fn test_resolution_is_not_transitive() {
        let mapping: CollectionMapping = [("a", "b"), ("b", "c")].into_iter().collect();
        assert_eq!(mapping.resolve("a"), "b");
    }

    #[test]
    fn test_merge_keeps_existing_and_overwrites_same_alias() {
        let mut mapping = sample();
        mapping.merge([("a", "z"), ("e", "f")]);

        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping.resolve("a"), "z");
        assert_eq!(mapping.resolve("c"), "d");
        assert_eq!(mapping.resolve("e"), "f");
    }

    #[test]
    fn test_remove() {
        let mut mapping = sample();
        assert_eq!(mapping.remove("a"), Some("b".to_string()));
        assert!(!mapping.contains("a"));
        assert_eq!(mapping.resolve("a"), "a");
        assert_eq!(mapping.remove("missing"), None);
    }

    #[test]
    fn test_aliases_lists_keys_only() {
        let mapping = sample();
        let mut aliases: Vec<_> = mapping.aliases().collect();
        aliases.sort_unstable();
        assert_eq!(aliases, vec!["a", "c"]);
    }

    #[test]
    fn test_deserialize_from_json_object() {
        let mapping: CollectionMapping =
            serde_json::from_str(r#"{"users": "app_users"}"#).unwrap();
        assert_eq!(mapping.resolve("users"), "app_users");
    }
}
