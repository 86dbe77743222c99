//! In-memory set with lookup by declared key fields
//!
//! Each declared key has an accessor returning the values an item exposes
//! for it. An accessor may return several values, in which case the item is
//! reachable under each of them. The index is a snapshot taken at insertion.
//!
//! # Example
//!
//! ```rust
//! use vrn_authz::indexed_set::IndexedSet;
//!
//! #[derive(Debug, PartialEq)]
//! struct Doc { id: String, tags: Vec<String> }
//!
//! let mut docs = IndexedSet::with_key("id", |d: &Doc| vec![d.id.clone()])
//!     .key("tag", |d: &Doc| d.tags.clone());
//!
//! docs.add(Doc { id: "1".into(), tags: vec!["a".into(), "b".into()] });
//!
//! assert_eq!(docs.by("tag", "b").len(), 1);
//! assert!(docs.by("tag", "c").is_empty());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Accessor producing the key values an item is indexed under
pub type KeyAccessor<T> = Box<dyn Fn(&T) -> Vec<String> + Send + Sync>;

/// Items exposing an `id` field, indexed under `"id"` by default
pub trait Identifiable {
    fn id(&self) -> String;
}

/// Set of items indexed by one or more declared keys
pub struct IndexedSet<T> {
    accessors: Vec<(String, KeyAccessor<T>)>,
    items: Vec<Arc<T>>,
    index: HashMap<String, HashMap<String, Vec<Arc<T>>>>,
}

impl<T: Identifiable> IndexedSet<T> {
    /// Creates a set indexed by `id`
    pub fn new() -> Self {
        Self::with_key("id", |item: &T| vec![item.id()])
    }
}

impl<T: Identifiable> Default for IndexedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IndexedSet<T> {
    /// Creates a set with a single declared key
    pub fn with_key<F>(name: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&T) -> Vec<String> + Send + Sync + 'static,
    {
        Self {
            accessors: Vec::new(),
            items: Vec::new(),
            index: HashMap::new(),
        }
        .key(name, accessor)
    }

    /// Declares another key
    ///
    /// Items already in the set are indexed under the new key as well.
    pub fn key<F>(mut self, name: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&T) -> Vec<String> + Send + Sync + 'static,
    {
        let name = name.into();
        let accessor: KeyAccessor<T> = Box::new(accessor);

        let by_value = self.index.entry(name.clone()).or_default();
        for item in &self.items {
            for value in key_values(&accessor, item) {
                by_value.entry(value).or_default().push(Arc::clone(item));
            }
        }

        self.accessors.push((name, accessor));
        self
    }

    /// Names of the declared keys
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.accessors.iter().map(|(name, _)| name.as_str())
    }

    /// Adds an item under every value of every declared key
    ///
    /// `None` is ignored.
    pub fn add(&mut self, item: impl Into<Option<T>>) -> &mut Self {
        let Some(item) = item.into() else {
            return self;
        };
        let item = Arc::new(item);

        for (name, accessor) in &self.accessors {
            let by_value = self.index.entry(name.clone()).or_default();
            for value in key_values(accessor, &item) {
                by_value.entry(value).or_default().push(Arc::clone(&item));
            }
        }

        self.items.push(item);
        self
    }

    /// Adds every item of a sequence
    pub fn concat<I>(&mut self, items: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
    {
        for item in items {
            self.add(item);
        }
        self
    }

    /// Items added under `key` = `value`
    ///
    /// Unknown keys and values yield an empty slice.
    pub fn by(&self, key: &str, value: &str) -> &[Arc<T>] {
        self.index
            .get(key)
            .and_then(|by_value| by_value.get(value))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Values present under a key
    pub fn values_of(&self, key: &str) -> Vec<&str> {
        self.index
            .get(key)
            .map(|by_value| by_value.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates items in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.items.iter()
    }
}

fn key_values<T>(accessor: &KeyAccessor<T>, item: &Arc<T>) -> Vec<String> {
    let mut values = accessor(item.as_ref());
    values.sort();
    values.dedup();
    values
}

impl<T> Extend<T> for IndexedSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.concat(iter);
    }
}

impl<T: fmt::Debug> fmt::Debug for IndexedSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexedSet")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .field("items", &self.items)
            .finish()
    }
}
