use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Error returned when a key is inserted into a [`KeyIndex`] twice.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DuplicateKeyError(pub String);

impl DuplicateKeyError {
    #[must_use]
    pub fn key(&self) -> &str {
        &self.0
    }
}

impl Display for DuplicateKeyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Duplicate key: `{}`", self.0)
    }
}

impl Error for DuplicateKeyError {}

/// Mapping from string identifiers to associated values.
///
/// The index owns its keys; callers may reuse or drop the buffers they
/// inserted from. Inserting a key that is already present is rejected and
/// leaves the existing association untouched.
#[derive(Debug, Clone)]
pub struct KeyIndex<V> {
    map: HashMap<String, V>,
}

impl<V> KeyIndex<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
        }
    }

    /// Stores the association `key -> value`.
    ///
    /// # Examples
    /// ```
    /// use qfml::key_index::KeyIndex;
    ///
    /// let mut index = KeyIndex::new();
    /// index.insert("cell_1", 0u32).unwrap();
    ///
    /// assert_eq!(index.lookup("cell_1"), Some(&0));
    /// assert!(index.insert("cell_1", 1).is_err());
    /// ```
    pub fn insert<K: Into<String>>(&mut self, key: K, value: V) -> Result<(), DuplicateKeyError> {
        match self.map.entry(key.into()) {
            Entry::Occupied(entry) => Err(DuplicateKeyError(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(value);
                Ok(())
            }
        }
    }

    /// Returns the value associated with `key`, or `None` if the key is
    /// unknown. Whether a missing key is fatal is up to the caller.
    #[inline]
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&V> {
        self.map.get(key)
    }

    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.map.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl<V> Default for KeyIndex<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::key_index::{DuplicateKeyError, KeyIndex};

    #[test]
    fn lookup_returns_inserted_value() {
        let mut index = KeyIndex::with_capacity(2);
        index.insert("a", 1).unwrap();
        index.insert(String::from("b"), 2).unwrap();

        assert_eq!(index.lookup("a"), Some(&1));
        assert_eq!(index.lookup("b"), Some(&2));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn lookup_of_unknown_key_is_none() {
        let index: KeyIndex<u32> = KeyIndex::new();

        assert!(index.is_empty());
        assert_eq!(index.lookup("missing"), None);
        assert!(!index.contains_key("missing"));
    }

    #[test]
    fn duplicate_insert_keeps_first_value() {
        let mut index = KeyIndex::new();
        index.insert("a", 1).unwrap();
        let error = index.insert("a", 2).unwrap_err();

        assert_eq!(error, DuplicateKeyError("a".to_owned()));
        assert_eq!(error.key(), "a");
        assert_eq!(index.lookup("a"), Some(&1));
    }

    #[test]
    fn keys_outlive_caller_buffers() {
        let mut index = KeyIndex::new();
        let mut line = String::from("cell_1");
        index.insert(line.as_str(), 0).unwrap();
        line.clear();
        line.push_str("cell_2");
        index.insert(line.as_str(), 1).unwrap();

        assert_eq!(index.lookup("cell_1"), Some(&0));
        assert_eq!(index.lookup("cell_2"), Some(&1));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            format!("{}", DuplicateKeyError("x".to_owned())),
            "Duplicate key: `x`"
        );
    }
}
