//! Ordered, copy-on-write argument mapping.

use super::Expression;
use indexmap::IndexMap;
use std::sync::Arc;

/// Named arguments bound to a call, composition, or argument reference.
///
/// Insertion order is kept because it is visible on the wire. Cloning is a
/// reference-count bump; writes copy the map only when it is shared.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Arguments(Arc<IndexMap<String, Expression>>);

impl Arguments {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a mapping with `key` bound to `value`.
    ///
    /// Rebinding an existing key keeps its original position.
    pub fn insert(mut self, key: impl Into<String>, value: impl Into<Expression>) -> Self {
        Arc::make_mut(&mut self.0).insert(key.into(), value.into());
        self
    }

    /// Overlays `other` on top of this mapping; keys in `other` win.
    pub fn merged(&self, other: &Arguments) -> Arguments {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }

        let mut merged = self.clone();
        let map = Arc::make_mut(&mut merged.0);
        for (key, value) in other.iter() {
            map.insert(key.clone(), value.clone());
        }
        merged
    }

    pub fn get(&self, key: &str) -> Option<&Expression> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Expression)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Checks whether both mappings share the same allocation.
    pub fn ptr_eq(&self, other: &Arguments) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<K, V> FromIterator<(K, V)> for Arguments
where
    K: Into<String>,
    V: Into<Expression>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let map = iter
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Arguments(Arc::new(map))
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Arguments
where
    K: Into<String>,
    V: Into<Expression>,
{
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a Arguments {
    type Item = (&'a String, &'a Expression);
    type IntoIter = indexmap::map::Iter<'a, String, Expression>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_does_not_touch_shared_copies() {
        let original = Arguments::from([("length", 1)]);
        let derived = original.clone().insert("length", 2);

        assert_eq!(original.get("length"), Some(&Expression::from(1)));
        assert_eq!(derived.get("length"), Some(&Expression::from(2)));
    }

    #[test]
    fn merge_overlays_and_keeps_order() {
        let base = Arguments::from([("a", 1), ("b", 2)]);
        let overlay = Arguments::from([("b", 3), ("c", 4)]);

        let merged = base.merged(&overlay);
        let keys: Vec<&str> = merged.keys().collect();

        assert_eq!(keys, ["a", "b", "c"]);
        assert_eq!(merged.get("b"), Some(&Expression::from(3)));
        assert_eq!(base.get("b"), Some(&Expression::from(2)));
    }

    #[test]
    fn merging_empty_shares_allocation() {
        let base = Arguments::from([("a", 1)]);

        assert!(base.merged(&Arguments::new()).ptr_eq(&base));
        assert!(Arguments::new().merged(&base).ptr_eq(&base));
    }
}
