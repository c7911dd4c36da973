//! Ordered parameter table handed to the execution layer.

use serde::ser::{Serialize, Serializer};

use crate::error::{Result, SqlError};
use crate::value::SqlValue;

/// An ordered map of parameter names to bound values.
///
/// Names are stored without the dialect placeholder marker (`Param1`, not
/// `@Param1`). Iteration follows insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    entries: Vec<(String, SqlValue)>,
}

impl Parameters {
    /// Creates an empty parameter table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Binds `value` to `name`, replacing any previous binding.
    pub fn insert(&mut self, name: impl Into<String>, value: SqlValue) {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == name) {
            slot.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    /// Merges another table, failing on the first name already present.
    pub fn try_extend(&mut self, other: &Self) -> Result<()> {
        for (name, value) in other {
            if self.contains_key(name) {
                return Err(SqlError::ParameterCollision(name.clone()));
            }
            self.entries.push((name.clone(), value.clone()));
        }
        Ok(())
    }

    /// Returns the value bound to `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Returns true when `name` is bound.
    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns the number of bound parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over parameter names in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterates over `(name, value)` pairs in order.
    pub fn iter(&self) -> std::slice::Iter<'_, (String, SqlValue)> {
        self.entries.iter()
    }

    pub(crate) fn sort_by_key<K: Ord>(&mut self, f: impl FnMut(&(String, SqlValue)) -> K) {
        self.entries.sort_by_key(f);
    }
}

impl<'a> IntoIterator for &'a Parameters {
    type Item = &'a (String, SqlValue);
    type IntoIter = std::slice::Iter<'a, (String, SqlValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for Parameters {
    type Item = (String, SqlValue);
    type IntoIter = std::vec::IntoIter<(String, SqlValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(String, SqlValue)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (String, SqlValue)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

impl Serialize for Parameters {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(k, v)| (k, v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_order_and_replaces() {
        let mut params = Parameters::new();
        params.insert("Param2", SqlValue::Int(2));
        params.insert("Param1", SqlValue::Int(1));
        params.insert("Param2", SqlValue::Int(20));

        let keys: Vec<&str> = params.keys().collect();
        assert_eq!(keys, ["Param2", "Param1"]);
        assert_eq!(params.get("Param2"), Some(&SqlValue::Int(20)));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_try_extend_rejects_collisions() {
        let mut left: Parameters = [(String::from("Param1"), SqlValue::Int(1))]
            .into_iter()
            .collect();
        let right: Parameters = [(String::from("Param1"), SqlValue::Int(9))]
            .into_iter()
            .collect();

        let err = left.try_extend(&right).unwrap_err();
        assert!(matches!(err, SqlError::ParameterCollision(name) if name == "Param1"));
    }

    #[test]
    fn test_serializes_as_object() {
        let params: Parameters = [
            (String::from("Param1"), SqlValue::Text(String::from("a@b.com"))),
            (String::from("Param2"), SqlValue::Bool(true)),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(json, r#"{"Param1":"a@b.com","Param2":true}"#);
    }
}
