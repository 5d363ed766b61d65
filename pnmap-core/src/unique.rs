//! Insertion-ordered set of non-empty strings.
//!
//! Station facts accumulate here. The collection is small (a handful of
//! entries per station) so membership is a linear scan over a `Vec`,
//! which also keeps the order in which facts were first learned.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered sequence of distinct, non-empty strings.
///
/// Serialized as a plain JSON array. Deserialization goes through
/// [`UniqueSet::add`], so duplicates or blanks in a hand-edited state file
/// are dropped on load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct UniqueSet {
    values: Vec<String>,
}

impl UniqueSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` unless it is empty or already present.
    ///
    /// Returns true if the set grew.
    pub fn add(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        if value.is_empty() || self.contains(&value) {
            return false;
        }
        self.values.push(value);
        true
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keep only the `max` oldest entries.
    pub fn truncate(&mut self, max: usize) {
        self.values.truncate(max);
    }

    pub fn as_slice(&self) -> &[String] {
        &self.values
    }
}

impl From<Vec<String>> for UniqueSet {
    fn from(values: Vec<String>) -> Self {
        let mut set = UniqueSet::new();
        for v in values {
            set.add(v);
        }
        set
    }
}

impl From<UniqueSet> for Vec<String> {
    fn from(set: UniqueSet) -> Self {
        set.values
    }
}

impl<'a> IntoIterator for &'a UniqueSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl fmt::Display for UniqueSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.values.join(", "))
    }
}
