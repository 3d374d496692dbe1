//! Extension data attached to persons and activities.
//!
//! Competition snapshots carry free-form extension containers keyed by
//! namespaced type strings (e.g. `assign.Properties`). Each namespace holds a
//! single [`ExtensionValue`], which is a small tagged union able to represent
//! anything a JSON document can.
//!
//! # Get-or-create
//! Callers that write into a namespace use [`Extensions::get_or_insert_with`],
//! which creates the default value the first time the namespace is touched.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Namespace holding custom per-person properties (a map of name → value).
pub const PROPERTIES_NAMESPACE: &str = "assign.Properties";

/// Namespace holding the featured competitors of a group (a list of ids).
pub const FEATURED_NAMESPACE: &str = "assign.FeaturedCompetitors";

/// A polymorphic extension value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtensionValue {
    /// Boolean flag.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// Free text.
    Text(String),
    /// Ordered list of values.
    List(Vec<ExtensionValue>),
    /// Nested string-keyed map.
    Map(BTreeMap<String, ExtensionValue>),
}

impl ExtensionValue {
    /// Creates an empty map value.
    pub fn empty_map() -> Self {
        Self::Map(BTreeMap::new())
    }

    /// Creates an empty list value.
    pub fn empty_list() -> Self {
        Self::List(Vec::new())
    }

    /// Numeric view. Booleans map to 1.0 / 0.0.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Text view.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean view.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Map view.
    pub fn as_map(&self) -> Option<&BTreeMap<String, ExtensionValue>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// List view.
    pub fn as_list(&self) -> Option<&[ExtensionValue]> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    /// Whether the value counts as "set": non-zero, non-empty, or `true`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Text(s) => !s.is_empty(),
            Self::List(l) => !l.is_empty(),
            Self::Map(_) => true,
        }
    }

    /// Stable textual key, used when grouping people by a value.
    pub fn key_string(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
            other => serde_json::to_string(other).unwrap_or_default(),
        }
    }
}

impl From<f64> for ExtensionValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u32> for ExtensionValue {
    fn from(value: u32) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for ExtensionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for ExtensionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ExtensionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Namespaced extension container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Extensions {
    entries: BTreeMap<String, ExtensionValue>,
}

impl Extensions {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value stored under a namespace.
    pub fn get(&self, namespace: &str) -> Option<&ExtensionValue> {
        self.entries.get(namespace)
    }

    /// Mutable value stored under a namespace.
    pub fn get_mut(&mut self, namespace: &str) -> Option<&mut ExtensionValue> {
        self.entries.get_mut(namespace)
    }

    /// Returns the namespace's value, inserting `default()` first if absent.
    pub fn get_or_insert_with(
        &mut self,
        namespace: &str,
        default: impl FnOnce() -> ExtensionValue,
    ) -> &mut ExtensionValue {
        self.entries
            .entry(namespace.to_string())
            .or_insert_with(default)
    }

    /// Replaces the namespace's value.
    pub fn insert(&mut self, namespace: impl Into<String>, value: ExtensionValue) {
        self.entries.insert(namespace.into(), value);
    }

    /// Removes a namespace, returning its value.
    pub fn remove(&mut self, namespace: &str) -> Option<ExtensionValue> {
        self.entries.remove(namespace)
    }

    /// Whether the container holds no namespaces.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reads `key` from the map stored under `namespace`.
    pub fn map_entry(&self, namespace: &str, key: &str) -> Option<&ExtensionValue> {
        self.get(namespace)?.as_map()?.get(key)
    }

    /// Writes `key` into the map stored under `namespace`.
    ///
    /// A non-map value already stored under the namespace is replaced by a map.
    pub fn set_map_entry(&mut self, namespace: &str, key: impl Into<String>, value: ExtensionValue) {
        let slot = self.get_or_insert_with(namespace, ExtensionValue::empty_map);
        if !matches!(slot, ExtensionValue::Map(_)) {
            *slot = ExtensionValue::empty_map();
        }
        if let ExtensionValue::Map(map) = slot {
            map.insert(key.into(), value);
        }
    }
}
