//! Attribute snapshots: the serializable half of a session.

use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;
use std::fmt;

/// Name of a persistable field, qualified by the type that declares it.
///
/// Two types in one view (the shared `ViewCore` and the concrete view) may
/// each declare a field called `page`; their qualified names
/// `ViewCore.page` and `RolePriorityView.page` stay distinct. Fields private
/// to their declaring type render as `Owner.__field`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    pub owner: &'static str,
    pub field: &'static str,
    pub private: bool,
}

impl QualifiedName {
    pub const fn public(owner: &'static str, field: &'static str) -> Self {
        Self {
            owner,
            field,
            private: false,
        }
    }

    pub const fn private(owner: &'static str, field: &'static str) -> Self {
        Self {
            owner,
            field,
            private: true,
        }
    }

    /// The snapshot key this field is stored under.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.private {
            write!(f, "{}.__{}", self.owner, self.field)
        } else {
            write!(f, "{}.{}", self.owner, self.field)
        }
    }
}

/// Flat mapping of qualified field name to its JSON value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct AttributeSnapshot(pub BTreeMap<String, serde_json::Value>);

impl AttributeSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.0.iter()
    }

    /// Render as `key='value', ...` for error messages.
    pub fn describe(&self) -> String {
        self.0
            .iter()
            .map(|(key, value)| format!("{key}='{value}'"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromIterator<(String, serde_json::Value)> for AttributeSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, serde_json::Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
