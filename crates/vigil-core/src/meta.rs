//! Common resource metadata.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Name, namespace and key/value metadata shared by every vigil resource.
///
/// Fields are always serialized, even when empty, so the struct round-trips
/// through non-self-describing codecs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectMeta {
    /// Resource name, unique within its namespace.
    pub name: String,
    /// Namespace the resource belongs to.
    pub namespace: String,
    /// Free-form labels. Some label keys carry backend semantics
    /// (see `MANAGED_BY_LABEL`).
    pub labels: HashMap<String, String>,
    /// Free-form annotations, opaque to the backend.
    pub annotations: HashMap<String, String>,
}

impl ObjectMeta {
    /// Metadata with the given name and namespace and no labels.
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            labels: HashMap::new(),
            annotations: HashMap::new(),
        }
    }

    /// Value of a label, if present.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }
}
