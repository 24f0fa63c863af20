use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One activity log line: a free-text client descriptor plus whatever else
/// the router attached. Read-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub descriptor: String,
    pub metadata: IndexMap<String, serde_json::Value>,
}

impl ActivityEntry {
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
            metadata: IndexMap::new(),
        }
    }
}
