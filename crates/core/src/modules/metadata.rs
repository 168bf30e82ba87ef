//! Serializable snapshots of factory state for introspection tooling.

use crate::modules::ModuleKind;
use serde::{Deserialize, Serialize};

/// Point-in-time description of a [`ModuleFactory`](crate::modules::ModuleFactory)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryMetadata {
    pub name: String,
    pub kind: ModuleKind,
    /// Normalized dependency names, in declared order
    pub dependencies: Vec<String>,
    /// Dependencies unknown to the registry when the snapshot was taken
    pub missing_dependencies: Vec<String>,
    pub instance_count: usize,
    pub methods: Vec<String>,
}

impl FactoryMetadata {
    /// Check if the module could be instantiated when the snapshot was taken
    pub fn is_ready(&self) -> bool {
        self.missing_dependencies.is_empty()
    }

    /// Render the snapshot as pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
