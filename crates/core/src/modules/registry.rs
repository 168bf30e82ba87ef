use std::collections::{BTreeSet, HashSet};

/// Membership queries the module registry answers for its factories
///
/// The framework's registry owns every factory and implements this trait;
/// factories only ever ask whether a module name is known.
pub trait ModuleRegistry: Send + Sync {
    /// Check if a module is registered under `name`
    fn has_module(&self, name: &str) -> bool;

    /// Names of all registered modules
    fn module_names(&self) -> Vec<String>;
}

impl ModuleRegistry for HashSet<String> {
    fn has_module(&self, name: &str) -> bool {
        self.contains(name)
    }

    fn module_names(&self) -> Vec<String> {
        self.iter().cloned().collect()
    }
}

impl ModuleRegistry for BTreeSet<String> {
    fn has_module(&self, name: &str) -> bool {
        self.contains(name)
    }

    fn module_names(&self) -> Vec<String> {
        self.iter().cloned().collect()
    }
}

impl ModuleRegistry for Vec<String> {
    fn has_module(&self, name: &str) -> bool {
        self.iter().any(|n| n == name)
    }

    fn module_names(&self) -> Vec<String> {
        self.clone()
    }
}
