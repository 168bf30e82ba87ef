use thiserror::Error;

/// Errors raised while producing module instances
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleError {
    #[error("Module '{module}' is missing dependencies: {}", .missing.join(", "))]
    MissingDependency { module: String, missing: Vec<String> },
}

impl ModuleError {
    /// Create a missing dependency error
    pub fn missing_dependency(module: impl Into<String>, missing: Vec<String>) -> Self {
        Self::MissingDependency {
            module: module.into(),
            missing,
        }
    }

    /// Check if the error is a missing dependency error
    pub fn is_missing_dependency(&self) -> bool {
        matches!(self, Self::MissingDependency { .. })
    }

    /// Name of the module that failed to instantiate
    pub fn module(&self) -> &str {
        match self {
            Self::MissingDependency { module, .. } => module,
        }
    }

    /// Unmet dependency names, in declared order
    pub fn missing(&self) -> &[String] {
        match self {
            Self::MissingDependency { missing, .. } => missing,
        }
    }
}
