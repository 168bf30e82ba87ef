use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;

/// Environment variable selecting how dependency names are normalized
pub const DEPENDENCY_CASE_ENV: &str = "WINTER_DEPENDENCY_CASE";

/// Environment variable toggling per-instance trace events
pub const TRACE_INSTANCES_ENV: &str = "WINTER_TRACE_INSTANCES";

/// Case normalization applied to declared dependency names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameCase {
    /// Lower-case every name
    #[default]
    Lower,
    /// Keep names exactly as declared
    Preserve,
}

impl NameCase {
    /// Apply the normalization to a single name
    pub fn apply(&self, name: &str) -> String {
        match self {
            NameCase::Lower => name.to_lowercase(),
            NameCase::Preserve => name.to_string(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NameCase::Lower => "lower",
            NameCase::Preserve => "preserve",
        }
    }
}

impl FromStr for NameCase {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lower" | "lowercase" => Ok(NameCase::Lower),
            "preserve" | "none" => Ok(NameCase::Preserve),
            _ => Err(ConfigError::invalid_value(
                "dependency_case",
                s,
                "lower or preserve",
            )),
        }
    }
}

impl std::fmt::Display for NameCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-factory settings
///
/// Defaults match the framework's historical behavior: dependency names are
/// lower-cased and instance creation is traced at debug level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    pub dependency_case: NameCase,
    pub trace_instances: bool,
}

impl FactoryConfig {
    pub fn new() -> Self {
        Self {
            dependency_case: NameCase::Lower,
            trace_instances: true,
        }
    }

    /// Set the dependency name normalization
    pub fn with_dependency_case(mut self, case: NameCase) -> Self {
        self.dependency_case = case;
        self
    }

    /// Enable or disable per-instance trace events
    pub fn with_trace_instances(mut self, enabled: bool) -> Self {
        self.trace_instances = enabled;
        self
    }

    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::new();

        if let Ok(case) = env::var(DEPENDENCY_CASE_ENV) {
            config.dependency_case = case.parse()?;
        }

        if let Ok(trace) = env::var(TRACE_INSTANCES_ENV) {
            config.trace_instances = trace.trim().parse().map_err(|_| {
                ConfigError::invalid_value("trace_instances", trace.clone(), "true or false")
            })?;
        }

        Ok(config)
    }

    /// Parse configuration from a YAML document
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self::new()
    }
}
