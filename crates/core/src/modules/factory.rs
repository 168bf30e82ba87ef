use crate::config::FactoryConfig;
use crate::errors::ModuleError;
use crate::modules::definition::Target;
use crate::modules::instance::{lock, remove_instance, InstanceList};
use crate::modules::{
    DetachHandle, FactoryMetadata, InstanceId, ModuleDefinition, ModuleInstance, ModuleKind,
    ModuleRegistry,
};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Result of asking a factory for an instance
#[derive(Debug, Clone)]
pub enum ModuleOutput {
    /// Return value of a callback module
    Value(Value),
    /// Instance of a structured module, with the handle that detaches it
    Instance {
        instance: ModuleInstance,
        handle: DetachHandle,
    },
}

impl ModuleOutput {
    pub fn is_instance(&self) -> bool {
        matches!(self, ModuleOutput::Instance { .. })
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            ModuleOutput::Value(value) => Some(value),
            ModuleOutput::Instance { .. } => None,
        }
    }

    pub fn instance(&self) -> Option<&ModuleInstance> {
        match self {
            ModuleOutput::Instance { instance, .. } => Some(instance),
            ModuleOutput::Value(_) => None,
        }
    }

    pub fn handle(&self) -> Option<&DetachHandle> {
        match self {
            ModuleOutput::Instance { handle, .. } => Some(handle),
            ModuleOutput::Value(_) => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            ModuleOutput::Value(value) => Some(value),
            ModuleOutput::Instance { .. } => None,
        }
    }

    pub fn into_instance(self) -> Option<(ModuleInstance, DetachHandle)> {
        match self {
            ModuleOutput::Instance { instance, handle } => Some((instance, handle)),
            ModuleOutput::Value(_) => None,
        }
    }
}

/// Produces and tracks instances of one registered module
///
/// The factory classifies its definition once, checks declared dependencies
/// against the registry every time a structured instance is requested, and
/// keeps the live instances in creation order.
pub struct ModuleFactory {
    name: String,
    registry: Arc<dyn ModuleRegistry>,
    definition: ModuleDefinition,
    kind: ModuleKind,
    dependencies: Vec<String>,
    instances: Arc<InstanceList>,
    config: FactoryConfig,
}

impl ModuleFactory {
    /// Create a factory with the default configuration
    pub fn new(
        name: impl Into<String>,
        registry: Arc<dyn ModuleRegistry>,
        definition: ModuleDefinition,
    ) -> Self {
        Self::with_config(name, registry, definition, FactoryConfig::default())
    }

    /// Create a factory with an explicit configuration
    ///
    /// Declared dependency names are normalized here, once, according to
    /// `config.dependency_case`.
    pub fn with_config(
        name: impl Into<String>,
        registry: Arc<dyn ModuleRegistry>,
        definition: ModuleDefinition,
        config: FactoryConfig,
    ) -> Self {
        let name = name.into();
        let kind = definition.kind();
        let dependencies = definition
            .declared_dependencies()
            .unwrap_or_default()
            .iter()
            .map(|dep| config.dependency_case.apply(dep))
            .collect();

        tracing::debug!("Created factory for module '{}' ({})", name, kind);

        Self {
            name,
            registry,
            definition,
            kind,
            dependencies,
            instances: Arc::new(Mutex::new(Vec::new())),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ModuleKind {
        self.kind
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    /// Check if the structured definition exposes `method_name`
    pub fn has_method(&self, method_name: &str) -> bool {
        self.definition.has_method(method_name)
    }

    /// Check if the definition is a plain callback
    pub fn is_function(&self) -> bool {
        self.kind.is_callback()
    }

    pub fn is_singleton(&self) -> bool {
        self.kind.is_singleton()
    }

    /// Declared dependencies, case-normalized, in declared order
    pub fn get_dependencies(&self) -> Vec<String> {
        self.dependencies.clone()
    }

    /// Check if every declared dependency is registered
    pub fn dependencies_fulfilled(&self) -> bool {
        self.dependencies.iter().all(|dep| self.registry.has_module(dep))
    }

    /// Declared dependencies the registry does not know, in declared order
    pub fn missing_dependencies(&self) -> Vec<String> {
        if self.dependencies.is_empty() {
            return Vec::new();
        }

        let known: HashSet<String> = self.registry.module_names().into_iter().collect();
        self.dependencies
            .iter()
            .filter(|dep| !known.contains(dep.as_str()))
            .cloned()
            .collect()
    }

    /// Produce a value or instance from the module
    ///
    /// Callbacks are invoked with `args` and their result returned as is.
    /// Structured modules require all dependencies to be registered; a
    /// singleton returns its existing instance and ignores `args`.
    pub fn get_instance(&self, args: &[Value]) -> Result<ModuleOutput, ModuleError> {
        let class = match self.definition.target() {
            Target::Callback(callback) => return Ok(ModuleOutput::Value(callback(args))),
            Target::Class(class) => class,
        };

        if !self.dependencies_fulfilled() {
            let missing = self.missing_dependencies();
            tracing::warn!(
                "Module '{}' is missing dependencies: {}",
                self.name,
                missing.join(", ")
            );
            return Err(ModuleError::missing_dependency(&self.name, missing));
        }

        if self.is_singleton() {
            if let Some(existing) = self.first_instance() {
                if self.config.trace_instances {
                    tracing::trace!(
                        "Reusing singleton instance {} of module '{}'",
                        existing.id(),
                        self.name
                    );
                }
                return Ok(self.output(existing));
            }
        }

        // Constructors may call back into this factory, so the list stays unlocked here
        let value = class.construct_erased(&self.registry, args);
        let instance = ModuleInstance::new(self.name.clone(), value);

        {
            let mut instances = lock(&self.instances);
            if self.is_singleton() {
                if let Some(existing) = instances.first().cloned() {
                    drop(instances);
                    return Ok(self.output(existing));
                }
            }
            instances.push(instance.clone());
        }

        if self.config.trace_instances {
            tracing::debug!(
                "Created instance {} of module '{}'",
                instance.id(),
                self.name
            );
        }

        Ok(self.output(instance))
    }

    /// Live instances in creation order
    pub fn get_instances(&self) -> Vec<ModuleInstance> {
        lock(&self.instances).clone()
    }

    pub fn instance_count(&self) -> usize {
        lock(&self.instances).len()
    }

    /// Detach an instance by id, same as calling its [`DetachHandle`]
    pub fn detach(&self, id: InstanceId) -> bool {
        let removed = remove_instance(&self.instances, id);
        if removed && self.config.trace_instances {
            tracing::debug!("Detached instance {} of module '{}'", id, self.name);
        }
        removed
    }

    /// Introspection snapshot of the factory
    pub fn metadata(&self) -> FactoryMetadata {
        FactoryMetadata {
            name: self.name.clone(),
            kind: self.kind,
            dependencies: self.get_dependencies(),
            missing_dependencies: self.missing_dependencies(),
            instance_count: self.instance_count(),
            methods: self
                .definition
                .methods()
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }

    fn first_instance(&self) -> Option<ModuleInstance> {
        lock(&self.instances).first().cloned()
    }

    fn output(&self, instance: ModuleInstance) -> ModuleOutput {
        let handle = DetachHandle::new(&instance, &self.instances, self.config.trace_instances);
        ModuleOutput::Instance { instance, handle }
    }
}

impl std::fmt::Debug for ModuleFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleFactory")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("dependencies", &self.dependencies)
            .field("instance_count", &self.instance_count())
            .finish()
    }
}
