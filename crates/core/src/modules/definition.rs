use crate::config::ConfigError;
use crate::modules::ModuleRegistry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// How a module definition produces values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    /// Plain function, invoked directly on every request
    Callback,
    /// Structured module with at most one live instance
    Singleton,
    /// Structured module with any number of live instances
    Multi,
}

impl ModuleKind {
    pub fn is_callback(&self) -> bool {
        matches!(self, ModuleKind::Callback)
    }

    pub fn is_singleton(&self) -> bool {
        matches!(self, ModuleKind::Singleton)
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, ModuleKind::Multi)
    }

    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKind::Callback => "callback",
            ModuleKind::Singleton => "singleton",
            ModuleKind::Multi => "multi",
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ModuleKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "callback" => Ok(ModuleKind::Callback),
            "singleton" => Ok(ModuleKind::Singleton),
            "multi" => Ok(ModuleKind::Multi),
            _ => Err(ConfigError::invalid_value(
                "module_kind",
                s,
                "callback, singleton, or multi",
            )),
        }
    }
}

/// A structured module definition
///
/// Implementors describe how to build an instance from the registry and the
/// caller's arguments, and optionally which other modules must be registered
/// before an instance can be built.
pub trait ModuleClass: Send + Sync + 'static {
    type Instance: Send + Sync + 'static;

    /// Build a new instance
    fn construct(&self, registry: &Arc<dyn ModuleRegistry>, args: &[Value]) -> Self::Instance;

    /// Declared dependencies, or `None` when the module declares none at all
    fn dependencies(&self) -> Option<Vec<String>> {
        None
    }

    /// Callable members exposed by instances of this module
    fn methods(&self) -> &[&'static str] {
        &[]
    }
}

/// Member name under which structured modules declare their dependencies
pub const DEPENDENCIES_METHOD: &str = "dependencies";

/// Signature of callback modules
pub type CallbackFn = dyn Fn(&[Value]) -> Value + Send + Sync;

/// Object-safe view of a [`ModuleClass`] with its instance type erased
pub(crate) trait ErasedClass: Send + Sync {
    fn construct_erased(
        &self,
        registry: &Arc<dyn ModuleRegistry>,
        args: &[Value],
    ) -> Arc<dyn Any + Send + Sync>;

    fn declared_dependencies(&self) -> Option<Vec<String>>;

    fn method_names(&self) -> &[&'static str];
}

impl<C: ModuleClass> ErasedClass for C {
    fn construct_erased(
        &self,
        registry: &Arc<dyn ModuleRegistry>,
        args: &[Value],
    ) -> Arc<dyn Any + Send + Sync> {
        Arc::new(self.construct(registry, args))
    }

    fn declared_dependencies(&self) -> Option<Vec<String>> {
        <C as ModuleClass>::dependencies(self)
    }

    fn method_names(&self) -> &[&'static str] {
        <C as ModuleClass>::methods(self)
    }
}

#[derive(Clone)]
enum DefinitionBody {
    Callback(Arc<CallbackFn>),
    Class {
        kind: ModuleKind,
        class: Arc<dyn ErasedClass>,
    },
}

/// A registered module definition, classified once at registration
#[derive(Clone)]
pub struct ModuleDefinition {
    body: DefinitionBody,
}

impl ModuleDefinition {
    /// Wrap a plain function
    pub fn callback<F>(callback: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self {
            body: DefinitionBody::Callback(Arc::new(callback)),
        }
    }

    /// Wrap a structured module that keeps a single live instance
    pub fn singleton<C: ModuleClass>(class: C) -> Self {
        Self::class(ModuleKind::Singleton, class)
    }

    /// Wrap a structured module that may have many live instances
    pub fn multi<C: ModuleClass>(class: C) -> Self {
        Self::class(ModuleKind::Multi, class)
    }

    fn class<C: ModuleClass>(kind: ModuleKind, class: C) -> Self {
        Self {
            body: DefinitionBody::Class {
                kind,
                class: Arc::new(class),
            },
        }
    }

    pub fn kind(&self) -> ModuleKind {
        match &self.body {
            DefinitionBody::Callback(_) => ModuleKind::Callback,
            DefinitionBody::Class { kind, .. } => *kind,
        }
    }

    /// Dependencies exactly as declared; `None` for callbacks and for
    /// structured modules without a dependency declaration
    pub fn declared_dependencies(&self) -> Option<Vec<String>> {
        match &self.body {
            DefinitionBody::Callback(_) => None,
            DefinitionBody::Class { class, .. } => class.declared_dependencies(),
        }
    }

    pub fn methods(&self) -> &[&'static str] {
        match &self.body {
            DefinitionBody::Callback(_) => &[],
            DefinitionBody::Class { class, .. } => class.method_names(),
        }
    }

    /// Check if the structured definition exposes `method_name`
    ///
    /// A dependency declaration counts as the `dependencies` member.
    pub fn has_method(&self, method_name: &str) -> bool {
        if method_name == DEPENDENCIES_METHOD && self.declared_dependencies().is_some() {
            return true;
        }
        self.methods().iter().any(|m| *m == method_name)
    }

    pub(crate) fn target(&self) -> Target<'_> {
        match &self.body {
            DefinitionBody::Callback(callback) => Target::Callback(&**callback),
            DefinitionBody::Class { class, .. } => Target::Class(&**class),
        }
    }
}

/// Borrowed view of what a definition wraps
pub(crate) enum Target<'a> {
    Callback(&'a CallbackFn),
    Class(&'a dyn ErasedClass),
}

impl fmt::Debug for ModuleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDefinition")
            .field("kind", &self.kind())
            .field("dependencies", &self.declared_dependencies())
            .field("methods", &self.methods())
            .finish()
    }
}
