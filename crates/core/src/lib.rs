//! Module factories for the Winter front-end framework.
//!
//! A [`ModuleFactory`] wraps one registered [`ModuleDefinition`], checks its
//! declared dependencies against the [`ModuleRegistry`] and tracks the live
//! instances built from it.

pub mod config;
pub mod errors;
pub mod modules;

pub use config::{ConfigError, FactoryConfig, NameCase};
pub use errors::ModuleError;
pub use modules::{
    DetachHandle, FactoryMetadata, InstanceId, ModuleClass, ModuleDefinition, ModuleFactory,
    ModuleInstance, ModuleKind, ModuleOutput, ModuleRegistry,
};
