pub mod definition;
pub mod factory;
pub mod instance;
pub mod metadata;
pub mod registry;

pub use definition::*;
pub use factory::*;
pub use instance::{DetachHandle, InstanceId, ModuleInstance};
pub use metadata::*;
pub use registry::*;
