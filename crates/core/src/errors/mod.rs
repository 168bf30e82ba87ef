pub mod module;

pub use module::ModuleError;
