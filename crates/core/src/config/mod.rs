pub mod error;
pub mod factory_config;

pub use error::*;
pub use factory_config::*;
