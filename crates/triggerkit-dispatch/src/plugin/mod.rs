//! Plugin author contract and constructor resolution.

pub mod loader;
pub mod registry;
pub mod traits;

pub use loader::DynamicLoader;
pub use registry::ConstructorRegistry;
pub use traits::{FnConstructor, PluginConstructor, PluginInstance};
