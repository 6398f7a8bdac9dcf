//! # triggerkit-dispatch
//!
//! Registry and ordered dispatch engine for entity lifecycle plugins.
//! Provides:
//!
//! - Registrations binding constructor references to entity kinds with order keys
//! - A registration store over pluggable configuration sources
//! - Ascending order-key ordering with unordered ties
//! - The two-role plugin contract (constructor + per-phase instance)
//! - Fail-fast, fail-all dispatch reporting every record of an aborted batch
//! - Runtime bypasses and permission gating
//! - Optional dynamic constructor loading via `libloading`

pub mod bypass;
pub mod context;
pub mod engine;
pub mod error;
pub mod macros;
pub mod order;
pub mod plugin;
pub mod prelude;
pub mod registration;
pub mod store;

pub use bypass::BypassRegistry;
pub use context::{OperationKind, PhaseContext};
pub use engine::{DispatchEngine, DispatchFailure, DispatchResult, DispatchSuccess};
pub use error::DispatchError;
pub use plugin::{ConstructorRegistry, FnConstructor, PluginConstructor, PluginInstance};
pub use registration::{KindSettings, Registration, RegistrationRow};
pub use store::{RegistrationSource, RegistrationStore, ResolvedRegistration};
