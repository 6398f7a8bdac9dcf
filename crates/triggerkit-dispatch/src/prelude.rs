//! Prelude for plugin authors.

pub use triggerkit_core::error::AppError;
pub use triggerkit_core::result::AppResult;
pub use triggerkit_core::types::{PriorState, Record, RecordId};

pub use crate::context::{OperationKind, PhaseContext};
pub use crate::plugin::{ConstructorRegistry, FnConstructor, PluginConstructor, PluginInstance};
pub use crate::registration::RegistrationRow;

pub use crate::registration_row;
