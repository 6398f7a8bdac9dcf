//! Field rule plugins for Triggerkit.
//!
//! Three constructors driven by registration data:
//!
//! - `field_rules.defaults` fills absent fields on insert
//! - `field_rules.required` rejects batches missing required fields
//! - `field_rules.change_stamp` records which fields an update changed

pub mod defaults;
pub mod required;
pub mod stamp;

use std::sync::Arc;

use triggerkit_dispatch::prelude::*;

pub use defaults::DefaultsConstructor;
pub use required::RequiredFieldsConstructor;
pub use stamp::ChangeStampConstructor;

/// Constructor reference of [`DefaultsConstructor`].
pub const DEFAULTS: &str = "field_rules.defaults";
/// Constructor reference of [`RequiredFieldsConstructor`].
pub const REQUIRED: &str = "field_rules.required";
/// Constructor reference of [`ChangeStampConstructor`].
pub const CHANGE_STAMP: &str = "field_rules.change_stamp";

/// Registers every field rule constructor.
pub fn register_all(registry: &mut ConstructorRegistry) -> AppResult<()> {
    registry.register(DEFAULTS, Arc::new(DefaultsConstructor))?;
    registry.register(REQUIRED, Arc::new(RequiredFieldsConstructor))?;
    registry.register(CHANGE_STAMP, Arc::new(ChangeStampConstructor))?;
    Ok(())
}
