//! Fills absent fields with configured defaults before insert.

use serde_json::{Map, Value};
use tracing::debug;

use triggerkit_dispatch::prelude::*;

/// Builds [`Defaults`] from a JSON object of field → default value.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultsConstructor;

impl PluginConstructor for DefaultsConstructor {
    fn construct(
        &self,
        _records: &[Record],
        _context: &PhaseContext,
        additional_data: Option<&str>,
    ) -> AppResult<Box<dyn PluginInstance>> {
        let data = additional_data
            .ok_or_else(|| AppError::plugin("field defaults need a JSON object of defaults"))?;

        let defaults: Map<String, Value> = serde_json::from_str(data).map_err(|e| {
            AppError::plugin(format!("field defaults must be a JSON object: {e}"))
        })?;

        Ok(Box::new(Defaults { defaults }))
    }
}

/// Sets each default on records where the field is absent or null.
#[derive(Debug)]
pub struct Defaults {
    defaults: Map<String, Value>,
}

impl PluginInstance for Defaults {
    fn before_insert(&mut self, records: &mut [Record]) -> AppResult<()> {
        let mut filled = 0;
        for record in records.iter_mut() {
            for (field, value) in &self.defaults {
                if !record.has_value(field) {
                    record.set(field, value.clone());
                    filled += 1;
                }
            }
        }
        debug!(filled, "Field defaults applied");
        Ok(())
    }
}
