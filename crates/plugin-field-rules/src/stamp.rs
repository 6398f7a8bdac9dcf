//! Stamps updated records with the fields that changed.

use chrono::Utc;
use serde_json::json;

use triggerkit_dispatch::prelude::*;

/// Field receiving the sorted list of changed field names.
pub const CHANGED_FIELDS: &str = "changed_fields";
/// Field receiving the RFC 3339 stamp time.
pub const CHANGED_AT: &str = "changed_at";

/// Builds [`ChangeStamp`]; takes no additional data.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeStampConstructor;

impl PluginConstructor for ChangeStampConstructor {
    fn construct(
        &self,
        _records: &[Record],
        _context: &PhaseContext,
        _additional_data: Option<&str>,
    ) -> AppResult<Box<dyn PluginInstance>> {
        Ok(Box::new(ChangeStamp))
    }
}

/// Compares each updated record with its prior state.
///
/// Records without prior state are left alone.
#[derive(Debug)]
pub struct ChangeStamp;

impl PluginInstance for ChangeStamp {
    fn before_update(&mut self, records: &mut [Record], prior: &PriorState) -> AppResult<()> {
        let now = Utc::now().to_rfc3339();

        for record in records.iter_mut() {
            let Some(previous) = record.id.and_then(|id| prior.get(&id)) else {
                continue;
            };

            let changed: Vec<String> = record
                .changed_fields(previous)
                .into_iter()
                .filter(|f| f != CHANGED_FIELDS && f != CHANGED_AT)
                .collect();

            record.set(CHANGED_FIELDS, json!(changed));
            record.set(CHANGED_AT, json!(now));
        }
        Ok(())
    }
}
