//! Rejects batches where a record lacks a required field.

use triggerkit_dispatch::prelude::*;

/// Builds [`RequiredFields`] from a JSON array of field names.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredFieldsConstructor;

impl PluginConstructor for RequiredFieldsConstructor {
    fn construct(
        &self,
        _records: &[Record],
        _context: &PhaseContext,
        additional_data: Option<&str>,
    ) -> AppResult<Box<dyn PluginInstance>> {
        let data = additional_data
            .ok_or_else(|| AppError::plugin("required fields need a JSON array of field names"))?;

        let fields: Vec<String> = serde_json::from_str(data).map_err(|e| {
            AppError::plugin(format!("required fields must be a JSON array of strings: {e}"))
        })?;

        Ok(Box::new(RequiredFields { fields }))
    }
}

/// Fails insert and update phases when any record lacks a field.
#[derive(Debug)]
pub struct RequiredFields {
    fields: Vec<String>,
}

impl RequiredFields {
    fn check(&self, records: &[Record]) -> AppResult<()> {
        for (index, record) in records.iter().enumerate() {
            let missing: Vec<&str> = self
                .fields
                .iter()
                .filter(|field| !record.has_value(field))
                .map(String::as_str)
                .collect();

            if !missing.is_empty() {
                let which = record
                    .id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| format!("#{index}"));
                return Err(AppError::plugin(format!(
                    "record {which} is missing required fields: {}",
                    missing.join(", ")
                )));
            }
        }
        Ok(())
    }
}

impl PluginInstance for RequiredFields {
    fn before_insert(&mut self, records: &mut [Record]) -> AppResult<()> {
        self.check(records)
    }

    fn before_update(&mut self, records: &mut [Record], _prior: &PriorState) -> AppResult<()> {
        self.check(records)
    }
}
