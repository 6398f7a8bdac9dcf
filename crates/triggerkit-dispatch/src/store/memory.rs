//! In-memory registration source.
//!
//! Backed by concurrent maps so fixtures and host code can edit the
//! configuration between (or during) dispatches of unrelated kinds.

use dashmap::DashMap;

use triggerkit_core::result::AppResult;

use super::RegistrationSource;
use crate::registration::{KindSettings, RegistrationRow};

/// Registrations held in memory, keyed by target kind.
#[derive(Debug, Default)]
pub struct MemorySource {
    rows: DashMap<String, Vec<RegistrationRow>>,
    settings: DashMap<String, KindSettings>,
}

impl MemorySource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source holding the given rows.
    pub fn from_rows(rows: impl IntoIterator<Item = RegistrationRow>) -> Self {
        let source = Self::new();
        source.extend(rows);
        source
    }

    /// Adds one row.
    pub fn add(&self, row: RegistrationRow) {
        self.rows
            .entry(row.target_kind.clone())
            .or_default()
            .push(row);
    }

    /// Adds several rows.
    pub fn extend(&self, rows: impl IntoIterator<Item = RegistrationRow>) {
        for row in rows {
            self.add(row);
        }
    }

    /// Removes every row for a kind.
    pub fn remove_kind(&self, kind: &str) -> Vec<RegistrationRow> {
        self.rows.remove(kind).map(|(_, rows)| rows).unwrap_or_default()
    }

    /// Sets kind-wide settings.
    pub fn set_kind_settings(&self, settings: KindSettings) {
        self.settings.insert(settings.kind.clone(), settings);
    }

    /// Removes everything.
    pub fn clear(&self) {
        self.rows.clear();
        self.settings.clear();
    }
}

impl RegistrationSource for MemorySource {
    fn registrations(&self, kind: &str, extension_point: &str) -> AppResult<Vec<RegistrationRow>> {
        Ok(self
            .rows
            .get(kind)
            .map(|rows| {
                rows.iter()
                    .filter(|row| row.extension_point == extension_point)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn kind_settings(&self, kind: &str) -> AppResult<Option<KindSettings>> {
        Ok(self.settings.get(kind).map(|s| s.value().clone()))
    }
}
