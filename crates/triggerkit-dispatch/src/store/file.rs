//! TOML-document registration source.
//!
//! The document is re-read on every call, so edits to the file take effect
//! on the next dispatch without a restart.
//!
//! ```toml
//! [[kinds]]
//! kind = "invoice"
//! bypass_permission = "skip_invoice_rules"
//!
//! [[registrations]]
//! target_kind = "invoice"
//! order_key = 10
//! constructor_ref = "field_rules.defaults"
//! additional_data = '{"status": "draft"}'
//! phases = ["before_insert"]
//! ```
//!
//! Entries stay untyped until a kind asks for them, so a malformed entry
//! only fails dispatch for the kind it names. Entries with no readable kind
//! belong to no kind and are skipped with a warning.

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use tracing::warn;

use triggerkit_core::error::AppError;
use triggerkit_core::result::AppResult;

use super::RegistrationSource;
use crate::registration::{KindSettings, RegistrationRow};

/// Parsed registration document with untyped entries.
#[derive(Debug, Clone, Default)]
pub struct RegistrationDocument {
    kinds: Vec<config::Value>,
    registrations: Vec<config::Value>,
}

impl RegistrationDocument {
    /// Registration rows naming a kind, converted on demand.
    pub fn registrations_for(&self, kind: &str) -> AppResult<Vec<RegistrationRow>> {
        entries_for(&self.registrations, "target_kind", kind, "registration")
    }

    /// Settings for a kind, converted on demand.
    pub fn settings_for(&self, kind: &str) -> AppResult<Option<KindSettings>> {
        Ok(entries_for(&self.kinds, "kind", kind, "kind settings")?
            .into_iter()
            .next())
    }

    /// Number of registration entries, well-formed or not.
    pub fn registration_count(&self) -> usize {
        self.registrations.len()
    }
}

fn entry_kind(entry: &config::Value, field: &str) -> Option<String> {
    entry
        .clone()
        .into_table()
        .ok()
        .and_then(|table| table.get(field).cloned())
        .and_then(|value| value.into_string().ok())
}

fn entries_for<T: DeserializeOwned>(
    entries: &[config::Value],
    field: &str,
    kind: &str,
    what: &str,
) -> AppResult<Vec<T>> {
    let mut matched = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        match entry_kind(entry, field) {
            Some(entry_kind) if entry_kind == kind => {
                let parsed = entry.clone().try_deserialize::<T>().map_err(|e| {
                    AppError::configuration(format!(
                        "Malformed {what} entry #{index} for kind '{kind}': {e}"
                    ))
                })?;
                matched.push(parsed);
            }
            Some(_) => {}
            None => warn!(
                entry = index,
                field = %field,
                "Registration document entry has no readable kind, ignoring"
            ),
        }
    }

    Ok(matched)
}

fn entry_list(document: &config::Config, key: &str) -> AppResult<Vec<config::Value>> {
    match document.get_array(key) {
        Ok(entries) => Ok(entries),
        Err(config::ConfigError::NotFound(_)) => Ok(Vec::new()),
        Err(e) => Err(AppError::configuration(format!(
            "Failed to parse registration document: '{key}' must be an array of tables: {e}"
        ))),
    }
}

#[derive(Debug, Clone)]
enum Origin {
    Path(PathBuf),
    Inline(String),
}

/// Registrations read from a TOML document.
#[derive(Debug, Clone)]
pub struct TomlSource {
    origin: Origin,
}

impl TomlSource {
    /// Reads from a file on every call.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            origin: Origin::Path(path.into()),
        }
    }

    /// Reads from a fixed in-memory document.
    pub fn from_toml_str(contents: impl Into<String>) -> Self {
        Self {
            origin: Origin::Inline(contents.into()),
        }
    }

    /// Reads the document and splits it into entry lists.
    ///
    /// Fails only when the document cannot be read or is not valid TOML.
    pub fn read(&self) -> AppResult<RegistrationDocument> {
        let builder = config::Config::builder();
        let builder = match &self.origin {
            Origin::Path(path) => builder.add_source(
                config::File::from(path.as_path())
                    .format(config::FileFormat::Toml)
                    .required(true),
            ),
            Origin::Inline(contents) => builder.add_source(config::File::from_str(
                contents,
                config::FileFormat::Toml,
            )),
        };

        let document = builder
            .build()
            .map_err(|e| {
                AppError::configuration(format!("Failed to read registration document: {e}"))
            })?;

        Ok(RegistrationDocument {
            kinds: entry_list(&document, "kinds")?,
            registrations: entry_list(&document, "registrations")?,
        })
    }
}

impl RegistrationSource for TomlSource {
    fn registrations(&self, kind: &str, extension_point: &str) -> AppResult<Vec<RegistrationRow>> {
        Ok(self
            .read()?
            .registrations_for(kind)?
            .into_iter()
            .filter(|row| row.extension_point == extension_point)
            .collect())
    }

    fn kind_settings(&self, kind: &str) -> AppResult<Option<KindSettings>> {
        self.read()?.settings_for(kind)
    }
}
