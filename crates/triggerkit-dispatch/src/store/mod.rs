//! Registration store: loads and resolves the registrations for one entity
//! kind from a configuration source.
//!
//! Nothing is cached: every call asks the source again, so the store always
//! reflects the latest configuration. Problems with one kind's rows surface
//! only when that kind is dispatched.

pub mod file;
pub mod memory;

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use triggerkit_core::result::AppResult;

use crate::error::DispatchError;
use crate::plugin::{ConstructorRegistry, PluginConstructor};
use crate::registration::{KindSettings, Registration, RegistrationRow};

pub use file::TomlSource;
pub use memory::MemorySource;

/// The configuration collaborator: supplies raw rows keyed by kind and
/// extension point.
pub trait RegistrationSource: Send + Sync + fmt::Debug {
    /// Rows for a kind and extension point.
    fn registrations(&self, kind: &str, extension_point: &str) -> AppResult<Vec<RegistrationRow>>;

    /// Kind-wide settings, if configured.
    fn kind_settings(&self, _kind: &str) -> AppResult<Option<KindSettings>> {
        Ok(None)
    }
}

/// A registration paired with its resolved constructor.
#[derive(Debug, Clone)]
pub struct ResolvedRegistration {
    /// The validated registration.
    pub registration: Registration,
    /// The constructor its reference resolved to.
    pub constructor: Arc<dyn PluginConstructor>,
}

/// Loads registrations through a source and resolves their constructors.
#[derive(Debug, Clone)]
pub struct RegistrationStore {
    source: Arc<dyn RegistrationSource>,
    constructors: Arc<ConstructorRegistry>,
}

impl RegistrationStore {
    /// Creates a store over a source and constructor registry.
    pub fn new(source: Arc<dyn RegistrationSource>, constructors: Arc<ConstructorRegistry>) -> Self {
        Self {
            source,
            constructors,
        }
    }

    /// The constructor registry references resolve through.
    pub fn constructors(&self) -> &Arc<ConstructorRegistry> {
        &self.constructors
    }

    /// Kind-wide settings for a kind.
    pub fn kind_settings(&self, kind: &str) -> Result<Option<KindSettings>, DispatchError> {
        self.source
            .kind_settings(kind)
            .map_err(|e| DispatchError::configuration(kind, e.message))
    }

    /// Registrations for a kind and extension point, in no particular order.
    ///
    /// Rows for other kinds or extension points are dropped. Fails if any
    /// matching row is malformed or names a constructor that does not
    /// resolve to one satisfying the extension point.
    pub fn load_for(
        &self,
        kind: &str,
        extension_point: &str,
    ) -> Result<Vec<ResolvedRegistration>, DispatchError> {
        let rows = self
            .source
            .registrations(kind, extension_point)
            .map_err(|e| DispatchError::configuration(kind, e.message))?;

        let mut resolved = Vec::with_capacity(rows.len());

        for row in rows {
            if row.target_kind != kind || row.extension_point != extension_point {
                warn!(
                    kind = %kind,
                    row_kind = %row.target_kind,
                    row_extension_point = %row.extension_point,
                    constructor_ref = %row.constructor_ref,
                    "Source returned a registration for another kind or extension point, ignoring"
                );
                continue;
            }

            let constructor_ref = row.constructor_ref.clone();
            let registration = Registration::try_from(row).map_err(|e| {
                DispatchError::configuration(
                    kind,
                    format!("malformed registration '{constructor_ref}': {}", e.message),
                )
            })?;

            let constructor = self
                .constructors
                .get(registration.constructor_ref())
                .ok_or_else(|| {
                    DispatchError::configuration(
                        kind,
                        format!(
                            "constructor '{}' is not registered",
                            registration.constructor_ref()
                        ),
                    )
                })?;

            if constructor.extension_point() != registration.extension_point() {
                return Err(DispatchError::configuration(
                    kind,
                    format!(
                        "constructor '{}' satisfies extension point '{}', not '{}'",
                        registration.constructor_ref(),
                        constructor.extension_point(),
                        registration.extension_point()
                    ),
                ));
            }

            resolved.push(ResolvedRegistration {
                registration,
                constructor,
            });
        }

        Ok(resolved)
    }
}
