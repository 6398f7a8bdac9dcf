//! Lookup table from constructor references to plugin constructors, built
//! at startup.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use triggerkit_core::error::AppError;
use triggerkit_core::result::AppResult;

use super::traits::PluginConstructor;

/// Constructor reference → constructor.
#[derive(Debug, Default)]
pub struct ConstructorRegistry {
    constructors: HashMap<String, Arc<dyn PluginConstructor>>,
}

impl ConstructorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a constructor under a reference.
    ///
    /// References must be non-empty and unique.
    pub fn register(
        &mut self,
        reference: impl Into<String>,
        constructor: Arc<dyn PluginConstructor>,
    ) -> AppResult<()> {
        let reference = reference.into();

        if reference.trim().is_empty() {
            return Err(AppError::validation("Constructor reference must not be empty"));
        }

        if self.constructors.contains_key(&reference) {
            return Err(AppError::conflict(format!(
                "Constructor '{reference}' is already registered"
            )));
        }

        info!(
            constructor_ref = %reference,
            extension_point = %constructor.extension_point(),
            "Plugin constructor registered"
        );

        self.constructors.insert(reference, constructor);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(
        mut self,
        reference: impl Into<String>,
        constructor: Arc<dyn PluginConstructor>,
    ) -> AppResult<Self> {
        self.register(reference, constructor)?;
        Ok(self)
    }

    /// Looks up a constructor by reference.
    pub fn get(&self, reference: &str) -> Option<Arc<dyn PluginConstructor>> {
        self.constructors.get(reference).cloned()
    }

    /// Whether a reference is registered.
    pub fn contains(&self, reference: &str) -> bool {
        self.constructors.contains_key(reference)
    }

    /// All registered references, sorted.
    pub fn references(&self) -> Vec<&str> {
        let mut references: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        references.sort_unstable();
        references
    }

    /// Number of registered constructors.
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}
