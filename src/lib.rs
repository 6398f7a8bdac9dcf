//! Triggerkit: ordered, fail-fast plugin dispatch for entity lifecycle events.
//!
//! Wires configuration, logging, the registration source, and plugin
//! constructors into a ready [`TriggerRuntime`]. The native event shim
//! builds a [`PhaseContext`] per lifecycle event and calls
//! [`TriggerRuntime::dispatch`].

use std::path::Path;
use std::sync::Arc;

use tracing::info;

pub use plugin_field_rules as field_rules;
pub use triggerkit_core::config::AppConfig;
pub use triggerkit_core::error::{AppError, ErrorKind};
pub use triggerkit_core::result::AppResult;
pub use triggerkit_core::telemetry::init_logging;
pub use triggerkit_core::types::{PriorState, Record, RecordId};
pub use triggerkit_dispatch::prelude;
pub use triggerkit_dispatch::store::{MemorySource, TomlSource};
pub use triggerkit_dispatch::{
    BypassRegistry, ConstructorRegistry, DispatchEngine, DispatchError, DispatchFailure,
    DispatchResult, DispatchSuccess, FnConstructor, KindSettings, OperationKind, PhaseContext,
    PluginConstructor, PluginInstance, RegistrationRow, RegistrationSource, RegistrationStore,
};

use triggerkit_dispatch::plugin::DynamicLoader;

/// Constructor registry holding the bundled field rule plugins.
pub fn default_constructors() -> AppResult<ConstructorRegistry> {
    let mut registry = ConstructorRegistry::new();
    plugin_field_rules::register_all(&mut registry)?;
    Ok(registry)
}

/// A configured dispatch engine and everything it depends on.
#[derive(Debug)]
pub struct TriggerRuntime {
    config: AppConfig,
    // dropped before `loader` so no constructor outlives its library
    engine: DispatchEngine,
    loader: DynamicLoader,
}

impl TriggerRuntime {
    /// Builds a runtime from configuration and compiled-in constructors.
    ///
    /// Uses a [`TomlSource`] when `dispatch.registrations_file` is set and
    /// an empty [`MemorySource`] otherwise.
    pub fn new(config: AppConfig, constructors: ConstructorRegistry) -> AppResult<Self> {
        let source: Arc<dyn RegistrationSource> = match &config.dispatch.registrations_file {
            Some(path) => Arc::new(TomlSource::from_path(path)),
            None => Arc::new(MemorySource::new()),
        };
        Self::with_source(config, constructors, source)
    }

    /// Builds a runtime over an explicit registration source.
    pub fn with_source(
        config: AppConfig,
        constructors: ConstructorRegistry,
        source: Arc<dyn RegistrationSource>,
    ) -> AppResult<Self> {
        let mut loader = DynamicLoader::new();
        // declared after `loader` so it is dropped first on early return
        let mut constructors = constructors;
        for library in &config.dispatch.plugin_libraries {
            // SAFETY: libraries are listed explicitly by the operator and
            // `loader` is kept alive for as long as the engine.
            let added = unsafe { loader.load_from_path(Path::new(library), &mut constructors) }?;
            info!(library = %library, constructors = added, "Loaded plugin library");
        }

        let store = RegistrationStore::new(source, Arc::new(constructors));
        let engine = DispatchEngine::new(store, &config.dispatch);

        info!(
            extension_point = %engine.extension_point(),
            constructors = engine.store().constructors().len(),
            "Trigger runtime ready"
        );

        Ok(Self {
            config,
            engine,
            loader,
        })
    }

    /// Dispatches one phase for a batch of records of a kind.
    pub fn dispatch(&self, kind: &str, context: PhaseContext) -> DispatchResult {
        self.engine.dispatch(kind, context)
    }

    /// The dispatch engine.
    pub fn engine(&self) -> &DispatchEngine {
        &self.engine
    }

    /// Runtime bypass controls.
    pub fn bypasses(&self) -> &Arc<BypassRegistry> {
        self.engine.bypasses()
    }

    /// The configuration this runtime was built from.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Number of plugin libraries loaded.
    pub fn loaded_libraries(&self) -> usize {
        self.loader.loaded_count()
    }
}
