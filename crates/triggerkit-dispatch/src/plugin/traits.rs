//! The two-role capability contract plugin authors implement.
//!
//! A [`PluginConstructor`] builds a fresh [`PluginInstance`] for every
//! dispatch call; the instance exposes one method per lifecycle phase, all
//! no-ops by default.

use std::fmt;
use std::sync::Arc;

use triggerkit_core::config::dispatch::DEFAULT_EXTENSION_POINT;
use triggerkit_core::result::AppResult;
use triggerkit_core::types::{PriorState, Record};

use crate::context::PhaseContext;

/// Per-phase lifecycle methods. Override the phases you care about.
pub trait PluginInstance {
    /// New records before insert; mutations are visible to later plugins.
    fn before_insert(&mut self, _records: &mut [Record]) -> AppResult<()> {
        Ok(())
    }

    /// New records after insert.
    fn after_insert(&mut self, _records: &[Record]) -> AppResult<()> {
        Ok(())
    }

    /// New records before update, with the prior state of those that had one.
    fn before_update(&mut self, _records: &mut [Record], _prior: &PriorState) -> AppResult<()> {
        Ok(())
    }

    /// New records after update, with the prior state of those that had one.
    fn after_update(&mut self, _records: &[Record], _prior: &PriorState) -> AppResult<()> {
        Ok(())
    }

    /// Old records before delete.
    fn before_delete(&mut self, _records: &[Record]) -> AppResult<()> {
        Ok(())
    }

    /// Old records after delete.
    fn after_delete(&mut self, _records: &[Record]) -> AppResult<()> {
        Ok(())
    }

    /// Restored records after undelete.
    fn after_undelete(&mut self, _records: &[Record]) -> AppResult<()> {
        Ok(())
    }
}

/// Factory resolved from a registration's constructor reference.
pub trait PluginConstructor: Send + Sync + fmt::Debug {
    /// Extension point this constructor satisfies.
    fn extension_point(&self) -> &str {
        DEFAULT_EXTENSION_POINT
    }

    /// Builds an instance for one dispatch call.
    ///
    /// `additional_data` is the registration's opaque configuration, passed
    /// through uninterpreted.
    fn construct(
        &self,
        records: &[Record],
        context: &PhaseContext,
        additional_data: Option<&str>,
    ) -> AppResult<Box<dyn PluginInstance>>;
}

type ConstructFn = dyn Fn(&[Record], &PhaseContext, Option<&str>) -> AppResult<Box<dyn PluginInstance>>
    + Send
    + Sync;

/// A closure-based constructor for quick plugin registration.
#[derive(Clone)]
pub struct FnConstructor {
    extension_point: String,
    construct: Arc<ConstructFn>,
}

impl fmt::Debug for FnConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnConstructor")
            .field("extension_point", &self.extension_point)
            .field("construct", &"<closure>")
            .finish()
    }
}

impl FnConstructor {
    /// Creates a constructor from a closure.
    pub fn new<F>(construct: F) -> Self
    where
        F: Fn(&[Record], &PhaseContext, Option<&str>) -> AppResult<Box<dyn PluginInstance>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            extension_point: DEFAULT_EXTENSION_POINT.to_string(),
            construct: Arc::new(construct),
        }
    }

    /// Creates a constructor that builds `T::default()` every time.
    pub fn of<T>() -> Self
    where
        T: PluginInstance + Default + 'static,
    {
        Self::new(|_, _, _| Ok(Box::new(T::default())))
    }

    /// Declares a non-default extension point.
    pub fn with_extension_point(mut self, extension_point: &str) -> Self {
        self.extension_point = extension_point.to_string();
        self
    }
}

impl PluginConstructor for FnConstructor {
    fn extension_point(&self) -> &str {
        &self.extension_point
    }

    fn construct(
        &self,
        records: &[Record],
        context: &PhaseContext,
        additional_data: Option<&str>,
    ) -> AppResult<Box<dyn PluginInstance>> {
        (self.construct)(records, context, additional_data)
    }
}
