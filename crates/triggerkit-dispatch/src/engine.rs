//! Dispatch engine. Resolves the ordered registrations for an entity kind
//! and runs the current phase on each, fail-fast and fail-all.
//!
//! For every dispatch call:
//! - Registrations are loaded fresh from the store and sorted by order key.
//! - Each active registration's constructor builds a new instance, and the
//!   instance method for the phase runs against the shared batch.
//! - The first construction or execution failure stops the walk. Every record
//!   in the batch is then marked failed with that failure. Work already done
//!   by earlier plugins is not rolled back.
//!
//! Dispatch is synchronous. Separate calls share no mutable state apart from
//! the runtime bypass registry.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, debug_span, error, warn};

use triggerkit_core::config::dispatch::DispatchConfig;
use triggerkit_core::error::AppError;
use triggerkit_core::result::AppResult;
use triggerkit_core::types::{Record, RecordId};

use crate::bypass::BypassRegistry;
use crate::context::{OperationKind, PhaseContext};
use crate::error::DispatchError;
use crate::order;
use crate::plugin::PluginInstance;
use crate::registration::SkipReason;
use crate::store::{RegistrationStore, ResolvedRegistration};

/// Outcome of a dispatch that ran to completion.
#[derive(Debug, Clone)]
pub struct DispatchSuccess {
    /// Phase that was dispatched.
    pub operation: OperationKind,
    /// The batch, including mutations made by plugins.
    pub records: Vec<Record>,
    /// Registrations whose phase method ran.
    pub invoked: usize,
    /// Registrations skipped by gates or bypasses.
    pub skipped: usize,
}

impl DispatchSuccess {
    fn untouched(context: PhaseContext) -> Self {
        Self {
            operation: context.operation(),
            records: context.into_records(),
            invoked: 0,
            skipped: 0,
        }
    }
}

/// Outcome of an aborted dispatch.
///
/// Every record carries one error entry describing [`error`](Self::error).
#[derive(Debug, Clone, Error)]
#[error("dispatch of {operation} aborted: {error}")]
pub struct DispatchFailure {
    /// Phase that was dispatched.
    pub operation: OperationKind,
    /// The single terminating failure.
    #[source]
    pub error: DispatchError,
    /// The full batch, every record marked failed.
    pub records: Vec<Record>,
}

impl DispatchFailure {
    /// Identities of the failed records that have one.
    pub fn failed_ids(&self) -> Vec<RecordId> {
        self.records.iter().filter_map(|r| r.id).collect()
    }
}

/// `Ok` when every registration completed, `Err` with the aborted batch otherwise.
pub type DispatchResult = Result<DispatchSuccess, DispatchFailure>;

/// Ordered, fail-fast plugin dispatcher.
#[derive(Debug, Clone)]
pub struct DispatchEngine {
    store: RegistrationStore,
    bypasses: Arc<BypassRegistry>,
    extension_point: String,
    warn_on_order_ties: bool,
}

impl DispatchEngine {
    /// Creates an engine over a store.
    pub fn new(store: RegistrationStore, config: &DispatchConfig) -> Self {
        Self {
            store,
            bypasses: Arc::new(BypassRegistry::new()),
            extension_point: config.extension_point.clone(),
            warn_on_order_ties: config.warn_on_order_ties,
        }
    }

    /// Runtime bypass controls.
    pub fn bypasses(&self) -> &Arc<BypassRegistry> {
        &self.bypasses
    }

    /// Extension point this engine dispatches.
    pub fn extension_point(&self) -> &str {
        &self.extension_point
    }

    /// The registration store.
    pub fn store(&self) -> &RegistrationStore {
        &self.store
    }

    /// Registrations for a kind in execution order, before gates apply.
    pub fn resolve_order(&self, kind: &str) -> Result<Vec<ResolvedRegistration>, DispatchError> {
        let ordered = order::order(self.store.load_for(kind, &self.extension_point)?);

        if self.warn_on_order_ties {
            let ties = order::tied_keys(&ordered);
            if !ties.is_empty() {
                warn!(
                    kind = %kind,
                    order_keys = ?ties,
                    "Registrations share order keys; their relative order is unspecified"
                );
            }
        }

        Ok(ordered)
    }

    /// Dispatches one phase for a batch of records of a kind.
    pub fn dispatch(&self, kind: &str, context: PhaseContext) -> DispatchResult {
        let operation = context.operation();
        let _span = debug_span!("dispatch", kind = %kind, operation = %operation).entered();

        if self.bypasses.is_kind_bypassed(kind) {
            debug!(kind = %kind, "Entity kind bypassed at runtime, skipping dispatch");
            return Ok(DispatchSuccess::untouched(context));
        }

        match self.store.kind_settings(kind) {
            Ok(Some(settings)) => {
                if let Some(reason) = settings.skip_reason(&context) {
                    debug!(kind = %kind, reason = %reason, "Entity kind skipped by its settings");
                    return Ok(DispatchSuccess::untouched(context));
                }
            }
            Ok(None) => {}
            Err(e) => return Err(self.abort(kind, e, context)),
        }

        let ordered = match self.resolve_order(kind) {
            Ok(ordered) => ordered,
            Err(e) => return Err(self.abort(kind, e, context)),
        };

        debug!(
            kind = %kind,
            registrations = ordered.len(),
            records = context.len(),
            "Dispatching phase"
        );

        self.run(kind, ordered, context)
    }

    fn run(
        &self,
        kind: &str,
        ordered: Vec<ResolvedRegistration>,
        mut context: PhaseContext,
    ) -> DispatchResult {
        let operation = context.operation();
        let mut invoked = 0;
        let mut skipped = 0;

        for entry in &ordered {
            let registration = &entry.registration;

            if let Some(reason) = self.skip_reason(entry, &context) {
                debug!(
                    constructor_ref = %registration.constructor_ref(),
                    order_key = registration.order_key(),
                    reason = %reason,
                    "Registration skipped"
                );
                skipped += 1;
                continue;
            }

            let constructed = guard(|| {
                entry.constructor.construct(
                    context.records(),
                    &context,
                    registration.additional_data(),
                )
            });

            let mut instance: Box<dyn PluginInstance> = match constructed {
                Ok(instance) => instance,
                Err(source) => {
                    let err = DispatchError::Construction {
                        constructor_ref: registration.constructor_ref().to_string(),
                        order_key: registration.order_key(),
                        source,
                    };
                    return Err(self.abort(kind, err, context));
                }
            };

            if let Err(source) = guard(|| context.invoke(instance.as_mut())) {
                let err = DispatchError::Execution {
                    constructor_ref: registration.constructor_ref().to_string(),
                    order_key: registration.order_key(),
                    operation,
                    source,
                };
                return Err(self.abort(kind, err, context));
            }

            debug!(
                constructor_ref = %registration.constructor_ref(),
                order_key = registration.order_key(),
                "Plugin completed"
            );
            invoked += 1;
        }

        Ok(DispatchSuccess {
            operation,
            records: context.into_records(),
            invoked,
            skipped,
        })
    }

    fn skip_reason(&self, entry: &ResolvedRegistration, context: &PhaseContext) -> Option<SkipReason> {
        if self
            .bypasses
            .is_constructor_bypassed(entry.registration.constructor_ref())
        {
            return Some(SkipReason::RuntimeBypass);
        }
        entry.registration.skip_reason(context)
    }

    fn abort(&self, kind: &str, error: DispatchError, mut context: PhaseContext) -> DispatchFailure {
        error!(
            kind = %kind,
            operation = %context.operation(),
            records = context.len(),
            error = %error,
            "Dispatch aborted, marking every record failed"
        );

        context.mark_failed(&error.to_string(), error.constructor_ref());

        DispatchFailure {
            operation: context.operation(),
            error,
            records: context.into_records(),
        }
    }
}

/// Runs plugin code, turning a panic into a plugin failure.
fn guard<T>(f: impl FnOnce() -> AppResult<T>) -> AppResult<T> {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        Err(AppError::plugin(format!(
            "plugin panicked: {}",
            panic_message(payload.as_ref())
        )))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
