//! Phase context and operation routing.
//!
//! Every dispatch call owns exactly one [`PhaseContext`]. It carries the
//! record batch, the operation kind, prior state for update phases, and the
//! acting principal's permissions. Plugins invoked later in the order see
//! mutations made by earlier ones.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use triggerkit_core::error::AppError;
use triggerkit_core::result::AppResult;
use triggerkit_core::types::{PriorState, Record, RecordId};

use crate::plugin::PluginInstance;

/// Lifecycle phase being dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Before new records are persisted. Records are mutable.
    BeforeInsert,
    /// After new records are persisted.
    AfterInsert,
    /// Before changes are persisted. Records are mutable; prior state available.
    BeforeUpdate,
    /// After changes are persisted; prior state available.
    AfterUpdate,
    /// Before records are deleted. Records hold the old state.
    BeforeDelete,
    /// After records are deleted. Records hold the old state.
    AfterDelete,
    /// After deleted records are restored.
    AfterUndelete,
}

/// Whether a phase runs before or after the outer operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    /// Before the operation is committed.
    Before,
    /// After the operation is committed.
    After,
}

/// Which record state a phase delivers in its batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    /// The state being written.
    New,
    /// The state being removed.
    Old,
}

impl OperationKind {
    /// Every phase, in lifecycle order.
    pub const ALL: [OperationKind; 7] = [
        Self::BeforeInsert,
        Self::AfterInsert,
        Self::BeforeUpdate,
        Self::AfterUpdate,
        Self::BeforeDelete,
        Self::AfterDelete,
        Self::AfterUndelete,
    ];

    /// Returns the string name of this phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BeforeInsert => "before_insert",
            Self::AfterInsert => "after_insert",
            Self::BeforeUpdate => "before_update",
            Self::AfterUpdate => "after_update",
            Self::BeforeDelete => "before_delete",
            Self::AfterDelete => "after_delete",
            Self::AfterUndelete => "after_undelete",
        }
    }

    /// Before or after the outer operation.
    pub fn timing(&self) -> Timing {
        match self {
            Self::BeforeInsert | Self::BeforeUpdate | Self::BeforeDelete => Timing::Before,
            Self::AfterInsert | Self::AfterUpdate | Self::AfterDelete | Self::AfterUndelete => {
                Timing::After
            }
        }
    }

    /// Which state the record batch holds.
    pub fn record_state(&self) -> RecordState {
        match self {
            Self::BeforeDelete | Self::AfterDelete => RecordState::Old,
            _ => RecordState::New,
        }
    }

    /// Only update phases carry prior state.
    pub fn carries_prior_state(&self) -> bool {
        matches!(self, Self::BeforeUpdate | Self::AfterUpdate)
    }

    /// Whether plugins receive the batch mutably.
    pub fn records_mutable(&self) -> bool {
        matches!(self, Self::BeforeInsert | Self::BeforeUpdate)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| AppError::validation(format!("Unknown operation kind '{s}'")))
    }
}

/// Shared state for one dispatch call.
#[derive(Debug, Clone)]
pub struct PhaseContext {
    operation: OperationKind,
    records: Vec<Record>,
    prior_state: PriorState,
    permissions: BTreeSet<String>,
}

impl PhaseContext {
    /// Creates a context for a phase and its record batch.
    pub fn new(operation: OperationKind, records: Vec<Record>) -> Self {
        Self {
            operation,
            records,
            prior_state: PriorState::new(),
            permissions: BTreeSet::new(),
        }
    }

    /// Attaches prior state. Rejected for phases other than updates.
    pub fn with_prior_state(mut self, prior_state: PriorState) -> AppResult<Self> {
        if !self.operation.carries_prior_state() && !prior_state.is_empty() {
            return Err(AppError::validation(format!(
                "Prior state is only available to update phases, not {}",
                self.operation
            )));
        }
        self.prior_state = prior_state;
        Ok(self)
    }

    /// Grants permissions to the acting principal.
    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    /// The phase being dispatched.
    pub fn operation(&self) -> OperationKind {
        self.operation
    }

    /// The record batch.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Prior state; `None` outside update phases.
    pub fn prior_state(&self) -> Option<&PriorState> {
        self.operation
            .carries_prior_state()
            .then_some(&self.prior_state)
    }

    /// Prior state of one record, if it had any.
    pub fn prior(&self, id: &RecordId) -> Option<&Record> {
        self.prior_state().and_then(|prior| prior.get(id))
    }

    /// Whether the acting principal holds a permission.
    pub fn has_permission(&self, name: &str) -> bool {
        self.permissions.contains(name)
    }

    /// Number of records in the batch.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consumes the context, returning the batch.
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Marks every record in the batch as failed.
    pub(crate) fn mark_failed(&mut self, message: &str, origin: Option<&str>) {
        for record in &mut self.records {
            record.add_error(message, origin);
        }
    }

    /// Invokes the instance method matching this context's phase.
    pub(crate) fn invoke(&mut self, instance: &mut dyn PluginInstance) -> AppResult<()> {
        let records = &mut self.records;
        let prior = &self.prior_state;

        match self.operation {
            OperationKind::BeforeInsert => instance.before_insert(records.as_mut_slice()),
            OperationKind::AfterInsert => instance.after_insert(records.as_slice()),
            OperationKind::BeforeUpdate => instance.before_update(records.as_mut_slice(), prior),
            OperationKind::AfterUpdate => instance.after_update(records.as_slice(), prior),
            OperationKind::BeforeDelete => instance.before_delete(records.as_slice()),
            OperationKind::AfterDelete => instance.after_delete(records.as_slice()),
            OperationKind::AfterUndelete => instance.after_undelete(records.as_slice()),
        }
    }
}
