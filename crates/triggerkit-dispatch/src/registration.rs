//! Declarative bindings of plugin constructors to entity kinds, with order
//! keys and activation gates.
//!
//! Raw [`RegistrationRow`]s come from a configuration source; the store
//! validates them into immutable [`Registration`]s.

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use triggerkit_core::config::dispatch::DEFAULT_EXTENSION_POINT;
use triggerkit_core::error::AppError;
use triggerkit_core::result::AppResult;

use crate::context::{OperationKind, PhaseContext};

/// A registration as supplied by configuration, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct RegistrationRow {
    /// Entity kind this binding applies to.
    #[validate(length(min = 1))]
    pub target_kind: String,
    /// Execution order (ascending); need not be unique or contiguous.
    pub order_key: i32,
    /// Reference resolved through the constructor registry.
    #[validate(length(min = 1))]
    pub constructor_ref: String,
    /// Capability contract the constructor must satisfy.
    #[serde(default = "default_extension_point")]
    #[validate(length(min = 1))]
    pub extension_point: String,
    /// Opaque data passed to the constructor.
    #[serde(default)]
    pub additional_data: Option<String>,
    /// Informational description.
    #[serde(default)]
    pub description: Option<String>,
    /// Deactivates the registration.
    #[serde(default)]
    pub bypass_execution: bool,
    /// Principals holding this permission skip the registration.
    #[serde(default)]
    pub bypass_permission: Option<String>,
    /// Only principals holding this permission run the registration.
    #[serde(default)]
    pub required_permission: Option<String>,
    /// Phases the registration participates in; all when absent.
    #[serde(default)]
    pub phases: Option<Vec<String>>,
}

impl RegistrationRow {
    /// Creates an active row on the default extension point.
    pub fn new(target_kind: &str, order_key: i32, constructor_ref: &str) -> Self {
        Self {
            target_kind: target_kind.to_string(),
            order_key,
            constructor_ref: constructor_ref.to_string(),
            extension_point: default_extension_point(),
            additional_data: None,
            description: None,
            bypass_execution: false,
            bypass_permission: None,
            required_permission: None,
            phases: None,
        }
    }
}

/// Entity-kind–wide activation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindSettings {
    /// Entity kind these settings govern.
    pub kind: String,
    /// Deactivates all dispatch for the kind.
    #[serde(default)]
    pub bypass_execution: bool,
    /// Principals holding this permission skip all dispatch for the kind.
    #[serde(default)]
    pub bypass_permission: Option<String>,
    /// Only principals holding this permission trigger dispatch for the kind.
    #[serde(default)]
    pub required_permission: Option<String>,
}

impl KindSettings {
    /// Why the kind is skipped for this context, if it is.
    pub fn skip_reason(&self, context: &PhaseContext) -> Option<SkipReason> {
        gate(
            self.bypass_execution,
            self.bypass_permission.as_deref(),
            self.required_permission.as_deref(),
            context,
        )
    }
}

/// Why a kind or registration did not run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Deactivated in configuration.
    Inactive,
    /// Bypassed at runtime.
    RuntimeBypass,
    /// The principal holds the bypass permission.
    BypassPermission(String),
    /// The principal lacks the required permission.
    MissingPermission(String),
    /// The registration does not participate in this phase.
    PhaseExcluded,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inactive => write!(f, "inactive"),
            Self::RuntimeBypass => write!(f, "bypassed at runtime"),
            Self::BypassPermission(p) => write!(f, "principal holds bypass permission '{p}'"),
            Self::MissingPermission(p) => write!(f, "principal lacks required permission '{p}'"),
            Self::PhaseExcluded => write!(f, "not registered for this phase"),
        }
    }
}

fn gate(
    bypass_execution: bool,
    bypass_permission: Option<&str>,
    required_permission: Option<&str>,
    context: &PhaseContext,
) -> Option<SkipReason> {
    if bypass_execution {
        return Some(SkipReason::Inactive);
    }
    if let Some(permission) = bypass_permission.filter(|p| context.has_permission(p)) {
        return Some(SkipReason::BypassPermission(permission.to_string()));
    }
    if let Some(permission) = required_permission.filter(|p| !context.has_permission(p)) {
        return Some(SkipReason::MissingPermission(permission.to_string()));
    }
    None
}

/// A validated, immutable registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    target_kind: String,
    order_key: i32,
    constructor_ref: String,
    extension_point: String,
    additional_data: Option<String>,
    description: Option<String>,
    bypass_execution: bool,
    bypass_permission: Option<String>,
    required_permission: Option<String>,
    phases: Option<Vec<OperationKind>>,
}

impl Registration {
    /// Entity kind this binding applies to.
    pub fn target_kind(&self) -> &str {
        &self.target_kind
    }

    /// Execution order key.
    pub fn order_key(&self) -> i32 {
        self.order_key
    }

    /// Constructor reference.
    pub fn constructor_ref(&self) -> &str {
        &self.constructor_ref
    }

    /// Extension point tag.
    pub fn extension_point(&self) -> &str {
        &self.extension_point
    }

    /// Opaque constructor data.
    pub fn additional_data(&self) -> Option<&str> {
        self.additional_data.as_deref()
    }

    /// Informational description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Phases the registration is limited to, if limited.
    pub fn phases(&self) -> Option<&[OperationKind]> {
        self.phases.as_deref()
    }

    /// Why the registration is skipped for this context, if it is.
    pub fn skip_reason(&self, context: &PhaseContext) -> Option<SkipReason> {
        if let Some(phases) = &self.phases {
            if !phases.contains(&context.operation()) {
                return Some(SkipReason::PhaseExcluded);
            }
        }
        gate(
            self.bypass_execution,
            self.bypass_permission.as_deref(),
            self.required_permission.as_deref(),
            context,
        )
    }
}

impl TryFrom<RegistrationRow> for Registration {
    type Error = AppError;

    fn try_from(row: RegistrationRow) -> AppResult<Self> {
        row.validate()?;

        let phases = row
            .phases
            .map(|names| {
                names
                    .iter()
                    .map(|name| name.parse::<OperationKind>())
                    .collect::<AppResult<Vec<_>>>()
            })
            .transpose()?;

        Ok(Self {
            target_kind: row.target_kind,
            order_key: row.order_key,
            constructor_ref: row.constructor_ref,
            extension_point: row.extension_point,
            additional_data: row.additional_data,
            description: row.description,
            bypass_execution: row.bypass_execution,
            bypass_permission: non_empty(row.bypass_permission),
            required_permission: non_empty(row.required_permission),
            phases,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn default_extension_point() -> String {
    DEFAULT_EXTENSION_POINT.to_string()
}
