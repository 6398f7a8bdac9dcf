//! Runtime bypasses.
//!
//! Host code can suppress dispatch for an entire entity kind or for one
//! constructor reference across all kinds, without touching configuration.

use dashmap::DashSet;
use tracing::info;

/// Runtime bypass state shared by every dispatch of an engine.
#[derive(Debug, Default)]
pub struct BypassRegistry {
    kinds: DashSet<String>,
    constructors: DashSet<String>,
}

impl BypassRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppresses all dispatch for a kind.
    pub fn bypass_kind(&self, kind: &str) {
        if self.kinds.insert(kind.to_string()) {
            info!(kind = %kind, "Entity kind bypassed");
        }
    }

    /// Re-enables dispatch for a kind.
    pub fn clear_kind_bypass(&self, kind: &str) {
        if self.kinds.remove(kind).is_some() {
            info!(kind = %kind, "Entity kind bypass cleared");
        }
    }

    /// Whether a kind is bypassed.
    pub fn is_kind_bypassed(&self, kind: &str) -> bool {
        self.kinds.contains(kind)
    }

    /// Suppresses one constructor reference everywhere.
    pub fn bypass_constructor(&self, constructor_ref: &str) {
        if self.constructors.insert(constructor_ref.to_string()) {
            info!(constructor_ref = %constructor_ref, "Constructor bypassed");
        }
    }

    /// Re-enables a constructor reference.
    pub fn clear_constructor_bypass(&self, constructor_ref: &str) {
        if self.constructors.remove(constructor_ref).is_some() {
            info!(constructor_ref = %constructor_ref, "Constructor bypass cleared");
        }
    }

    /// Whether a constructor reference is bypassed.
    pub fn is_constructor_bypassed(&self, constructor_ref: &str) -> bool {
        self.constructors.contains(constructor_ref)
    }

    /// Clears every bypass.
    pub fn clear_all(&self) {
        self.kinds.clear();
        self.constructors.clear();
        info!("All bypasses cleared");
    }
}
