//! Dispatch engine configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Extension point tag used when none is configured.
pub const DEFAULT_EXTENSION_POINT: &str = "trigger_action";

/// Settings for the registration store and dispatch engine.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DispatchConfig {
    /// Extension point tag every dispatched registration must carry.
    #[serde(default = "default_extension_point")]
    #[validate(length(min = 1))]
    pub extension_point: String,
    /// TOML registration document, re-read on every dispatch.
    #[serde(default)]
    pub registrations_file: Option<String>,
    /// Log a warning when active registrations share an order key.
    #[serde(default = "default_true")]
    pub warn_on_order_ties: bool,
    /// Shared libraries to load constructors from (`dynamic` feature).
    #[serde(default)]
    pub plugin_libraries: Vec<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            extension_point: default_extension_point(),
            registrations_file: None,
            warn_on_order_ties: true,
            plugin_libraries: Vec::new(),
        }
    }
}

fn default_extension_point() -> String {
    DEFAULT_EXTENSION_POINT.to_string()
}

fn default_true() -> bool {
    true
}
