//! Dispatch failure taxonomy.

use thiserror::Error;

use triggerkit_core::error::{AppError, ErrorKind};

use crate::context::OperationKind;

/// The single terminating failure of a dispatch call.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// A registration is malformed or its constructor reference does not resolve.
    #[error("configuration error for kind '{kind}': {message}")]
    Configuration {
        /// Entity kind being dispatched.
        kind: String,
        /// What was wrong.
        message: String,
    },
    /// A plugin constructor failed to build its instance.
    #[error("plugin '{constructor_ref}' (order {order_key}) failed to construct: {source}")]
    Construction {
        /// Constructor reference of the failing registration.
        constructor_ref: String,
        /// Order key of the failing registration.
        order_key: i32,
        /// The plugin's failure.
        #[source]
        source: AppError,
    },
    /// A plugin instance's phase method failed.
    #[error("plugin '{constructor_ref}' (order {order_key}) failed during {operation}: {source}")]
    Execution {
        /// Constructor reference of the failing registration.
        constructor_ref: String,
        /// Order key of the failing registration.
        order_key: i32,
        /// Phase being executed.
        operation: OperationKind,
        /// The plugin's failure.
        #[source]
        source: AppError,
    },
}

impl DispatchError {
    /// Builds a configuration error for a kind.
    pub fn configuration(kind: &str, message: impl Into<String>) -> Self {
        Self::Configuration {
            kind: kind.to_string(),
            message: message.into(),
        }
    }

    /// Constructor reference of the plugin that failed, if a plugin failed.
    pub fn constructor_ref(&self) -> Option<&str> {
        match self {
            Self::Configuration { .. } => None,
            Self::Construction {
                constructor_ref, ..
            }
            | Self::Execution {
                constructor_ref, ..
            } => Some(constructor_ref),
        }
    }

    /// The plugin's own failure, if a plugin failed.
    pub fn plugin_error(&self) -> Option<&AppError> {
        match self {
            Self::Configuration { .. } => None,
            Self::Construction { source, .. } | Self::Execution { source, .. } => Some(source),
        }
    }
}

impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        let kind = match err {
            DispatchError::Configuration { .. } => ErrorKind::Configuration,
            _ => ErrorKind::Plugin,
        };
        AppError::with_source(kind, err.to_string(), err)
    }
}
