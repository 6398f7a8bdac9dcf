//! Convenience result type alias for Triggerkit.

use crate::error::AppError;

/// A specialized `Result` type for Triggerkit operations.
///
/// Plugin constructors and phase methods return this, as does every
/// configuration and registry operation.
pub type AppResult<T> = Result<T, AppError>;
