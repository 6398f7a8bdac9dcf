//! # triggerkit-core
//!
//! Core crate for Triggerkit. Contains the unified error system,
//! configuration schemas, logging bootstrap, and the record model that
//! flows through every dispatch.
//!
//! This crate has **no** internal dependencies on other Triggerkit crates.

pub mod config;
pub mod error;
pub mod result;
pub mod telemetry;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
pub use types::{PriorState, Record, RecordId};
