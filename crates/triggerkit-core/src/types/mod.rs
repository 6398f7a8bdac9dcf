//! Record model shared by the dispatch engine and plugin authors.

pub mod id;
pub mod record;

pub use id::RecordId;
pub use record::{PriorState, Record, RecordError};
