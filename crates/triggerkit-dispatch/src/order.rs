//! Execution ordering.
//!
//! Registrations run in ascending order-key order. Registrations sharing
//! a key form a tie group: the group as a whole runs after every smaller
//! key and before every larger key, but the order within the group is
//! unspecified and must not be relied upon.

use crate::registration::{Registration, RegistrationRow};
use crate::store::ResolvedRegistration;

/// Anything carrying an order key.
pub trait Ordered {
    /// The order key (ascending = earlier).
    fn order_key(&self) -> i32;
}

impl Ordered for RegistrationRow {
    fn order_key(&self) -> i32 {
        self.order_key
    }
}

impl Ordered for Registration {
    fn order_key(&self) -> i32 {
        Registration::order_key(self)
    }
}

impl Ordered for ResolvedRegistration {
    fn order_key(&self) -> i32 {
        self.registration.order_key()
    }
}

/// Sorts items into execution order.
pub fn order<T: Ordered>(mut items: Vec<T>) -> Vec<T> {
    items.sort_by_key(Ordered::order_key);
    items
}

/// Order keys shared by more than one item of an already ordered slice.
pub fn tied_keys<T: Ordered>(ordered: &[T]) -> Vec<i32> {
    ordered
        .chunk_by(|a, b| a.order_key() == b.order_key())
        .filter(|group| group.len() > 1)
        .map(|group| group[0].order_key())
        .collect()
}
