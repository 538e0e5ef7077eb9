//! Signal Values
//!
//! Listeners have no return channel: dispatch fans out to any number of
//! callbacks and discards what they return. A [`SignalValue`] is passed in
//! the invocation payload instead, and listeners write their answer into it.
//!
//! Clones share the same slot, so the invoker keeps one handle and the
//! payload carries another.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{SignalError, SignalResult};

#[derive(Debug)]
struct Slot<T> {
    value: Option<T>,
    changed: bool,
}

/// Single-slot result carrier.
///
/// # Example
///
/// ```rust
/// use beacon_core::signals::SignalValue;
///
/// let answer = SignalValue::single();
/// answer.set(42).unwrap();
/// assert!(answer.set(7).is_err());
/// assert_eq!(answer.value(), Some(42));
/// ```
#[derive(Debug)]
pub struct SignalValue<T> {
    slot: Arc<RwLock<Slot<T>>>,
    single_value: bool,
}

impl<T> SignalValue<T> {
    /// Create a value with an optional default.
    ///
    /// The default does not count as a write.
    pub fn new(default: Option<T>, single_value: bool) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Slot {
                value: default,
                changed: false,
            })),
            single_value,
        }
    }

    /// A value that accepts exactly one write.
    pub fn single() -> Self {
        Self::new(None, true)
    }

    /// A value that any number of writers may overwrite.
    pub fn multi() -> Self {
        Self::new(None, false)
    }

    pub fn is_single_value(&self) -> bool {
        self.single_value
    }

    /// Whether a write has happened.
    pub fn changed(&self) -> bool {
        self.slot.read().changed
    }

    /// Write the slot.
    pub fn set(&self, value: T) -> SignalResult<()> {
        let mut slot = self.slot.write();
        if self.single_value && slot.changed {
            return Err(SignalError::ValueAlreadySet);
        }
        slot.value = Some(value);
        slot.changed = true;
        Ok(())
    }
}

impl<T: Clone> SignalValue<T> {
    pub fn value(&self) -> Option<T> {
        self.slot.read().value.clone()
    }

    /// A zero-argument closure reading the current value.
    pub fn getter(&self) -> impl Fn() -> Option<T> + Send + Sync + 'static
    where
        T: Send + Sync + 'static,
    {
        let value = self.clone();
        move || value.value()
    }

    /// A zero-argument closure writing `value` when called.
    pub fn setter(&self, value: T) -> impl Fn() -> SignalResult<()> + Send + Sync + 'static
    where
        T: Send + Sync + 'static,
    {
        let slot = self.clone();
        move || slot.set(value.clone())
    }
}

impl<T> Clone for SignalValue<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
            single_value: self.single_value,
        }
    }
}

impl<T> Default for SignalValue<T> {
    fn default() -> Self {
        Self::multi()
    }
}
