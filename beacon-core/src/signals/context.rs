//! Dispatch Context
//!
//! Tracks which signal kinds are being dispatched on the current thread.
//! Dispatch is re-entrant: a callback may invoke another signal, so the
//! context is a stack rather than a single slot.
//!
//! # Implementation
//!
//! A thread-local stack holds one entry per active dispatch pass. Entering
//! a pass pushes its kind; the guard returned by [`DispatchContext::enter`]
//! pops it again, even if a callback panics.

use std::cell::RefCell;

use super::kind::SignalKind;

thread_local! {
    static DISPATCH_STACK: RefCell<Vec<SignalKind>> = const { RefCell::new(Vec::new()) };
}

/// Guard that pops the dispatch entry when dropped.
pub struct DispatchContext {
    kind: SignalKind,
}

impl DispatchContext {
    /// Mark `kind` as dispatching until the returned guard is dropped.
    pub fn enter(kind: SignalKind) -> Self {
        DISPATCH_STACK.with(|stack| stack.borrow_mut().push(kind));
        Self { kind }
    }

    /// Check if any dispatch pass is running on this thread.
    pub fn is_active() -> bool {
        DISPATCH_STACK.with(|stack| !stack.borrow().is_empty())
    }

    /// The innermost kind being dispatched, if any.
    pub fn current() -> Option<SignalKind> {
        DISPATCH_STACK.with(|stack| stack.borrow().last().copied())
    }

    /// Number of nested dispatch passes.
    pub fn depth() -> usize {
        DISPATCH_STACK.with(|stack| stack.borrow().len())
    }
}

impl Drop for DispatchContext {
    fn drop(&mut self) {
        DISPATCH_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();
            debug_assert_eq!(
                popped,
                Some(self.kind),
                "DispatchContext mismatch: expected {:?}, got {:?}",
                self.kind,
                popped
            );
        });
    }
}
