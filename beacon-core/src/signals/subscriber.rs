//! Subscriber types for the signal system.
//!
//! A subscriber is an identifier plus a callback. The identifier is only a
//! key: the registry never owns or keeps alive whatever it names.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use smallvec::SmallVec;

use super::kind::{Scope, SignalBinding, SignalKind};
use crate::error::ListenerError;

/// Bounds required of subscriber identifiers.
pub trait Identifier: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> Identifier for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// Unique identifier for a listener.
///
/// Any [`Identifier`] works as a subscriber key; this one is handy for
/// listeners that have no natural identity of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Generate a new unique listener ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Extra context handed to a callback next to the invocation payload.
///
/// Each field is only filled in when the callback asked for it.
#[derive(Debug)]
pub struct Delivery<'a, I> {
    /// The kind currently dispatching (an ancestor of the invoked kind
    /// after escalation).
    pub signal: Option<SignalKind>,

    /// The target the invocation was addressed to. Descendants reached
    /// through the forest see the invoked target, not themselves.
    pub target: Option<&'a I>,
}

/// Type-erased callback body.
pub type Handler<I, A> =
    Arc<dyn Fn(&A, &Delivery<'_, I>) -> Result<(), ListenerError> + Send + Sync>;

/// A callback together with the kinds it listens to.
pub struct SignalCallback<I, A> {
    bindings: SmallVec<[SignalBinding; 2]>,
    wants_signal: bool,
    wants_target: bool,
    handler: Handler<I, A>,
}

impl<I, A> SignalCallback<I, A> {
    /// Wrap a closure. Add bindings with [`global`](Self::global) and
    /// [`contextual`](Self::contextual).
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&A, &Delivery<'_, I>) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        Self {
            bindings: SmallVec::new(),
            wants_signal: false,
            wants_target: false,
            handler: Arc::new(handler),
        }
    }

    pub(crate) fn from_parts(
        handler: Handler<I, A>,
        bindings: SmallVec<[SignalBinding; 2]>,
        wants_signal: bool,
        wants_target: bool,
    ) -> Self {
        Self {
            bindings,
            wants_signal,
            wants_target,
            handler,
        }
    }

    pub fn global(mut self, kind: SignalKind) -> Self {
        self.bindings.push(SignalBinding::global(kind));
        self
    }

    pub fn contextual(mut self, kind: SignalKind) -> Self {
        self.bindings.push(SignalBinding::contextual(kind));
        self
    }

    /// Ask for the dispatching kind in [`Delivery::signal`].
    pub fn with_signal(mut self) -> Self {
        self.wants_signal = true;
        self
    }

    /// Ask for the invocation target in [`Delivery::target`].
    pub fn with_target(mut self) -> Self {
        self.wants_target = true;
        self
    }

    pub fn bindings(&self) -> &[SignalBinding] {
        &self.bindings
    }

    pub(crate) fn subscription(&self) -> Subscription<I, A> {
        Subscription {
            handler: Arc::clone(&self.handler),
            wants_signal: self.wants_signal,
            wants_target: self.wants_target,
        }
    }
}

impl<I, A> Clone for SignalCallback<I, A> {
    fn clone(&self) -> Self {
        Self {
            bindings: self.bindings.clone(),
            wants_signal: self.wants_signal,
            wants_target: self.wants_target,
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<I, A> Debug for SignalCallback<I, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalCallback")
            .field("bindings", &self.bindings)
            .field("wants_signal", &self.wants_signal)
            .field("wants_target", &self.wants_target)
            .finish()
    }
}

/// A registry entry: what the registry stores per identifier and kind.
pub(crate) struct Subscription<I, A> {
    handler: Handler<I, A>,
    wants_signal: bool,
    wants_target: bool,
}

impl<I, A> Subscription<I, A> {
    /// Run the callback, filling in only the context it asked for.
    pub(crate) fn deliver(
        &self,
        kind: SignalKind,
        args: &A,
        target: Option<&I>,
    ) -> Result<(), ListenerError> {
        let delivery = Delivery {
            signal: self.wants_signal.then_some(kind),
            target: if self.wants_target { target } else { None },
        };
        (self.handler)(args, &delivery)
    }
}

impl<I, A> Clone for Subscription<I, A> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            wants_signal: self.wants_signal,
            wants_target: self.wants_target,
        }
    }
}

/// A subscription applied by a flush, reported to hooks and cache replay.
pub(crate) struct Applied<I, A> {
    pub scope: Scope,
    pub identifier: I,
    pub subscription: Subscription<I, A>,
}
