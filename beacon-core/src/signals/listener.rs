//! Listener Tables
//!
//! A type that reacts to several signal kinds implements [`SignalListener`]
//! and returns a static [`ListenerTable`]: one [`ListenerEntry`] per method,
//! each naming the kinds and scopes it binds. The table is built once per
//! type and shared by every instance.
//!
//! Registered callbacks hold a `Weak` reference to the listener. A listener
//! dropped without unregistering is skipped by dispatch instead of being
//! kept alive by the registry.

use std::sync::{Arc, Weak};

use indexmap::IndexSet;
use smallvec::SmallVec;
use tracing::{debug, warn};

use super::kind::{SignalBinding, SignalKind};
use super::registry::SignalRegistry;
use super::subscriber::{Delivery, Handler, Identifier, SignalCallback};
use crate::error::{ListenerError, SignalResult};

/// Signature of a table method.
pub type ListenerMethod<L> = fn(
    &L,
    &<L as SignalListener>::Args,
    &Delivery<'_, <L as SignalListener>::Id>,
) -> Result<(), ListenerError>;

/// One listener method and the kinds it binds.
pub struct ListenerEntry<L: SignalListener> {
    name: &'static str,
    method: ListenerMethod<L>,
    bindings: SmallVec<[SignalBinding; 2]>,
    wants_signal: bool,
    wants_target: bool,
}

impl<L: SignalListener> ListenerEntry<L> {
    pub fn new(name: &'static str, method: ListenerMethod<L>) -> Self {
        Self {
            name,
            method,
            bindings: SmallVec::new(),
            wants_signal: false,
            wants_target: false,
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

    pub fn with_signal(mut self) -> Self {
        self.wants_signal = true;
        self
    }

    pub fn with_target(mut self) -> Self {
        self.wants_target = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn bindings(&self) -> &[SignalBinding] {
        &self.bindings
    }

    /// Bind the method to one listener instance.
    fn callback(&self, listener: Weak<L>) -> SignalCallback<L::Id, L::Args> {
        let method = self.method;
        let name = self.name;
        let handler: Handler<L::Id, L::Args> =
            Arc::new(move |args: &L::Args, delivery: &Delivery<'_, L::Id>| {
                match listener.upgrade() {
                    Some(listener) => method(&listener, args, delivery),
                    None => {
                        warn!(method = name, "listener dropped without unregistering; skipped");
                        Ok(())
                    }
                }
            });
        SignalCallback::from_parts(
            handler,
            self.bindings.clone(),
            self.wants_signal,
            self.wants_target,
        )
    }
}

/// The methods a listener type exposes to the registry.
pub struct ListenerTable<L: SignalListener> {
    entries: Vec<ListenerEntry<L>>,
}

impl<L: SignalListener> ListenerTable<L> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn with(mut self, entry: ListenerEntry<L>) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn entries(&self) -> &[ListenerEntry<L>] {
        &self.entries
    }

    /// Every kind any entry binds, in first-seen order.
    pub fn kinds(&self) -> IndexSet<SignalKind> {
        self.entries
            .iter()
            .flat_map(|entry| entry.bindings.iter().map(|binding| binding.kind))
            .collect()
    }
}

impl<L: SignalListener> Default for ListenerTable<L> {
    fn default() -> Self {
        Self::new()
    }
}

/// A type whose methods are signal callbacks.
///
/// Implementors provide an identifier and a static table; registration,
/// unregistration and child delegation come for free.
///
/// # Example
///
/// ```rust
/// use std::sync::{Arc, OnceLock};
/// use beacon_core::error::ListenerError;
/// use beacon_core::signals::{
///     Delivery, ListenerEntry, ListenerId, ListenerTable, SignalKind, SignalListener,
///     SignalRegistry,
/// };
///
/// const ALARM: SignalKind = SignalKind::new("alarm");
///
/// struct Guard {
///     id: ListenerId,
/// }
///
/// impl Guard {
///     fn on_alarm(&self, _: &(), _: &Delivery<'_, ListenerId>) -> Result<(), ListenerError> {
///         Ok(())
///     }
/// }
///
/// impl SignalListener for Guard {
///     type Id = ListenerId;
///     type Args = ();
///
///     fn listener_id(&self) -> ListenerId {
///         self.id
///     }
///
///     fn signal_table() -> &'static ListenerTable<Self> {
///         static TABLE: OnceLock<ListenerTable<Guard>> = OnceLock::new();
///         TABLE.get_or_init(|| {
///             ListenerTable::new().with(ListenerEntry::new("on_alarm", Guard::on_alarm).global(ALARM))
///         })
///     }
/// }
///
/// let registry = SignalRegistry::new();
/// registry.declare(ALARM, None).unwrap();
///
/// let guard = Arc::new(Guard { id: ListenerId::new() });
/// guard.register_signals(&registry).unwrap();
/// registry.update_graph().unwrap();
/// registry.invoke(ALARM, &(), None).unwrap();
/// ```
pub trait SignalListener: Send + Sync + Sized + 'static {
    type Id: Identifier;
    type Args: Clone + Send + Sync + 'static;

    fn listener_id(&self) -> Self::Id;

    fn signal_table() -> &'static ListenerTable<Self>;

    /// Table entries bound to this instance, with their method names.
    fn signal_callbacks(self: &Arc<Self>) -> Vec<(&'static str, SignalCallback<Self::Id, Self::Args>)> {
        let weak = Arc::downgrade(self);
        Self::signal_table()
            .entries()
            .iter()
            .map(|entry| (entry.name, entry.callback(weak.clone())))
            .collect()
    }

    /// Stage a subscription for every table entry.
    fn register_signals(
        self: &Arc<Self>,
        registry: &SignalRegistry<Self::Id, Self::Args>,
    ) -> SignalResult<()> {
        let identifier = self.listener_id();
        let callbacks = self.signal_callbacks();
        for (_, callback) in &callbacks {
            registry.subscribe(identifier.clone(), callback)?;
        }
        debug!(listener = ?identifier, callbacks = callbacks.len(), "listener signals registered");
        Ok(())
    }

    /// Stage removal of every table entry.
    fn unregister_signals(&self, registry: &SignalRegistry<Self::Id, Self::Args>) -> SignalResult<()> {
        let identifier = self.listener_id();
        for entry in Self::signal_table().entries() {
            registry.unsubscribe_bindings(&identifier, entry.bindings())?;
        }
        debug!(listener = ?identifier, "listener signals unregistered");
        Ok(())
    }

    /// Make `child` a forest child of this listener for every kind this
    /// listener's table binds. With `greedy`, the child's own kinds are
    /// mirrored too.
    fn register_child<C>(
        &self,
        registry: &SignalRegistry<Self::Id, Self::Args>,
        child: &C,
        greedy: bool,
    ) -> SignalResult<()>
    where
        C: SignalListener<Id = Self::Id, Args = Self::Args>,
    {
        let child_id = child.listener_id();
        self.register_child_from(registry, child_id.clone(), Self::signal_table().kinds())?;
        if greedy {
            self.register_child_from(registry, child_id, C::signal_table().kinds())?;
        }
        Ok(())
    }

    /// Make `child` a forest child of this listener for an explicit set of
    /// kinds.
    fn register_child_from<K>(
        &self,
        registry: &SignalRegistry<Self::Id, Self::Args>,
        child: Self::Id,
        kinds: K,
    ) -> SignalResult<()>
    where
        K: IntoIterator<Item = SignalKind>,
    {
        let parent = self.listener_id();
        for kind in kinds {
            registry.set_parent(kind, child.clone(), parent.clone())?;
        }
        Ok(())
    }

    fn unregister_child<C>(
        &self,
        registry: &SignalRegistry<Self::Id, Self::Args>,
        child: &C,
        greedy: bool,
    ) -> SignalResult<()>
    where
        C: SignalListener<Id = Self::Id, Args = Self::Args>,
    {
        let child_id = child.listener_id();
        self.unregister_child_from(registry, child_id.clone(), Self::signal_table().kinds())?;
        if greedy {
            self.unregister_child_from(registry, child_id, C::signal_table().kinds())?;
        }
        Ok(())
    }

    fn unregister_child_from<K>(
        &self,
        registry: &SignalRegistry<Self::Id, Self::Args>,
        child: Self::Id,
        kinds: K,
    ) -> SignalResult<()>
    where
        K: IntoIterator<Item = SignalKind>,
    {
        let parent = self.listener_id();
        for kind in kinds {
            registry.remove_parent(kind, child.clone(), parent.clone())?;
        }
        Ok(())
    }
}
