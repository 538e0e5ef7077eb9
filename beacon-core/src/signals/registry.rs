//! Signal Registry
//!
//! The registry owns one channel per declared [`SignalKind`]. A channel
//! holds the live subscriber maps and forest, a queue of staged mutations,
//! and (for cached kinds) the log of past invocations.
//!
//! # Deferred Mutation
//!
//! `subscribe`, `unsubscribe`, `set_parent` and `remove_parent` never touch
//! live state. They append to the channel's pending queues, and
//! [`SignalRegistry::update_state`] applies a whole batch at once:
//!
//! 1. global subscribes
//! 2. contextual subscribes
//! 3. contextual unsubscribes
//! 4. global unsubscribes
//! 5. child additions (merged into the forest)
//! 6. child removals (empty parents are dropped)
//!
//! Subscribes run before unsubscribes, so subscribing and unsubscribing the
//! same identifier inside one batch leaves it absent.
//!
//! # Snapshots
//!
//! Live state sits behind an `Arc`. Dispatch clones the `Arc` and iterates
//! the snapshot with no lock held, so callbacks can stage mutations, invoke
//! other signals, or flush. A flush that lands while a snapshot is in use
//! copies the state instead of mutating it.
//!
//! # Dispatch
//!
//! [`SignalRegistry::invoke`] runs for the invoked kind and then each of its
//! ancestors:
//!
//! - cached kinds log the invocation
//! - with a target, contextual subscribers are reached by walking the forest
//!   from the target down
//! - global subscribers are called in insertion order
//!
//! A callback error stops the whole invocation and is returned to the
//! caller. Listeners after the failing one are not called.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use indexmap::{IndexMap, IndexSet};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace, warn};

use super::context::DispatchContext;
use super::forest::Forest;
use super::kind::{Scope, SignalBinding, SignalHierarchy, SignalKind};
use super::subscriber::{Applied, Identifier, SignalCallback, Subscription};
use crate::error::{SignalError, SignalResult};

/// Called for every subscription a flush applies.
pub type SubscribedHook<I> = Arc<dyn Fn(SignalKind, Scope, &I) + Send + Sync>;

struct LiveState<I, A> {
    subscribers: IndexMap<I, Subscription<I, A>>,
    isolated_subscribers: IndexMap<I, Subscription<I, A>>,
    children: Forest<I>,
}

impl<I, A> Default for LiveState<I, A> {
    fn default() -> Self {
        Self {
            subscribers: IndexMap::new(),
            isolated_subscribers: IndexMap::new(),
            children: Forest::default(),
        }
    }
}

impl<I: Clone, A> Clone for LiveState<I, A> {
    fn clone(&self) -> Self {
        Self {
            subscribers: self.subscribers.clone(),
            isolated_subscribers: self.isolated_subscribers.clone(),
            children: self.children.clone(),
        }
    }
}

struct Pending<I, A> {
    to_subscribe_global: IndexMap<I, Subscription<I, A>>,
    to_subscribe_context: IndexMap<I, Subscription<I, A>>,
    to_unsubscribe_global: Vec<I>,
    to_unsubscribe_context: Vec<I>,
    /// parent -> children
    to_add_child: IndexMap<I, IndexSet<I>>,
    /// (child, parent)
    to_remove_child: IndexSet<(I, I)>,
}

impl<I, A> Default for Pending<I, A> {
    fn default() -> Self {
        Self {
            to_subscribe_global: IndexMap::new(),
            to_subscribe_context: IndexMap::new(),
            to_unsubscribe_global: Vec::new(),
            to_unsubscribe_context: Vec::new(),
            to_add_child: IndexMap::new(),
            to_remove_child: IndexSet::new(),
        }
    }
}

impl<I, A> Pending<I, A> {
    fn is_empty(&self) -> bool {
        self.to_subscribe_global.is_empty()
            && self.to_subscribe_context.is_empty()
            && self.to_unsubscribe_global.is_empty()
            && self.to_unsubscribe_context.is_empty()
            && self.to_add_child.is_empty()
            && self.to_remove_child.is_empty()
    }
}

#[derive(Clone)]
struct CachedInvocation<I, A> {
    args: A,
    target: Option<I>,
}

struct Channel<I, A> {
    kind: SignalKind,
    live: RwLock<Arc<LiveState<I, A>>>,
    pending: Mutex<Pending<I, A>>,
    cache: Option<Mutex<Vec<CachedInvocation<I, A>>>>,
}

impl<I, A> Channel<I, A>
where
    I: Identifier,
    A: Clone + Send + Sync + 'static,
{
    fn new(kind: SignalKind, cached: bool) -> Self {
        Self {
            kind,
            live: RwLock::new(Arc::new(LiveState::default())),
            pending: Mutex::new(Pending::default()),
            cache: cached.then(|| Mutex::new(Vec::new())),
        }
    }

    fn snapshot(&self) -> Arc<LiveState<I, A>> {
        Arc::clone(&self.live.read())
    }

    fn stage_subscribe(&self, scope: Scope, identifier: I, subscription: Subscription<I, A>) {
        let mut pending = self.pending.lock();
        match scope {
            Scope::Global => pending.to_subscribe_global.insert(identifier, subscription),
            Scope::Contextual => pending.to_subscribe_context.insert(identifier, subscription),
        };
    }

    fn stage_unsubscribe(&self, scope: Scope, identifier: &I) {
        let live = self.snapshot();
        let mut pending = self.pending.lock();
        match scope {
            Scope::Global => pending.to_unsubscribe_global.push(identifier.clone()),
            Scope::Contextual => pending.to_unsubscribe_context.push(identifier.clone()),
        }

        // An unsubscribed identifier must not stay reachable by targeted dispatch.
        for (parent, child) in live.children.edges_involving(identifier) {
            pending.to_remove_child.insert((child, parent));
        }
        pending.to_add_child.shift_remove(identifier);
        pending.to_add_child.retain(|_, children| {
            children.shift_remove(identifier);
            !children.is_empty()
        });
    }

    fn stage_add_child(&self, child: I, parent: I) {
        self.pending
            .lock()
            .to_add_child
            .entry(parent)
            .or_default()
            .insert(child);
    }

    fn stage_remove_child(&self, child: I, parent: I) {
        self.pending.lock().to_remove_child.insert((child, parent));
    }

    fn has_pending(&self) -> bool {
        !self.pending.lock().is_empty()
    }

    /// Apply the staged batch. Returns the subscriptions that were added.
    fn flush(&self) -> Vec<Applied<I, A>> {
        let pending = std::mem::take(&mut *self.pending.lock());
        if pending.is_empty() {
            return Vec::new();
        }
        let Pending {
            to_subscribe_global,
            to_subscribe_context,
            to_unsubscribe_global,
            to_unsubscribe_context,
            to_add_child,
            to_remove_child,
        } = pending;

        let mut applied = Vec::with_capacity(to_subscribe_global.len() + to_subscribe_context.len());
        let mut live_guard = self.live.write();
        let live = Arc::make_mut(&mut *live_guard);

        for (identifier, subscription) in to_subscribe_global {
            live.subscribers.insert(identifier.clone(), subscription.clone());
            applied.push(Applied {
                scope: Scope::Global,
                identifier,
                subscription,
            });
        }

        for (identifier, subscription) in to_subscribe_context {
            live.isolated_subscribers.insert(identifier.clone(), subscription.clone());
            applied.push(Applied {
                scope: Scope::Contextual,
                identifier,
                subscription,
            });
        }

        for identifier in &to_unsubscribe_context {
            live.isolated_subscribers.shift_remove(identifier);
        }

        for identifier in &to_unsubscribe_global {
            live.subscribers.shift_remove(identifier);
        }

        for (parent, children) in to_add_child {
            for child in children {
                live.children.add_edge(parent.clone(), child);
            }
        }

        for (child, parent) in &to_remove_child {
            if !live.children.remove_edge(parent, child) {
                trace!(kind = %self.kind, ?parent, ?child, "ignoring removal of unknown edge");
            }
        }

        debug!(
            kind = %self.kind,
            subscribed = applied.len(),
            unsubscribed = to_unsubscribe_global.len() + to_unsubscribe_context.len(),
            edges_removed = to_remove_child.len(),
            "signal state updated"
        );

        applied
    }

    fn dispatch(&self, args: &A, target: Option<&I>) -> SignalResult<()> {
        if let Some(cache) = &self.cache {
            cache.lock().push(CachedInvocation {
                args: args.clone(),
                target: target.cloned(),
            });
        }

        let live = self.snapshot();
        let _ctx = DispatchContext::enter(self.kind);
        trace!(
            kind = %self.kind,
            targeted = target.is_some(),
            global = live.subscribers.len(),
            "dispatching signal"
        );

        if let Some(target) = target {
            let mut path = Vec::new();
            self.dispatch_targeted(&live, args, target, target, &mut path)?;
        }

        for subscription in live.subscribers.values() {
            self.deliver(subscription, args, target)?;
        }

        Ok(())
    }

    /// Walk the forest from `addressee`, calling contextual subscribers.
    ///
    /// `path` holds the ancestors of `addressee` on the current descent; an
    /// edge back onto it is a cycle and is not followed.
    fn dispatch_targeted<'a>(
        &self,
        live: &'a LiveState<I, A>,
        args: &A,
        target: &I,
        addressee: &'a I,
        path: &mut Vec<&'a I>,
    ) -> SignalResult<()> {
        if path.contains(&addressee) {
            warn!(kind = %self.kind, ?addressee, "forest cycle; not descending");
            return Ok(());
        }

        if let Some(subscription) = live.isolated_subscribers.get(addressee) {
            self.deliver(subscription, args, Some(target))?;
        }

        if let Some(children) = live.children.children(addressee) {
            path.push(addressee);
            for child in children {
                self.dispatch_targeted(live, args, target, child, path)?;
            }
            path.pop();
        }

        Ok(())
    }

    /// Deliver every cached invocation, oldest first, to one subscription.
    fn replay(&self, subscription: &Subscription<I, A>) -> SignalResult<()> {
        let Some(cache) = &self.cache else {
            return Ok(());
        };
        let entries = cache.lock().clone();
        if entries.is_empty() {
            return Ok(());
        }

        let _ctx = DispatchContext::enter(self.kind);
        trace!(kind = %self.kind, count = entries.len(), "replaying cached invocations");
        for entry in &entries {
            self.deliver(subscription, &entry.args, entry.target.as_ref())?;
        }
        Ok(())
    }

    fn deliver(
        &self,
        subscription: &Subscription<I, A>,
        args: &A,
        target: Option<&I>,
    ) -> SignalResult<()> {
        subscription
            .deliver(self.kind, args, target)
            .map_err(|source| SignalError::Listener {
                kind: self.kind,
                source,
            })
    }
}

/// Per-kind subscriber storage and dispatch.
///
/// # Type Parameters
///
/// - `I`: subscriber identifier. Stored by value, never dereferenced.
/// - `A`: invocation payload. Cloned into the cache of cached kinds.
///
/// # Example
///
/// ```rust
/// use beacon_core::signals::{Delivery, SignalCallback, SignalKind, SignalRegistry};
///
/// const DAMAGED: SignalKind = SignalKind::new("damaged");
///
/// let registry: SignalRegistry<u32, f32> = SignalRegistry::new();
/// registry.declare(DAMAGED, None).unwrap();
///
/// let callback = SignalCallback::new(|amount: &f32, _: &Delivery<'_, u32>| {
///     assert_eq!(*amount, 12.5);
///     Ok(())
/// })
/// .global(DAMAGED);
///
/// registry.subscribe(1, &callback).unwrap();
/// registry.update_graph().unwrap();
/// registry.invoke(DAMAGED, &12.5, None).unwrap();
/// ```
pub struct SignalRegistry<I, A> {
    hierarchy: RwLock<SignalHierarchy>,
    channels: DashMap<SignalKind, Arc<Channel<I, A>>>,
    hook: RwLock<Option<SubscribedHook<I>>>,
}

impl<I, A> SignalRegistry<I, A>
where
    I: Identifier,
    A: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            hierarchy: RwLock::new(SignalHierarchy::new()),
            channels: DashMap::new(),
            hook: RwLock::new(None),
        }
    }

    /// Declare a kind whose invocations escalate to `parent`.
    pub fn declare(&self, kind: SignalKind, parent: Option<SignalKind>) -> SignalResult<()> {
        self.declare_with(kind, parent, false)
    }

    /// Declare a kind that logs its invocations and replays them to late
    /// global subscribers.
    pub fn declare_cached(&self, kind: SignalKind, parent: Option<SignalKind>) -> SignalResult<()> {
        self.declare_with(kind, parent, true)
    }

    fn declare_with(
        &self,
        kind: SignalKind,
        parent: Option<SignalKind>,
        cached: bool,
    ) -> SignalResult<()> {
        self.hierarchy.write().declare(kind, parent, cached)?;
        self.channels
            .insert(kind, Arc::new(Channel::new(kind, cached)));
        debug!(%kind, parent = ?parent.map(|p| p.name()), cached, "signal kind declared");
        Ok(())
    }

    /// A copy of the kind table.
    pub fn hierarchy(&self) -> SignalHierarchy {
        self.hierarchy.read().clone()
    }

    /// Install the hook called for every subscription applied by a flush.
    pub fn on_subscribed<F>(&self, hook: F)
    where
        F: Fn(SignalKind, Scope, &I) + Send + Sync + 'static,
    {
        *self.hook.write() = Some(Arc::new(hook));
    }

    fn channel(&self, kind: SignalKind) -> SignalResult<Arc<Channel<I, A>>> {
        self.channels
            .get(&kind)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(SignalError::UnknownSignal(kind))
    }

    /// Stage `callback` under `identifier` for each of its bindings.
    ///
    /// A callback without bindings is a no-op. Every bound kind must be
    /// declared; nothing is staged otherwise.
    pub fn subscribe(&self, identifier: I, callback: &SignalCallback<I, A>) -> SignalResult<()> {
        if callback.bindings().is_empty() {
            warn!(?identifier, "callback declares no signals; nothing subscribed");
            return Ok(());
        }

        let channels = self.channels_for(callback.bindings())?;
        for (binding, channel) in callback.bindings().iter().zip(channels) {
            channel.stage_subscribe(binding.scope, identifier.clone(), callback.subscription());
        }
        Ok(())
    }

    /// Stage removal of `identifier` for each of the callback's bindings.
    pub fn unsubscribe(&self, identifier: &I, callback: &SignalCallback<I, A>) -> SignalResult<()> {
        self.unsubscribe_bindings(identifier, callback.bindings())
    }

    /// Stage removal of `identifier` for an explicit list of bindings.
    ///
    /// Also stages removal of every forest edge touching `identifier` in
    /// the bound kinds.
    pub fn unsubscribe_bindings(&self, identifier: &I, bindings: &[SignalBinding]) -> SignalResult<()> {
        let channels = self.channels_for(bindings)?;
        for (binding, channel) in bindings.iter().zip(channels) {
            channel.stage_unsubscribe(binding.scope, identifier);
        }
        Ok(())
    }

    fn channels_for(&self, bindings: &[SignalBinding]) -> SignalResult<Vec<Arc<Channel<I, A>>>> {
        bindings
            .iter()
            .map(|binding| self.channel(binding.kind))
            .collect()
    }

    /// Stage `identifier` as a child of `parent` for `kind`.
    pub fn set_parent(&self, kind: SignalKind, identifier: I, parent: I) -> SignalResult<()> {
        self.channel(kind)?.stage_add_child(identifier, parent);
        Ok(())
    }

    /// Stage removal of the `parent` → `identifier` edge for `kind`.
    pub fn remove_parent(&self, kind: SignalKind, identifier: I, parent: I) -> SignalResult<()> {
        self.channel(kind)?.stage_remove_child(identifier, parent);
        Ok(())
    }

    /// Apply the staged mutations of one kind.
    ///
    /// After the batch is applied, the subscribed hook runs for each new
    /// subscription and new global subscribers of a cached kind receive the
    /// cached invocations.
    ///
    /// Every applied subscription is already live, so a failing replay does
    /// not stop the others from being replayed. The first failure is
    /// returned once the whole batch has been handled.
    pub fn update_state(&self, kind: SignalKind) -> SignalResult<()> {
        let channel = self.channel(kind)?;
        let applied = channel.flush();
        if applied.is_empty() {
            return Ok(());
        }

        let hook = self.hook.read().clone();
        let mut first_error = None;
        for Applied {
            scope,
            identifier,
            subscription,
        } in applied
        {
            if let Some(hook) = &hook {
                hook(kind, scope, &identifier);
            }
            if scope != Scope::Global {
                continue;
            }
            if let Err(err) = channel.replay(&subscription) {
                warn!(%kind, ?identifier, error = %err, "cache replay failed");
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Apply the staged mutations of every declared kind.
    ///
    /// Call once per tick of the host loop.
    pub fn update_graph(&self) -> SignalResult<()> {
        let kinds: Vec<SignalKind> = self.hierarchy.read().kinds().collect();
        for kind in kinds {
            self.update_state(kind)?;
        }
        Ok(())
    }

    /// Invoke `kind` and escalate through its ancestors.
    pub fn invoke(&self, kind: SignalKind, args: &A, target: Option<&I>) -> SignalResult<()> {
        let chain = self.hierarchy.read().chain(kind)?;
        for kind in chain {
            self.channel(kind)?.dispatch(args, target)?;
        }
        Ok(())
    }

    /// Global plus contextual subscriber count for one kind.
    pub fn subscriber_count(&self, kind: SignalKind) -> SignalResult<usize> {
        let live = self.channel(kind)?.snapshot();
        Ok(live.subscribers.len() + live.isolated_subscribers.len())
    }

    pub fn is_subscribed(&self, kind: SignalKind, identifier: &I, scope: Scope) -> bool {
        let Ok(channel) = self.channel(kind) else {
            return false;
        };
        let live = channel.snapshot();
        match scope {
            Scope::Global => live.subscribers.contains_key(identifier),
            Scope::Contextual => live.isolated_subscribers.contains_key(identifier),
        }
    }

    /// Live children of `identifier` for one kind.
    pub fn children_of(&self, kind: SignalKind, identifier: &I) -> Vec<I> {
        self.channel(kind)
            .map(|channel| {
                channel
                    .snapshot()
                    .children
                    .children(identifier)
                    .map(|set| set.iter().cloned().collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    /// Number of logged invocations. Zero for kinds that are not cached.
    pub fn cache_len(&self, kind: SignalKind) -> usize {
        self.channel(kind)
            .ok()
            .and_then(|channel| channel.cache.as_ref().map(|cache| cache.lock().len()))
            .unwrap_or(0)
    }

    /// Whether a flush of `kind` would change anything.
    pub fn has_pending(&self, kind: SignalKind) -> bool {
        self.channel(kind)
            .map(|channel| channel.has_pending())
            .unwrap_or(false)
    }
}

impl<I, A> Default for SignalRegistry<I, A>
where
    I: Identifier,
    A: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<I, A> fmt::Debug for SignalRegistry<I, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalRegistry")
            .field("kinds", &self.hierarchy.read().len())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
