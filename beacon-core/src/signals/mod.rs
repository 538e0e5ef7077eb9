//! Signal System
//!
//! Observer dispatch with two subscription scopes:
//!
//! - **Global** subscribers hear every invocation of a kind.
//! - **Contextual** subscribers hear an invocation only when its target is
//!   their identifier, or an ancestor of it in the kind's forest.
//!
//! Kinds form a taxonomy; invoking a kind also invokes each of its ancestor
//! kinds. Cached kinds remember their invocations and replay them to late
//! global subscribers.
//!
//! All subscription and forest changes are staged and take effect on the
//! next [`SignalRegistry::update_graph`], so a dispatch pass always sees a
//! stable set of subscribers.

mod args;
mod context;
mod forest;
mod kind;
mod listener;
pub mod network;
mod registry;
mod subscriber;
mod value;

pub use args::SignalArgs;
pub use context::DispatchContext;
pub use forest::Forest;
pub use kind::{KindSpec, Scope, SignalBinding, SignalHierarchy, SignalKind};
pub use listener::{ListenerEntry, ListenerMethod, ListenerTable, SignalListener};
pub use registry::{SignalRegistry, SubscribedHook};
pub use subscriber::{Delivery, Handler, Identifier, ListenerId, SignalCallback};
pub use value::SignalValue;
