//! Beacon Core
//!
//! Engine-independent building blocks for the Beacon game runtime:
//!
//! - Signal dispatch with global and per-instance subscribers, a listener
//!   forest for targeted delivery, kind escalation and cached replay
//! - Hierarchical pathfinding: A* corridors over a region graph, refined by
//!   the funnel algorithm
//!
//! The crate is usable as a native Rust library and, with the `python`
//! feature, as a Python extension module via PyO3.
//!
//! # Architecture
//!
//! - `signals`: kinds, registry, dispatch, listener tables, signal values
//! - `pathfinding`: geometry, A*, funnel, navigation mesh, pathfinder
//! - `error`: error types shared by both
//!
//! # Example
//!
//! ```rust
//! use beacon_core::signals::{Delivery, SignalCallback, SignalKind, SignalRegistry, SignalValue};
//!
//! const QUERY_HEALTH: SignalKind = SignalKind::new("query_health");
//!
//! let registry: SignalRegistry<&'static str, SignalValue<u32>> = SignalRegistry::new();
//! registry.declare(QUERY_HEALTH, None).unwrap();
//!
//! let answer = SignalCallback::new(|reply: &SignalValue<u32>, _: &Delivery<'_, &'static str>| {
//!     reply.set(80)?;
//!     Ok(())
//! })
//! .contextual(QUERY_HEALTH);
//!
//! registry.subscribe("player", &answer).unwrap();
//! registry.update_graph().unwrap();
//!
//! let reply = SignalValue::single();
//! registry.invoke(QUERY_HEALTH, &reply, Some(&"player")).unwrap();
//! assert_eq!(reply.value(), Some(80));
//! ```

pub mod error;
pub mod pathfinding;
pub mod signals;

#[cfg(feature = "python")]
mod python;

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Python module definition.
///
/// This function is called by Python when importing the module.
#[cfg(feature = "python")]
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<python::PySignalValue>()?;
    m.add_function(wrap_pyfunction!(python::string_pull, m)?)?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
