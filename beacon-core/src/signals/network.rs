//! Built-in connection kinds.
//!
//! The taxonomy a networked game session raises. Registration of replicable
//! objects is cached so that systems created after an object was registered
//! still hear about it.
//!
//! ```text
//! SIGNAL
//! ├── CACHED (cached)
//! │   └── REPLICABLE_REGISTERED (cached)
//! ├── REPLICABLE_UNREGISTERED
//! ├── DISCONNECT
//! ├── CONNECTION_ERROR
//! ├── CONNECTION_SUCCESS
//! ├── CONNECTION_DELETED
//! └── LATENCY_UPDATED
//! ```

use super::kind::SignalKind;
use super::registry::SignalRegistry;
use super::subscriber::Identifier;
use crate::error::SignalResult;

pub const SIGNAL: SignalKind = SignalKind::new("signal");
pub const CACHED: SignalKind = SignalKind::new("cached_signal");
pub const REPLICABLE_REGISTERED: SignalKind = SignalKind::new("replicable_registered");
pub const REPLICABLE_UNREGISTERED: SignalKind = SignalKind::new("replicable_unregistered");
pub const DISCONNECT: SignalKind = SignalKind::new("disconnect");
pub const CONNECTION_ERROR: SignalKind = SignalKind::new("connection_error");
pub const CONNECTION_SUCCESS: SignalKind = SignalKind::new("connection_success");
pub const CONNECTION_DELETED: SignalKind = SignalKind::new("connection_deleted");
pub const LATENCY_UPDATED: SignalKind = SignalKind::new("latency_updated");

/// Declare the connection taxonomy on `registry`.
pub fn declare_network_signals<I, A>(registry: &SignalRegistry<I, A>) -> SignalResult<()>
where
    I: Identifier,
    A: Clone + Send + Sync + 'static,
{
    registry.declare(SIGNAL, None)?;
    registry.declare_cached(CACHED, Some(SIGNAL))?;
    registry.declare_cached(REPLICABLE_REGISTERED, Some(CACHED))?;

    for kind in [
        REPLICABLE_UNREGISTERED,
        DISCONNECT,
        CONNECTION_ERROR,
        CONNECTION_SUCCESS,
        CONNECTION_DELETED,
        LATENCY_UPDATED,
    ] {
        registry.declare(kind, Some(SIGNAL))?;
    }
    Ok(())
}
