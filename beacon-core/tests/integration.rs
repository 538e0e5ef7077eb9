//! Integration Tests
//!
//! These tests drive the public API the way a game loop would: declare
//! kinds, register listeners, flush once per tick, invoke, and plan paths.

use std::sync::{Arc, OnceLock};
use std::thread;

use parking_lot::Mutex;

use beacon_core::error::{ListenerError, PathError, SignalError};
use beacon_core::pathfinding::{NavMesh, Pathfinder, Point, Route, SearchConfig};
use beacon_core::signals::network::{self, declare_network_signals};
use beacon_core::signals::{
    Delivery, ListenerEntry, ListenerId, ListenerTable, SignalArgs, SignalCallback, SignalKind,
    SignalListener, SignalRegistry, SignalValue,
};

// ----------------------------------------------------------------------------
// Listener hierarchy
// ----------------------------------------------------------------------------

const DAMAGE: SignalKind = SignalKind::new("damage");
const QUERY_ALIVE: SignalKind = SignalKind::new("query_alive");

#[derive(Clone)]
enum Event {
    Damage(u32),
    QueryAlive(SignalValue<bool>),
}

struct Squad {
    id: ListenerId,
}

impl Squad {
    fn on_damage(&self, _: &Event, _: &Delivery<'_, ListenerId>) -> Result<(), ListenerError> {
        Ok(())
    }
}

impl SignalListener for Squad {
    type Id = ListenerId;
    type Args = Event;

    fn listener_id(&self) -> ListenerId {
        self.id
    }

    fn signal_table() -> &'static ListenerTable<Self> {
        static TABLE: OnceLock<ListenerTable<Squad>> = OnceLock::new();
        TABLE.get_or_init(|| {
            ListenerTable::new().with(ListenerEntry::new("on_damage", Squad::on_damage).contextual(DAMAGE))
        })
    }
}

struct Soldier {
    id: ListenerId,
    health: Mutex<u32>,
}

impl Soldier {
    fn new(health: u32) -> Arc<Self> {
        Arc::new(Self {
            id: ListenerId::new(),
            health: Mutex::new(health),
        })
    }

    fn on_damage(&self, event: &Event, _: &Delivery<'_, ListenerId>) -> Result<(), ListenerError> {
        if let Event::Damage(amount) = event {
            let mut health = self.health.lock();
            *health = health.saturating_sub(*amount);
        }
        Ok(())
    }

    fn on_query_alive(&self, event: &Event, _: &Delivery<'_, ListenerId>) -> Result<(), ListenerError> {
        if let Event::QueryAlive(reply) = event {
            reply.set(*self.health.lock() > 0)?;
        }
        Ok(())
    }
}

impl SignalListener for Soldier {
    type Id = ListenerId;
    type Args = Event;

    fn listener_id(&self) -> ListenerId {
        self.id
    }

    fn signal_table() -> &'static ListenerTable<Self> {
        static TABLE: OnceLock<ListenerTable<Soldier>> = OnceLock::new();
        TABLE.get_or_init(|| {
            ListenerTable::new()
                .with(ListenerEntry::new("on_damage", Soldier::on_damage).contextual(DAMAGE))
                .with(ListenerEntry::new("on_query_alive", Soldier::on_query_alive).contextual(QUERY_ALIVE))
        })
    }
}

fn combat_registry() -> SignalRegistry<ListenerId, Event> {
    let registry = SignalRegistry::new();
    registry.declare(DAMAGE, None).unwrap();
    registry.declare(QUERY_ALIVE, None).unwrap();
    registry
}

/// Damage aimed at a squad reaches every soldier in it.
#[test]
fn squad_damage_reaches_members() {
    let registry = combat_registry();
    let squad = Arc::new(Squad { id: ListenerId::new() });
    let alice = Soldier::new(50);
    let bob = Soldier::new(30);

    squad.register_signals(&registry).unwrap();
    for soldier in [&alice, &bob] {
        soldier.register_signals(&registry).unwrap();
        squad.register_child(&registry, soldier.as_ref(), true).unwrap();
    }
    registry.update_graph().unwrap();

    registry.invoke(DAMAGE, &Event::Damage(40), Some(&squad.id)).unwrap();
    assert_eq!(*alice.health.lock(), 10);
    assert_eq!(*bob.health.lock(), 0);

    // Targeting one soldier leaves the other alone.
    registry.invoke(DAMAGE, &Event::Damage(5), Some(&alice.id)).unwrap();
    assert_eq!(*alice.health.lock(), 5);
    assert_eq!(*bob.health.lock(), 0);
}

/// A listener answers through a single-value reply slot.
#[test]
fn query_through_signal_value() {
    let registry = combat_registry();
    let bob = Soldier::new(0);
    bob.register_signals(&registry).unwrap();
    registry.update_graph().unwrap();

    let reply = SignalValue::single();
    registry
        .invoke(QUERY_ALIVE, &Event::QueryAlive(reply.clone()), Some(&bob.id))
        .unwrap();
    assert!(reply.changed());
    assert_eq!(reply.value(), Some(false));

    // A second answer into the same slot is a listener error.
    let err = registry
        .invoke(QUERY_ALIVE, &Event::QueryAlive(reply), Some(&bob.id))
        .unwrap_err();
    assert!(matches!(err, SignalError::Listener { kind, .. } if kind == QUERY_ALIVE));
}

/// A removed squad member stops receiving squad-wide events.
#[test]
fn unregistered_child_is_cut_off() {
    let registry = combat_registry();
    let squad = Arc::new(Squad { id: ListenerId::new() });
    let alice = Soldier::new(50);

    alice.register_signals(&registry).unwrap();
    squad.register_child(&registry, alice.as_ref(), false).unwrap();
    registry.update_graph().unwrap();

    squad.unregister_child(&registry, alice.as_ref(), false).unwrap();
    registry.update_graph().unwrap();

    registry.invoke(DAMAGE, &Event::Damage(10), Some(&squad.id)).unwrap();
    assert_eq!(*alice.health.lock(), 50);
}

// ----------------------------------------------------------------------------
// Network taxonomy
// ----------------------------------------------------------------------------

/// Systems created after replicables registered still learn about them.
#[test]
fn late_system_receives_registered_replicables() {
    let registry: SignalRegistry<&'static str, SignalArgs> = SignalRegistry::new();
    declare_network_signals(&registry).unwrap();

    for id in [1, 2, 3] {
        registry
            .invoke(network::REPLICABLE_REGISTERED, &SignalArgs::new().arg(id), None)
            .unwrap();
    }

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    let callback = SignalCallback::new(move |args: &SignalArgs, _: &Delivery<'_, &'static str>| {
        seen_clone.lock().push(args.get(0).and_then(|v| v.as_i64()));
        Ok(())
    })
    .global(network::REPLICABLE_REGISTERED);

    registry.subscribe("replication_system", &callback).unwrap();
    registry.update_graph().unwrap();
    registry
        .invoke(network::REPLICABLE_REGISTERED, &SignalArgs::new().arg(4), None)
        .unwrap();

    assert_eq!(*seen.lock(), vec![Some(1), Some(2), Some(3), Some(4)]);
}

/// A root listener hears every connection event, tagged with its kind.
#[test]
fn root_listener_hears_every_connection_event() {
    let registry: SignalRegistry<&'static str, SignalArgs> = SignalRegistry::new();
    declare_network_signals(&registry).unwrap();

    let kinds = Arc::new(Mutex::new(Vec::new()));
    let kinds_clone = kinds.clone();
    let logger = SignalCallback::new(move |_: &SignalArgs, delivery: &Delivery<'_, &'static str>| {
        kinds_clone.lock().push(delivery.signal);
        Ok(())
    })
    .global(network::SIGNAL)
    .with_signal();

    registry.subscribe("logger", &logger).unwrap();
    registry.update_graph().unwrap();

    let latency = SignalArgs::new().kwarg("latency_ms", 42);
    registry.invoke(network::LATENCY_UPDATED, &latency, None).unwrap();
    registry.invoke(network::DISCONNECT, &SignalArgs::new(), None).unwrap();

    assert_eq!(*kinds.lock(), vec![Some(network::SIGNAL), Some(network::SIGNAL)]);
}

/// Registries are shared across threads; staging from several threads is
/// applied by one flush.
#[test]
fn staging_from_many_threads() {
    let registry: Arc<SignalRegistry<u32, ()>> = Arc::new(SignalRegistry::new());
    declare_network_signals(registry.as_ref()).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let callback = SignalCallback::new(|_: &(), _: &Delivery<'_, u32>| Ok(()))
                    .global(network::CONNECTION_SUCCESS);
                registry.subscribe(i, &callback).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(registry.subscriber_count(network::CONNECTION_SUCCESS).unwrap(), 0);
    registry.update_graph().unwrap();
    assert_eq!(registry.subscriber_count(network::CONNECTION_SUCCESS).unwrap(), 8);
}

// ----------------------------------------------------------------------------
// Pathfinding
// ----------------------------------------------------------------------------

const CORRIDOR_MESH: &str = r#"{
    "polygons": [
        [{"x": 0, "y": 0}, {"x": 4, "y": 0}, {"x": 4, "y": 4}, {"x": 0, "y": 4}],
        [{"x": 0, "y": 4}, {"x": 4, "y": 4}, {"x": 4, "y": 8}, {"x": 0, "y": 8}],
        [{"x": 4, "y": 4}, {"x": 8, "y": 4}, {"x": 8, "y": 8}, {"x": 4, "y": 8}],
        [{"x": 8, "y": 4}, {"x": 12, "y": 4}, {"x": 12, "y": 8}, {"x": 8, "y": 8}],
        [{"x": 8, "y": 0}, {"x": 12, "y": 0}, {"x": 12, "y": 4}, {"x": 8, "y": 4}]
    ]
}"#;

fn corridor_pathfinder() -> (Arc<NavMesh>, Pathfinder<NavMesh>) {
    let mesh = Arc::new(NavMesh::from_json(CORRIDOR_MESH).unwrap());
    let config = SearchConfig::from_json(r#"{"max_expansions": 100}"#).unwrap();
    let lookup = Arc::clone(&mesh);
    let pathfinder = Pathfinder::standard(config, move |point| lookup.locate(point));
    (mesh, pathfinder)
}

/// A U-shaped corridor: up, across, down. The path hugs both inner corners.
#[test]
fn u_turn_hugs_inner_corners() {
    let (mesh, pathfinder) = corridor_pathfinder();
    let source = Point::new(2.0, 1.0);
    let destination = Point::new(10.0, 1.0);

    let coarse = pathfinder.find_path(source, destination, &mesh, true).unwrap();
    assert_eq!(coarse.len(), 5);

    let route = pathfinder.find_path(source, destination, &mesh, false).unwrap();
    let Route::Refined(points) = route else {
        panic!("expected a refined route");
    };

    assert_eq!(points.first(), Some(&source));
    assert_eq!(points.last(), Some(&destination));
    assert_eq!(
        points,
        vec![source, Point::new(4.0, 4.0), Point::new(8.0, 4.0), destination]
    );
}

#[test]
fn planning_from_outside_the_mesh_fails() {
    let (mesh, pathfinder) = corridor_pathfinder();
    let outside = Point::new(6.0, 1.0);

    let err = pathfinder
        .find_path(Point::new(2.0, 1.0), outside, &mesh, false)
        .unwrap_err();
    assert_eq!(err, PathError::OutsideNavigation(outside));
    assert!(err.is_recoverable());
}
