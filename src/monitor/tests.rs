use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;

use super::{HeartbeatMonitor, SweepSummary};
use crate::broker::MemoryBroker;
use crate::concept::{ConceptContext, ConnectionEvent, LoadBalanceConcept};
use crate::connection::{ConnectionTransport, ConnectionType};
use crate::message::Frame;
use crate::server::ServerIdentity;
use crate::testing::{BrokenTransport, Recorded, RecordingTransport};
use crate::utils::error::TransportError;

fn concept() -> Arc<LoadBalanceConcept> {
    let identity = ServerIdentity::new(Some("chat".to_string()), Some("X".to_string()));
    LoadBalanceConcept::new(ConceptContext::new(identity, Arc::new(MemoryBroker::new())))
}

fn open(concept: &LoadBalanceConcept, heartbeat: i64) -> (String, RecordingTransport) {
    let transport = RecordingTransport::new();
    let connection = concept.on_open(
        Box::new(transport.clone()),
        ConnectionType::Client,
        IndexMap::new(),
    );
    connection.touch_at(heartbeat);
    (connection.id().to_string(), transport)
}

#[test]
fn test_stale_connection_closed_on_first_tick_past_timeout() {
    let concept = concept();
    let monitor = HeartbeatMonitor::new(
        concept.clone(),
        Duration::from_secs(10),
        Duration::from_secs(30),
    )
    .with_ping(false);
    let (c1, transport) = open(&concept, 0);

    for tick in 1..=3 {
        let summary = monitor.sweep_at(tick * 10_000);
        assert_eq!(summary.closed, 0, "closed too early at tick {tick}");
        assert!(concept.registry().contains(&c1));
    }

    let summary = monitor.sweep_at(40_000);
    assert_eq!(
        summary,
        SweepSummary {
            total: 1,
            alive: 0,
            closed: 1
        }
    );
    assert!(!concept.registry().contains(&c1));
    assert_eq!(
        transport.recorded(),
        vec![Recorded::Close(1001, "heartbeat timeout".to_string())]
    );
}

#[test]
fn test_fresh_connections_survive_and_get_pinged() {
    let concept = concept();
    let monitor = HeartbeatMonitor::new(
        concept.clone(),
        Duration::from_secs(10),
        Duration::from_secs(30),
    )
    .with_logger(false);
    let (stale, _) = open(&concept, 0);
    let (fresh, fresh_transport) = open(&concept, 35_000);

    let summary = monitor.sweep_at(40_000);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.alive, 1);
    assert_eq!(summary.closed, 1);
    assert!(!concept.registry().contains(&stale));
    assert!(concept.registry().contains(&fresh));
    assert_eq!(fresh_transport.recorded(), vec![Recorded::Ping(vec![])]);
}

#[test]
fn test_timeout_notifies_listeners() {
    let concept = concept();
    let closed = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = closed.clone();
    concept.add_listener(move |_: &LoadBalanceConcept, event: &ConnectionEvent| {
        if let ConnectionEvent::Closed { reason, .. } = event {
            sink.lock().push(reason.clone());
        }
    });
    let monitor = HeartbeatMonitor::new(
        concept.clone(),
        Duration::from_secs(10),
        Duration::from_secs(30),
    );
    open(&concept, 0);

    monitor.sweep_at(31_000);
    monitor.sweep_at(41_000);
    assert_eq!(closed.lock().as_slice(), &["heartbeat timeout".to_string()]);
}

#[test]
fn test_dead_but_registered_connection_is_reclaimed() {
    let concept = concept();
    let monitor = HeartbeatMonitor::new(
        concept.clone(),
        Duration::from_secs(10),
        Duration::from_secs(30),
    );
    let (c1, _) = open(&concept, 0);
    concept.registry().get(&c1).unwrap().close();

    let summary = monitor.sweep_at(1_000);
    assert_eq!(summary.closed, 1);
    assert!(concept.registry().is_empty());
}

#[test]
fn test_transport_without_ping_support_survives() {
    let concept = concept();
    let monitor = HeartbeatMonitor::new(
        concept.clone(),
        Duration::from_secs(10),
        Duration::from_secs(30),
    );
    let connection = concept.on_open(
        Box::new(BrokenTransport),
        ConnectionType::Client,
        IndexMap::new(),
    );
    connection.touch_at(1_000);

    // BrokenTransport keeps the default no-op ping, so the connection survives
    let summary = monitor.sweep_at(2_000);
    assert_eq!(summary.alive, 1);
    assert!(concept.registry().contains(connection.id()));
}

#[test]
fn test_failed_ping_force_closes() {
    struct DeadSocket;
    impl ConnectionTransport for DeadSocket {
        fn transmit(&mut self, _frame: Frame) -> Result<(), TransportError> {
            Err(TransportError::ChannelClosed)
        }
        fn ping(&mut self, _payload: &[u8]) -> Result<(), TransportError> {
            Err(TransportError::ChannelClosed)
        }
        fn close(&mut self, _code: u16, _reason: &str) -> Result<(), TransportError> {
            Err(TransportError::ChannelClosed)
        }
    }

    let concept = concept();
    let monitor = HeartbeatMonitor::new(
        concept.clone(),
        Duration::from_secs(10),
        Duration::from_secs(30),
    );
    let connection = concept.on_open(Box::new(DeadSocket), ConnectionType::Client, IndexMap::new());
    connection.touch_at(1_000);

    let summary = monitor.sweep_at(2_000);
    assert_eq!(summary.closed, 1);
    assert_eq!(summary.alive, 0);
    assert!(!connection.is_alive());
    assert!(concept.registry().is_empty());
}

#[tokio::test]
async fn test_spawned_monitor_reclaims_stale_connections() {
    let concept = concept();
    let (c1, _) = open(&concept, 0);

    let handle = HeartbeatMonitor::new(
        concept.clone(),
        Duration::from_millis(20),
        Duration::from_millis(10),
    )
    .spawn();

    tokio::time::sleep(Duration::from_millis(200)).await;
    handle.abort();

    assert!(!concept.registry().contains(&c1));
}

#[tokio::test]
async fn test_spawned_sweep_runs_off_the_runtime_thread() {
    let concept = concept();
    let runtime_thread = std::thread::current().id();
    let closing_threads = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = closing_threads.clone();
    concept.add_listener(move |_: &LoadBalanceConcept, event: &ConnectionEvent| {
        if let ConnectionEvent::Closed { .. } = event {
            sink.lock().push(std::thread::current().id());
        }
    });
    let (c1, _) = open(&concept, 0);

    let handle = HeartbeatMonitor::new(
        concept.clone(),
        Duration::from_millis(20),
        Duration::from_millis(10),
    )
    .spawn();

    for _ in 0..50 {
        if !closing_threads.lock().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    handle.abort();

    assert!(!concept.registry().contains(&c1));
    let threads = closing_threads.lock();
    assert_eq!(threads.len(), 1);
    assert_ne!(threads[0], runtime_thread);
}
