// Connection Supervisor Tests
// The state machine driven through its public task interface: attach,
// link-up, session open, the exchange loop, and abandon-on-failure

use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::sleep;

use lightlink::config::{ConfigError, EndpointConfig, SocketKind, TransportScheme};
use lightlink::runtime::{Actuator, RuntimeContext, Task};
use lightlink::supervisor::{ConnectionState, ConnectionSupervisor};
use lightlink::transport::{
    InterfaceProfile, NetStatus, NetworkInterface, StatusListener, TransportError,
};

// ============================================================================
// TEST DOUBLES
// ============================================================================

/// Interface whose status events are raised by the test itself.
#[derive(Default)]
struct ManualInterface {
    listener: Mutex<Option<StatusListener>>,
}

impl ManualInterface {
    fn listener(&self) -> StatusListener {
        self.listener
            .lock()
            .unwrap()
            .clone()
            .expect("status listener attached")
    }
}

#[async_trait]
impl NetworkInterface for ManualInterface {
    fn scheme(&self) -> TransportScheme {
        TransportScheme::Ethernet
    }

    fn attach(&self, listener: StatusListener) {
        *self.listener.lock().unwrap() = Some(listener);
    }

    async fn connect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    fn profile(&self) -> InterfaceProfile {
        InterfaceProfile::default()
    }
}

/// Actuator recording every command it receives.
struct CountingLed {
    applied: Arc<Mutex<Vec<bool>>>,
}

impl Actuator for CountingLed {
    fn apply(&self, on: bool) {
        self.applied.lock().unwrap().push(on);
    }
}

async fn spawn_udp_echo() -> SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();
    tokio::spawn(async move {
        let mut buf = [0u8; 1024];
        while let Ok((len, from)) = socket.recv_from(&mut buf).await {
            let _ = socket.send_to(&buf[..len], from).await;
        }
    });
    addr
}

fn supervisor_for(
    port: u16,
    timeout: Duration,
) -> (
    ConnectionSupervisor,
    Arc<ManualInterface>,
    Arc<Mutex<Vec<bool>>>,
) {
    let config = EndpointConfig::new("127.0.0.1", port, TransportScheme::Ethernet, SocketKind::Udp)
        .with_socket_timeout(timeout)
        .with_pacing(Duration::from_millis(20));
    let iface = Arc::new(ManualInterface::default());
    let applied = Arc::new(Mutex::new(Vec::new()));
    let ctx = Arc::new(RuntimeContext::new(Box::new(CountingLed {
        applied: applied.clone(),
    })));
    let supervisor = ConnectionSupervisor::new(config, iface.clone(), ctx).unwrap();
    (supervisor, iface, applied)
}

// ============================================================================
// TRANSITION TABLE
// ============================================================================

#[test]
fn test_transition_table_accepts_the_documented_path() {
    use ConnectionState::*;
    assert!(Idle.can_transition_to(NetworkAttaching));
    assert!(NetworkAttaching.can_transition_to(NetworkUp));
    assert!(NetworkUp.can_transition_to(SocketOpening));
    assert!(SocketOpening.can_transition_to(Resolving));
    assert!(SocketOpening.can_transition_to(Running));
    assert!(Resolving.can_transition_to(Connecting));
    assert!(Resolving.can_transition_to(Running));
    assert!(Connecting.can_transition_to(Running));
    assert!(Running.can_transition_to(Disconnected));
    assert!(Disconnected.can_transition_to(NetworkAttaching));
    assert!(Disconnected.can_transition_to(NetworkUp));
}

#[test]
fn test_transition_table_rejects_skips() {
    use ConnectionState::*;
    assert!(!Idle.can_transition_to(NetworkUp));
    assert!(!Idle.can_transition_to(Running));
    assert!(!NetworkAttaching.can_transition_to(SocketOpening));
    assert!(!NetworkUp.can_transition_to(Running));
    assert!(!Disconnected.can_transition_to(Running));
    assert!(!Running.can_transition_to(Connecting));
}

#[test]
fn test_any_state_may_fall_to_disconnected() {
    use ConnectionState::*;
    for state in [
        Idle,
        NetworkAttaching,
        NetworkUp,
        SocketOpening,
        Resolving,
        Connecting,
        Running,
    ] {
        assert!(state.can_transition_to(Disconnected));
    }
}

// ============================================================================
// CONFIGURATION GATE
// ============================================================================

#[test]
fn test_invalid_pairing_refuses_to_construct() {
    let config = EndpointConfig::new(
        "127.0.0.1",
        7,
        TransportScheme::Ethernet,
        SocketKind::CellularNonIp,
    );
    let iface = Arc::new(ManualInterface::default());
    let ctx = Arc::new(RuntimeContext::new(Box::new(CountingLed {
        applied: Arc::new(Mutex::new(Vec::new())),
    })));

    let err = match ConnectionSupervisor::new(config, iface, ctx) {
        Ok(_) => panic!("expected the pairing to be rejected"),
        Err(e) => e,
    };
    assert!(matches!(err, ConfigError::IncompatibleSocket { .. }));
}

// ============================================================================
// STATUS HANDLING
// ============================================================================

#[tokio::test]
async fn test_local_address_event_does_not_transition() {
    let (mut sup, iface, _) = supervisor_for(9, Duration::from_millis(500));
    sup.setup().await;
    assert_eq!(sup.state(), ConnectionState::NetworkAttaching);

    iface.listener().notify(NetStatus::LocalAddressAssigned);
    sup.step().await;
    assert_eq!(sup.state(), ConnectionState::NetworkAttaching);
}

#[tokio::test]
async fn test_device_ready_qualifies_as_link_up() {
    let (mut sup, iface, _) = supervisor_for(9, Duration::from_millis(500));
    sup.setup().await;

    iface.listener().notify(NetStatus::DeviceReady);
    sup.step().await;
    assert_eq!(sup.state(), ConnectionState::NetworkUp);
}

#[tokio::test]
async fn test_duplicate_link_up_events_are_idempotent() {
    let (mut sup, iface, _) = supervisor_for(9, Duration::from_millis(500));
    sup.setup().await;

    let listener = iface.listener();
    listener.notify(NetStatus::GlobalAddressAssigned);
    listener.notify(NetStatus::GlobalAddressAssigned);

    sup.step().await;
    assert_eq!(sup.state(), ConnectionState::NetworkUp);
    sup.step().await;
    assert_eq!(sup.state(), ConnectionState::NetworkUp);
}

// ============================================================================
// LIFECYCLE
// ============================================================================

#[tokio::test]
async fn test_reconnect_cycle_with_single_session() {
    let server = spawn_udp_echo().await;
    let (mut sup, iface, applied) = supervisor_for(server.port(), Duration::from_millis(500));

    assert_eq!(sup.state(), ConnectionState::Idle);
    assert!(!sup.has_session());

    sup.setup().await;
    assert_eq!(sup.state(), ConnectionState::NetworkAttaching);

    let listener = iface.listener();
    listener.notify(NetStatus::GlobalAddressAssigned);
    sup.step().await;
    assert_eq!(sup.state(), ConnectionState::NetworkUp);

    // Drop the link while the exchange loop is running.
    let dropper = listener.clone();
    tokio::spawn(async move {
        sleep(Duration::from_millis(200)).await;
        dropper.notify(NetStatus::Disconnected);
    });

    // Runs open -> resolve -> running -> abandon, all in one task.
    sup.step().await;
    assert_eq!(sup.state(), ConnectionState::Disconnected);
    assert!(!sup.has_session());
    assert!(sup.resolved_address().is_none());

    let first_cycle = applied.lock().unwrap().len();
    assert!(first_cycle >= 1, "exchange loop never drove the actuator");

    // The queued Disconnected status finds us already abandoned.
    sup.step().await;
    assert_eq!(sup.state(), ConnectionState::Disconnected);

    // Next qualifying event restarts from the top.
    listener.notify(NetStatus::GlobalAddressAssigned);
    sup.step().await;
    assert_eq!(sup.state(), ConnectionState::NetworkUp);

    let dropper = listener.clone();
    tokio::spawn(async move {
        sleep(Duration::from_millis(200)).await;
        dropper.notify(NetStatus::Disconnected);
    });

    sup.step().await;
    assert_eq!(sup.state(), ConnectionState::Disconnected);
    assert!(!sup.has_session());
    assert!(applied.lock().unwrap().len() > first_cycle);
}

#[tokio::test]
async fn test_receive_timeout_causes_exactly_one_disconnect() {
    // A bound socket that never answers.
    let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let peer = silent.local_addr().unwrap();

    let (mut sup, iface, applied) = supervisor_for(peer.port(), Duration::from_millis(150));

    sup.setup().await;
    iface.listener().notify(NetStatus::GlobalAddressAssigned);
    sup.step().await;
    assert_eq!(sup.state(), ConnectionState::NetworkUp);

    // Open task: send succeeds, receive times out, session abandons.
    sup.step().await;
    assert_eq!(sup.state(), ConnectionState::Disconnected);
    assert!(!sup.has_session());
    assert!(applied.lock().unwrap().is_empty());

    drop(silent);
}

#[tokio::test]
async fn test_shutdown_task_leaves_the_dispatch_loop() {
    let (mut sup, _iface, _) = supervisor_for(9, Duration::from_millis(500));
    sup.setup().await;

    sup.scheduler().post(Task::Shutdown);
    sup.run().await;

    assert_eq!(sup.state(), ConnectionState::Disconnected);
    assert!(!sup.has_session());
}
