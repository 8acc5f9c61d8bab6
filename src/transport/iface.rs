// Network Interface Implementations
// Ethernet rides the host stack and reports link-up immediately. The
// cellular interface models the modem registration sequence and carries
// the non-IP (NIDD) data path, the network end of which echoes frames
// back the way the carrier's CIoT test service does.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::TransportScheme;

use super::traits::{
    InterfaceProfile, NetStatus, NetworkInterface, NonIpLink, StatusListener, TransportError,
};

/// Modeled delay between the steps of the cellular registration
/// sequence.
const REGISTRATION_STEP: Duration = Duration::from_millis(50);

/// Queue depth of the non-IP data path.
const NON_IP_QUEUE_DEPTH: usize = 32;

fn spawn_status_sequence(listener: StatusListener, sequence: &'static [NetStatus], step: Duration) {
    tokio::spawn(async move {
        for status in sequence {
            if !step.is_zero() {
                sleep(step).await;
            }
            listener.notify(*status);
        }
    });
}

// ============================================================================
// ETHERNET
// ============================================================================

/// Host Ethernet. The link is already up when the process starts, so
/// bring-up reduces to reporting the address events.
#[derive(Debug, Default)]
pub struct EthernetInterface {
    listener: Mutex<Option<StatusListener>>,
}

impl EthernetInterface {
    pub fn new() -> Self {
        Self::default()
    }

    fn listener(&self) -> Option<StatusListener> {
        self.listener.lock().unwrap().clone()
    }
}

#[async_trait]
impl NetworkInterface for EthernetInterface {
    fn scheme(&self) -> TransportScheme {
        TransportScheme::Ethernet
    }

    fn attach(&self, listener: StatusListener) {
        *self.listener.lock().unwrap() = Some(listener);
    }

    async fn connect(&self) -> Result<(), TransportError> {
        let Some(listener) = self.listener() else {
            warn!("ethernet bring-up requested with no status listener attached");
            return Ok(());
        };
        debug!("ethernet bring-up");
        spawn_status_sequence(
            listener,
            &[
                NetStatus::LocalAddressAssigned,
                NetStatus::GlobalAddressAssigned,
            ],
            Duration::from_millis(10),
        );
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        if let Some(listener) = self.listener() {
            listener.notify(NetStatus::Disconnected);
        }
        Ok(())
    }

    fn profile(&self) -> InterfaceProfile {
        InterfaceProfile {
            ip: host_source_ip(),
            ..InterfaceProfile::default()
        }
    }
}

/// Source address the host would use for outbound traffic. A connected
/// UDP socket makes the routing decision without sending anything.
fn host_source_ip() -> Option<String> {
    let socket = std::net::UdpSocket::bind(("0.0.0.0", 0)).ok()?;
    socket.connect(("8.8.8.8", 53)).ok()?;
    Some(socket.local_addr().ok()?.ip().to_string())
}

// ============================================================================
// CELLULAR
// ============================================================================

/// Cellular bearer parameters. SIM PIN and PLMN handling live in the
/// modem bring-up layer; only what the session layer needs is kept here.
#[derive(Debug, Clone)]
pub struct CellularConfig {
    apn: String,
    plmn: Option<String>,
}

impl CellularConfig {
    pub fn new(apn: &str) -> Self {
        Self {
            apn: apn.to_string(),
            plmn: None,
        }
    }

    pub fn with_plmn(mut self, plmn: &str) -> Self {
        self.plmn = Some(plmn.to_string());
        self
    }

    pub fn apn(&self) -> &str {
        &self.apn
    }

    pub fn plmn(&self) -> Option<&str> {
        self.plmn.as_deref()
    }
}

/// LTE Cat M1 packet data interface. Registration is modeled as the
/// status sequence a modem reports: connecting, device ready, then the
/// address assignments once the PDP context is active.
#[derive(Debug)]
pub struct CellularInterface {
    config: CellularConfig,
    listener: Mutex<Option<StatusListener>>,
}

impl CellularInterface {
    pub fn new(config: CellularConfig) -> Self {
        Self {
            config,
            listener: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &CellularConfig {
        &self.config
    }

    fn listener(&self) -> Option<StatusListener> {
        self.listener.lock().unwrap().clone()
    }
}

#[async_trait]
impl NetworkInterface for CellularInterface {
    fn scheme(&self) -> TransportScheme {
        TransportScheme::Cellular4gLte
    }

    fn attach(&self, listener: StatusListener) {
        *self.listener.lock().unwrap() = Some(listener);
    }

    async fn connect(&self) -> Result<(), TransportError> {
        let Some(listener) = self.listener() else {
            warn!("cellular bring-up requested with no status listener attached");
            return Ok(());
        };
        debug!(apn = self.config.apn(), "cellular registration started");
        spawn_status_sequence(
            listener,
            &[
                NetStatus::Connecting,
                NetStatus::DeviceReady,
                NetStatus::LocalAddressAssigned,
                NetStatus::GlobalAddressAssigned,
            ],
            REGISTRATION_STEP,
        );
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        if let Some(listener) = self.listener() {
            listener.notify(NetStatus::Disconnected);
        }
        Ok(())
    }

    fn profile(&self) -> InterfaceProfile {
        // The bearer assigns no host-visible addresses for non-IP
        // contexts; for IP contexts the host stack carries the traffic.
        InterfaceProfile {
            ip: host_source_ip(),
            ..InterfaceProfile::default()
        }
    }

    async fn open_non_ip(&self) -> Result<NonIpLink, TransportError> {
        let (up_tx, mut up_rx) = mpsc::channel::<Vec<u8>>(NON_IP_QUEUE_DEPTH);
        let (down_tx, down_rx) = mpsc::channel::<Vec<u8>>(NON_IP_QUEUE_DEPTH);

        // Network end of the NIDD path: the carrier's echo service.
        tokio::spawn(async move {
            while let Some(frame) = up_rx.recv().await {
                if down_tx.send(frame).await.is_err() {
                    break;
                }
            }
        });

        debug!(apn = self.config.apn(), "non-IP datagram link established");
        Ok(NonIpLink {
            tx: up_tx,
            rx: down_rx,
        })
    }
}
