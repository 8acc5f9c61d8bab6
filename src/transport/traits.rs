// Transport Traits and Core Types
// The network interface contract, status notification hand-off and the
// transport error taxonomy shared by every socket kind

use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::TransportScheme;
use crate::runtime::{SchedulerHandle, Task};

// ============================================================================
// STATUS NOTIFICATIONS
// ============================================================================

/// Asynchronous network status notifications. These arrive out-of-band
/// from the network stack and are handed off to the cooperative loop;
/// they are never acted on in the notification context itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetStatus {
    /// The interface started its bring-up sequence.
    Connecting,
    /// A link-local address was assigned. Informational only.
    LocalAddressAssigned,
    /// A global address was assigned; the interface is usable.
    GlobalAddressAssigned,
    /// The cellular modem finished its registration sequence. Some
    /// modems report this before the address events.
    DeviceReady,
    /// The interface lost its link.
    Disconnected,
}

impl NetStatus {
    /// Whether this status qualifies as "the network became usable".
    pub fn is_link_up(&self) -> bool {
        matches!(self, Self::GlobalAddressAssigned | Self::DeviceReady)
    }
}

impl fmt::Display for NetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::LocalAddressAssigned => write!(f, "local address assigned"),
            Self::GlobalAddressAssigned => write!(f, "global address assigned"),
            Self::DeviceReady => write!(f, "device ready"),
            Self::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// Shared link flag. Written from the notification context, polled by
/// the exchange loop between rounds so a dead link is noticed without
/// waiting out a socket timeout.
#[derive(Debug, Clone, Default)]
pub struct LinkState(Arc<AtomicBool>);

impl LinkState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_up(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn set(&self, up: bool) {
        self.0.store(up, Ordering::Release);
    }
}

/// The only thing a status notification is allowed to do: record the
/// link flag and enqueue the event for the cooperative loop.
#[derive(Debug, Clone)]
pub struct StatusListener {
    queue: SchedulerHandle,
    link: LinkState,
}

impl StatusListener {
    pub fn new(queue: SchedulerHandle, link: LinkState) -> Self {
        Self { queue, link }
    }

    /// Safe to call from any context.
    pub fn notify(&self, status: NetStatus) {
        match status {
            NetStatus::GlobalAddressAssigned | NetStatus::DeviceReady => self.link.set(true),
            NetStatus::Disconnected => self.link.set(false),
            _ => {}
        }
        self.queue.post(Task::Status(status));
    }
}

// ============================================================================
// INTERFACE PROFILE
// ============================================================================

/// Address profile of a network interface, logged when a session opens.
#[derive(Debug, Clone, Default)]
pub struct InterfaceProfile {
    pub ip: Option<String>,
    pub netmask: Option<String>,
    pub gateway: Option<String>,
    pub mac: Option<String>,
}

impl fmt::Display for InterfaceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ip={} netmask={} gateway={} mac={}",
            self.ip.as_deref().unwrap_or("(null)"),
            self.netmask.as_deref().unwrap_or("(null)"),
            self.gateway.as_deref().unwrap_or("(null)"),
            self.mac.as_deref().unwrap_or("(null)"),
        )
    }
}

// ============================================================================
// NON-IP DATA PATH
// ============================================================================

/// Datagram link for the cellular non-IP (NIDD) data path. No addresses
/// anywhere; delivery is decided by the network's control plane.
#[derive(Debug)]
pub struct NonIpLink {
    pub(crate) tx: mpsc::Sender<Vec<u8>>,
    pub(crate) rx: mpsc::Receiver<Vec<u8>>,
}

// ============================================================================
// NETWORK INTERFACE
// ============================================================================

/// Contract the supervisor consumes from a network interface. Bring-up
/// is asynchronous: `connect` only kicks it off, and completion arrives
/// through the attached status listener.
#[async_trait]
pub trait NetworkInterface: Send + Sync {
    fn scheme(&self) -> TransportScheme;

    /// Register the listener that receives status notifications.
    fn attach(&self, listener: StatusListener);

    /// Start bring-up. The return value only reflects whether the
    /// request was accepted, not whether the link came up.
    async fn connect(&self) -> Result<(), TransportError>;

    /// Tear the link down. A `Disconnected` status follows.
    async fn disconnect(&self) -> Result<(), TransportError>;

    fn profile(&self) -> InterfaceProfile;

    /// Obtain the non-IP datagram link. Only the cellular interface
    /// carries one.
    async fn open_non_ip(&self) -> Result<NonIpLink, TransportError> {
        Err(TransportError::Unsupported(
            "non-IP datagram link".to_string(),
        ))
    }
}

// ============================================================================
// TRANSPORT ERRORS
// ============================================================================

/// Errors from socket and resolver operations. All of them are
/// non-fatal: the supervisor converts them into a Disconnected
/// transition and waits for the next status event.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("socket open failed: {0}")]
    OpenFailed(String),

    #[error("connect failed: {0}")]
    ConnectFailed(String),

    #[error("DNS lookup for \"{host}\" failed: {reason}")]
    Dns { host: String, reason: String },

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    #[error("operation timed out")]
    Timeout,

    #[error("peer performed an orderly shutdown")]
    PeerClosed,

    #[error("socket is not connected")]
    NotConnected,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("operation not supported: {0}")]
    Unsupported(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::OpenFailed(_) | Self::ConnectFailed(_) | Self::NotConnected | Self::PeerClosed
        )
    }

    pub fn is_resolve_error(&self) -> bool {
        matches!(self, Self::Dns { .. })
    }

    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            Self::SendFailed(_) | Self::ReceiveFailed(_) | Self::Timeout | Self::Io(_)
        )
    }
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
