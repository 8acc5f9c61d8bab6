// Endpoint Configuration
// Transport scheme and socket kind selection, and the closed compatibility
// relation between them, checked once before any network activity

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Blocking socket timeout applied to every send/receive/connect call.
/// One minute of failing to exchange packets with the echo server is
/// enough to conclude the socket is wedged.
pub const DEFAULT_SOCKET_TIMEOUT: Duration = Duration::from_millis(60_000);

/// Delay between exchange rounds. Keeps the blink observable; zero
/// disables pacing and lets the round-trip set the cadence.
pub const DEFAULT_EXCHANGE_PACING: Duration = Duration::from_secs(1);

/// Group addressed by messages that command every light.
pub const MASTER_LIGHT_CONTROL_GROUP: u16 = 0;

/// Group this node answers to unless configured otherwise.
pub const DEFAULT_LIGHT_CONTROL_GROUP: u16 = 1;

/// Largest group id representable in the three-digit wire field.
pub const MAX_LIGHT_CONTROL_GROUP: u16 = 999;

// ============================================================================
// TRANSPORT SCHEME
// ============================================================================

/// Physical/network layer carrying the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum TransportScheme {
    /// LTE Cat M1 packet data.
    #[value(name = "cellular")]
    Cellular4gLte,
    /// Host Ethernet stack.
    #[value(name = "ethernet")]
    Ethernet,
    /// 6LoWPAN neighbor-discovery mesh. Declared for future use.
    #[value(name = "mesh-6lowpan-nd")]
    Mesh6LowpanNd,
    /// Wi-SUN mode 4 mesh. Declared for future use.
    #[value(name = "mesh-wisun-mode4")]
    MeshWisunMode4,
}

impl TransportScheme {
    /// Whether an interface implementation exists for this scheme.
    /// The mesh schemes are deliberately unimplemented.
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Cellular4gLte | Self::Ethernet)
    }

    /// The closed compatibility relation between schemes and socket kinds.
    pub fn supports(&self, kind: SocketKind) -> bool {
        match self {
            Self::Cellular4gLte => true,
            Self::Ethernet => matches!(kind, SocketKind::Tcp | SocketKind::Udp),
            Self::Mesh6LowpanNd | Self::MeshWisunMode4 => matches!(kind, SocketKind::Udp),
        }
    }
}

impl fmt::Display for TransportScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cellular4gLte => write!(f, "cellular"),
            Self::Ethernet => write!(f, "ethernet"),
            Self::Mesh6LowpanNd => write!(f, "mesh-6lowpan-nd"),
            Self::MeshWisunMode4 => write!(f, "mesh-wisun-mode4"),
        }
    }
}

// ============================================================================
// SOCKET KIND
// ============================================================================

/// Transport-layer delivery semantics for the session socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum SocketKind {
    /// Connection-oriented stream.
    #[value(name = "tcp")]
    Tcp,
    /// Connectionless datagram.
    #[value(name = "udp")]
    Udp,
    /// 3GPP non-IP datagram (NIDD) over the cellular CIoT data path.
    #[value(name = "cellular-non-ip")]
    CellularNonIp,
}

impl SocketKind {
    /// Stream sockets need an explicit connect step.
    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Tcp)
    }

    /// Non-IP datagrams carry no addresses anywhere; everything else
    /// needs the endpoint resolved first.
    pub fn uses_addresses(&self) -> bool {
        !matches!(self, Self::CellularNonIp)
    }
}

impl fmt::Display for SocketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Udp => write!(f, "udp"),
            Self::CellularNonIp => write!(f, "cellular-non-ip"),
        }
    }
}

// ============================================================================
// CONFIG ERRORS
// ============================================================================

/// Configuration errors. These are the only fatal errors in the system:
/// they are raised before any socket exists and must refuse startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("socket kind \"{kind}\" is not valid over \"{scheme}\"")]
    IncompatibleSocket {
        scheme: TransportScheme,
        kind: SocketKind,
    },

    #[error("transport scheme \"{0}\" is declared but not implemented")]
    SchemeUnavailable(TransportScheme),

    #[error("light control group {0} is out of range (0-999)")]
    GroupOutOfRange(u16),

    #[error("echo server host must not be empty")]
    EmptyHost,
}

// ============================================================================
// ENDPOINT CONFIG
// ============================================================================

/// Everything needed to reach the echo endpoint. Built once at startup,
/// validated before any network activity, then treated as immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    host: String,
    port: u16,
    scheme: TransportScheme,
    kind: SocketKind,
    group: u16,
    socket_timeout: Duration,
    pacing: Duration,
}

impl EndpointConfig {
    pub fn new(host: &str, port: u16, scheme: TransportScheme, kind: SocketKind) -> Self {
        Self {
            host: host.to_string(),
            port,
            scheme,
            kind,
            group: DEFAULT_LIGHT_CONTROL_GROUP,
            socket_timeout: DEFAULT_SOCKET_TIMEOUT,
            pacing: DEFAULT_EXCHANGE_PACING,
        }
    }

    pub fn with_group(mut self, group: u16) -> Self {
        self.group = group;
        self
    }

    pub fn with_socket_timeout(mut self, timeout: Duration) -> Self {
        self.socket_timeout = timeout;
        self
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn scheme(&self) -> TransportScheme {
        self.scheme
    }

    pub fn kind(&self) -> SocketKind {
        self.kind
    }

    pub fn group(&self) -> u16 {
        self.group
    }

    pub fn socket_timeout(&self) -> Duration {
        self.socket_timeout
    }

    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    /// Validate the configuration. Invalid scheme/socket combinations are
    /// rejected here, before any socket is created.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.group > MAX_LIGHT_CONTROL_GROUP {
            return Err(ConfigError::GroupOutOfRange(self.group));
        }
        if !self.scheme.supports(self.kind) {
            return Err(ConfigError::IncompatibleSocket {
                scheme: self.scheme,
                kind: self.kind,
            });
        }
        if !self.scheme.is_available() {
            return Err(ConfigError::SchemeUnavailable(self.scheme));
        }
        Ok(())
    }
}
