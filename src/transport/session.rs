// Transport Session
// One socket of the configured kind behind a uniform send/receive
// contract. Stream sockets use the connected peer implicitly, datagram
// sockets carry explicit addresses, non-IP datagrams carry none.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio::time::timeout;
use tracing::{debug, info};

use crate::config::{EndpointConfig, SocketKind};

use super::traits::{NetworkInterface, NonIpLink, TransportError};

/// Receive buffer for one frame. 1 K covers every LightControl case.
pub const RECEIVE_BUFFER_SIZE: usize = 1024;

// ============================================================================
// SESSION ID
// ============================================================================

/// Identifier correlating one session's log lines across its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId([u8; 8]);

impl SessionId {
    pub fn generate() -> Self {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let mut bytes = [0u8; 8];
        rng.fill(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

// ============================================================================
// TRANSPORT SESSION
// ============================================================================

enum SessionSocket {
    /// Connection-oriented stream. `None` until `connect` succeeds.
    Stream { stream: Option<TcpStream> },
    /// Connectionless datagram bound to an unspecified local address.
    Datagram { socket: UdpSocket },
    /// Cellular non-IP datagram link.
    NonIp { link: NonIpLink },
}

/// One open socket. At most one session exists at a time; the owner
/// must fully close a session before opening the next.
pub struct TransportSession {
    id: SessionId,
    kind: SocketKind,
    timeout: Duration,
    socket: SessionSocket,
}

impl TransportSession {
    /// Open a socket of the configured kind against the interface. No
    /// connection is established yet for stream kinds.
    pub async fn open(
        config: &EndpointConfig,
        iface: &dyn NetworkInterface,
    ) -> Result<Self, TransportError> {
        let socket = match config.kind() {
            SocketKind::Tcp => SessionSocket::Stream { stream: None },
            SocketKind::Udp => {
                let socket = UdpSocket::bind(("0.0.0.0", 0))
                    .await
                    .map_err(|e| TransportError::OpenFailed(e.to_string()))?;
                SessionSocket::Datagram { socket }
            }
            SocketKind::CellularNonIp => {
                let link = iface.open_non_ip().await?;
                SessionSocket::NonIp { link }
            }
        };

        let session = Self {
            id: SessionId::generate(),
            kind: config.kind(),
            timeout: config.socket_timeout(),
            socket,
        };
        debug!(session = %session.id, kind = %session.kind, "socket opened");
        Ok(session)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn kind(&self) -> SocketKind {
        self.kind
    }

    /// Whether the session can carry traffic without further setup.
    pub fn is_connected(&self) -> bool {
        match &self.socket {
            SessionSocket::Stream { stream } => stream.is_some(),
            SessionSocket::Datagram { .. } | SessionSocket::NonIp { .. } => true,
        }
    }

    /// Establish the stream connection. Stream kind only.
    pub async fn connect(&mut self, addr: SocketAddr) -> Result<(), TransportError> {
        match &mut self.socket {
            SessionSocket::Stream { stream } => {
                let connected = timeout(self.timeout, TcpStream::connect(addr))
                    .await
                    .map_err(|_| TransportError::Timeout)?
                    .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;
                *stream = Some(connected);
                info!(session = %self.id, peer = %addr, "connected");
                Ok(())
            }
            _ => Err(TransportError::Unsupported(format!(
                "connect on {} socket",
                self.kind
            ))),
        }
    }

    /// Send one frame. Datagram kind requires the destination address;
    /// the other kinds ignore it.
    pub async fn send(
        &mut self,
        payload: &[u8],
        dest: Option<SocketAddr>,
    ) -> Result<(), TransportError> {
        match &mut self.socket {
            SessionSocket::Stream { stream } => {
                let stream = stream.as_mut().ok_or(TransportError::NotConnected)?;
                timeout(self.timeout, stream.write_all(payload))
                    .await
                    .map_err(|_| TransportError::Timeout)?
                    .map_err(|e| TransportError::SendFailed(e.to_string()))?;
            }
            SessionSocket::Datagram { socket } => {
                let dest = dest.ok_or_else(|| {
                    TransportError::InvalidAddress(
                        "datagram send requires a destination".to_string(),
                    )
                })?;
                timeout(self.timeout, socket.send_to(payload, dest))
                    .await
                    .map_err(|_| TransportError::Timeout)?
                    .map_err(|e| TransportError::SendFailed(e.to_string()))?;
            }
            SessionSocket::NonIp { link } => {
                timeout(self.timeout, link.tx.send(payload.to_vec()))
                    .await
                    .map_err(|_| TransportError::Timeout)?
                    .map_err(|_| TransportError::SendFailed("non-IP link closed".to_string()))?;
            }
        }
        Ok(())
    }

    /// Receive one frame into `buf`. Returns the frame length and, for
    /// datagram sockets, the sender's address.
    pub async fn receive(
        &mut self,
        buf: &mut [u8],
    ) -> Result<(usize, Option<SocketAddr>), TransportError> {
        match &mut self.socket {
            SessionSocket::Stream { stream } => {
                let stream = stream.as_mut().ok_or(TransportError::NotConnected)?;
                let len = timeout(self.timeout, stream.read(buf))
                    .await
                    .map_err(|_| TransportError::Timeout)?
                    .map_err(|e| TransportError::ReceiveFailed(e.to_string()))?;
                if len == 0 {
                    return Err(TransportError::PeerClosed);
                }
                Ok((len, None))
            }
            SessionSocket::Datagram { socket } => {
                let (len, from) = timeout(self.timeout, socket.recv_from(buf))
                    .await
                    .map_err(|_| TransportError::Timeout)?
                    .map_err(|e| TransportError::ReceiveFailed(e.to_string()))?;
                Ok((len, Some(from)))
            }
            SessionSocket::NonIp { link } => {
                let frame = timeout(self.timeout, link.rx.recv())
                    .await
                    .map_err(|_| TransportError::Timeout)?
                    .ok_or(TransportError::PeerClosed)?;
                let len = frame.len().min(buf.len());
                buf[..len].copy_from_slice(&frame[..len]);
                Ok((len, None))
            }
        }
    }

    /// Close the socket. Consumes the session; the underlying resources
    /// are released on drop.
    pub fn close(self) {
        debug!(session = %self.id, "socket closed");
    }
}
