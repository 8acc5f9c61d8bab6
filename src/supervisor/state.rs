// Connection State
// The lifecycle states of the single logical session and the closed
// transition table between them

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of the connection. Exactly one instance exists,
/// owned by the supervisor and mutated only inside cooperative tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Idle,
    NetworkAttaching,
    NetworkUp,
    SocketOpening,
    Resolving,
    Connecting,
    Running,
    Disconnected,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::Idle
    }
}

impl ConnectionState {
    /// The documented transition table. Any state may fall to
    /// Disconnected (failure or link loss); recovery re-enters from
    /// Disconnected on the next qualifying status event.
    pub fn can_transition_to(&self, target: ConnectionState) -> bool {
        use ConnectionState::*;
        match (*self, target) {
            (_, Disconnected) => true,
            (Idle, NetworkAttaching) => true,
            (NetworkAttaching, NetworkUp) => true,
            (NetworkUp, SocketOpening) => true,
            (SocketOpening, Resolving) => true,
            // Non-IP datagrams need no address
            (SocketOpening, Running) => true,
            (Resolving, Connecting) => true,
            // Connectionless kinds skip the connect step
            (Resolving, Running) => true,
            (Connecting, Running) => true,
            (Disconnected, NetworkAttaching) => true,
            (Disconnected, NetworkUp) => true,
            _ => false,
        }
    }

    /// States in which a socket may exist.
    pub fn is_session_active(&self) -> bool {
        matches!(
            self,
            Self::SocketOpening | Self::Resolving | Self::Connecting | Self::Running
        )
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::NetworkAttaching => write!(f, "network-attaching"),
            Self::NetworkUp => write!(f, "network-up"),
            Self::SocketOpening => write!(f, "socket-opening"),
            Self::Resolving => write!(f, "resolving"),
            Self::Connecting => write!(f, "connecting"),
            Self::Running => write!(f, "running"),
            Self::Disconnected => write!(f, "disconnected"),
        }
    }
}
