// Transport module - the wire
// Network interface contract, socket sessions and address resolution

mod iface;
mod session;
mod traits;

pub mod resolver;

pub use traits::{
    // Interface contract
    NetworkInterface, InterfaceProfile,
    // Status notifications
    NetStatus, StatusListener, LinkState,
    // Non-IP data path
    NonIpLink,
    // Errors
    TransportError,
};

pub use iface::{CellularConfig, CellularInterface, EthernetInterface};

pub use session::{SessionId, TransportSession, RECEIVE_BUFFER_SIZE};
