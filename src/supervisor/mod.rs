// Supervisor module - the connection state machine
// Drives network attach, session open, address resolution, connect and
// the steady-state exchange loop; every failure is a local abandon

mod connection;
mod state;

pub use connection::ConnectionSupervisor;
pub use state::ConnectionState;
