// Configuration module - endpoint and transport selection
// Validates the scheme/socket pairing before any network activity

mod endpoint;

pub use endpoint::{
    // Transport selection
    TransportScheme, SocketKind,
    // Endpoint configuration
    EndpointConfig,
    // Errors
    ConfigError,
    // Constants
    DEFAULT_LIGHT_CONTROL_GROUP, MASTER_LIGHT_CONTROL_GROUP,
    DEFAULT_EXCHANGE_PACING, DEFAULT_SOCKET_TIMEOUT, MAX_LIGHT_CONTROL_GROUP,
};
