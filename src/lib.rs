// lightlink - LightControl echo sessions over interchangeable transports
//
// A supervised client that brings up a network interface (cellular or
// Ethernet), opens one socket of a configured kind (TCP stream, UDP
// datagram, cellular non-IP datagram), and exchanges LightControl frames
// with an echo endpoint to drive a binary actuator.

pub mod config;
pub mod protocol;
pub mod runtime;
pub mod supervisor;
pub mod transport;
