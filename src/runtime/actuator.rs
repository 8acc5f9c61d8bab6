// Actuator sink
// The binary output driven by fully parsed light commands

use tracing::info;

/// A binary actuator. Invoked only after a complete, successful parse of
/// a frame addressed to the local group.
pub trait Actuator: Send + Sync {
    fn apply(&self, on: bool);
}

/// LED stand-in that reports state changes through the diagnostic sink.
#[derive(Debug, Default)]
pub struct SimulatedLed;

impl Actuator for SimulatedLed {
    fn apply(&self, on: bool) {
        info!(led = if on { "ON" } else { "OFF" }, "actuator applied");
    }
}
