// Runtime Context
// Process-wide shared state: created once at startup, handed out by
// shared ownership, torn down once, never reassigned.

use std::sync::Mutex;

use super::Actuator;

/// Shared state the supervisor and the actuator side-effect both touch.
/// The advertised light value is the state this node reports in outgoing
/// frames; the actuator is only driven by received commands.
pub struct RuntimeContext {
    actuator: Box<dyn Actuator>,
    light_state: Mutex<bool>,
}

impl RuntimeContext {
    /// The board boots with the light off.
    pub fn new(actuator: Box<dyn Actuator>) -> Self {
        Self {
            actuator,
            light_state: Mutex::new(false),
        }
    }

    pub fn light_state(&self) -> bool {
        *self.light_state.lock().unwrap()
    }

    /// Flip the advertised state and return the new value. The blink is
    /// carried by the protocol: each round advertises the toggled state
    /// and the echoed command drives the actuator.
    pub fn toggle_light(&self) -> bool {
        let mut state = self.light_state.lock().unwrap();
        *state = !*state;
        *state
    }

    /// Drive the actuator with a fully parsed command.
    pub fn apply_light(&self, on: bool) {
        self.actuator.apply(on);
    }
}
