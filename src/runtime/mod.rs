// Runtime module - cooperative scheduling and process-wide shared state
// One task queue, one consumer; notification contexts only enqueue

mod actuator;
mod context;
mod scheduler;

pub use actuator::{Actuator, SimulatedLed};
pub use context::RuntimeContext;
pub use scheduler::{EventScheduler, SchedulerHandle, Task};
