//! Firmware-level wiring types: the bundles passed between tasks over
//! `embassy_sync` channels. Pure `flight_core` types (samples, FSM state,
//! actuator commands) are reused directly wherever one value is enough;
//! these exist only where a task needs more than one of them bundled
//! together for a single channel send.

use flight_core::actuator::ActuatorCommand;
use flight_core::fsm::FlightState;

/// What the FSM task publishes each tick for the actuator retain task,
/// the logger and the debug line to consume.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FsmTelemetry {
    pub state: FlightState,
    pub actuator: ActuatorCommand,
    pub led_on: bool,
}
