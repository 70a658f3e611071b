//! Platform-independent flight-control core.
//!
//! This crate holds every piece of the avionics core that is pure
//! computation: the adaptive altitude Kalman filter, the flight finite
//! state machine, the windowed threshold sampler, actuator angle/pulse
//! mapping, ISA-76 pressure-to-altitude conversion and CSV log-row
//! formatting. It has no I/O, no async runtime and no platform-specific
//! code, so it runs — and is tested — on the host, and is linked
//! unmodified into the embedded firmware in `firmware/`.
#![cfg_attr(not(test), no_std)]

pub mod actuator;
pub mod config;
pub mod error;
pub mod fsm;
pub mod isa76;
pub mod kalman;
pub mod logger;
pub mod sampler;
pub mod telemetry;

pub use config::FlightConfig;
pub use error::SensorError;
pub use fsm::{FlightFsm, FlightState};
pub use kalman::AltitudeKalman;
pub use sampler::ThresholdSampler;
pub use telemetry::{BaroSample, GnssSample, ImuSample, SensorHealth, SensorHealthTracker};
