//! Error types shared across the core. Platform drivers translate their
//! own hardware errors into these before handing samples to the core, so
//! the core itself never depends on a particular bus or chip.

use core::fmt;

/// A sensor read failed or returned data the core refuses to trust.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SensorError {
    /// The underlying bus transaction failed (NACK, timeout, framing error).
    Bus,
    /// The sensor responded but the reading is outside its physical range.
    OutOfRange,
    /// No sample has arrived within the expected period.
    Stale,
    /// The sensor has not been initialized / configured yet.
    NotReady,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SensorError::Bus => "sensor bus error",
            SensorError::OutOfRange => "sensor reading out of range",
            SensorError::Stale => "sensor data stale",
            SensorError::NotReady => "sensor not ready",
        };
        f.write_str(s)
    }
}
