//! Data types exchanged between sensor drivers and the flight-control
//! core. These are plain value types — the core never reaches back into
//! a driver or a bus handle, it only ever sees the samples below.

use micromath::F32Ext;

/// One IMU reading: linear acceleration (g) and angular rate (rad/s) in
/// the body frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ImuSample {
    pub ax_g: f32,
    pub ay_g: f32,
    pub az_g: f32,
    pub gyr_x_rads: f32,
    pub gyr_y_rads: f32,
    pub gyr_z_rads: f32,
    /// Milliseconds since boot the sample was taken at.
    pub timestamp_ms: u32,
}

impl ImuSample {
    /// Magnitude of the acceleration vector, in g.
    ///
    /// The source firmware computed this as `sqrt(ax*ax + az*az + az*az)` —
    /// `az` counted twice and `ay` dropped entirely. That bug is fixed here:
    /// the three axes are combined correctly.
    pub fn magnitude_g(&self) -> f32 {
        (self.ax_g * self.ax_g + self.ay_g * self.ay_g + self.az_g * self.az_g).sqrt()
    }
}

/// One barometer reading.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BaroSample {
    pub pressure_hpa: f32,
    pub temperature_c: f32,
    pub timestamp_ms: u32,
}

/// One GNSS fix. Altitude/velocity fields are advisory telemetry only —
/// the FSM never depends on GNSS for a detection decision.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GnssSample {
    pub latitude_deg: f32,
    pub longitude_deg: f32,
    pub altitude_m: f32,
    pub num_satellites: u8,
    pub fix_valid: bool,
    /// UTC epoch, seconds, parsed from the RMC sentence's time+date fields.
    /// 0 until a sentence carrying both has been parsed.
    pub epoch_s: u32,
    /// Milliseconds since boot the sample was received at (local receive
    /// time, independent of whether `epoch_s` has been populated yet).
    pub timestamp_ms: u32,
}

/// Liveness/fault state of one sensor, per SPEC_FULL.md's `sensor_health[n]`
/// domain of `{Ok, Err, Absent, Unknown}`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SensorHealth {
    /// Responding normally; the most recent `read()` succeeded.
    Ok,
    /// Persistently failing: either `begin()` itself failed at boot
    /// (sensor-persistent, error kind c) or three or more `read()`s in a
    /// row have failed (escalated from sensor-transient, kind b).
    Err,
    /// No driver configured for this slot.
    Absent,
    /// A driver is configured but no `begin()`/`read()` outcome has been
    /// observed yet.
    #[default]
    Unknown,
}

impl SensorHealth {
    /// Short name for the debug status line.
    pub fn name(self) -> &'static str {
        match self {
            SensorHealth::Ok => "OK",
            SensorHealth::Err => "ERR",
            SensorHealth::Absent => "ABSENT",
            SensorHealth::Unknown => "UNKNOWN",
        }
    }
}

/// Tracks a sensor's consecutive-error count so a single transient `read()`
/// failure (the previous sample is retained for that tick, per the
/// error-handling design) doesn't immediately flip published health to
/// `Err` the way three or more in a row does. Reader tasks own one of
/// these and publish `.health()` over the telemetry channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SensorHealthTracker {
    health: SensorHealth,
    consecutive_errors: u16,
}

impl SensorHealthTracker {
    pub const fn new() -> Self {
        Self {
            health: SensorHealth::Unknown,
            consecutive_errors: 0,
        }
    }

    pub fn health(&self) -> SensorHealth {
        self.health
    }

    /// Records the outcome of the driver's `begin()`/`init()`: `Err` if
    /// initialization failed (sensor-persistent, kind c — the sensor's
    /// task still runs but contributes nothing), `Unknown` if it succeeded
    /// and the sensor is now waiting on its first `read()`.
    pub fn record_begin(&mut self, ok: bool) {
        self.health = if ok { SensorHealth::Unknown } else { SensorHealth::Err };
        self.consecutive_errors = 0;
    }

    /// No driver is configured for this slot at all (sensor-absent, kind a).
    pub fn mark_absent(&mut self) {
        self.health = SensorHealth::Absent;
        self.consecutive_errors = 0;
    }

    pub fn record_ok(&mut self) {
        self.health = SensorHealth::Ok;
        self.consecutive_errors = 0;
    }

    /// A single `read()` failure (sensor-transient, kind b).
    pub fn record_error(&mut self) {
        self.consecutive_errors = self.consecutive_errors.saturating_add(1);
        if self.consecutive_errors >= 3 {
            self.health = SensorHealth::Err;
        }
    }
}

impl Default for SensorHealthTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_uses_all_three_axes() {
        // 3-4-0 triangle: sqrt(9+16+0) = 5, not the buggy sqrt(9+0+0)=3.
        let s = ImuSample {
            ax_g: 3.0,
            ay_g: 4.0,
            az_g: 0.0,
            ..Default::default()
        };
        assert!((s.magnitude_g() - 5.0).abs() < 1e-5);
    }

    #[test]
    fn magnitude_pure_az_equals_az() {
        let s = ImuSample {
            az_g: 10.0,
            ..Default::default()
        };
        assert!((s.magnitude_g() - 10.0).abs() < 1e-5);
    }

    #[test]
    fn fresh_tracker_reports_unknown() {
        let t = SensorHealthTracker::new();
        assert_eq!(t.health(), SensorHealth::Unknown);
    }

    #[test]
    fn failed_begin_reports_err_without_any_reads() {
        let mut t = SensorHealthTracker::new();
        t.record_begin(false);
        assert_eq!(t.health(), SensorHealth::Err);
    }

    #[test]
    fn successful_begin_reports_unknown_until_first_read() {
        let mut t = SensorHealthTracker::new();
        t.record_begin(true);
        assert_eq!(t.health(), SensorHealth::Unknown);
        t.record_ok();
        assert_eq!(t.health(), SensorHealth::Ok);
    }

    #[test]
    fn single_transient_error_does_not_flip_health() {
        let mut t = SensorHealthTracker::new();
        t.record_ok();
        t.record_error();
        assert_eq!(t.health(), SensorHealth::Ok);
        t.record_error();
        assert_eq!(t.health(), SensorHealth::Ok);
    }

    #[test]
    fn health_trips_after_three_consecutive_errors() {
        let mut t = SensorHealthTracker::new();
        t.record_ok();
        t.record_error();
        t.record_error();
        assert_eq!(t.health(), SensorHealth::Ok);
        t.record_error();
        assert_eq!(t.health(), SensorHealth::Err);
    }

    #[test]
    fn health_recovers_on_ok() {
        let mut t = SensorHealthTracker::new();
        t.record_error();
        t.record_error();
        t.record_error();
        assert_eq!(t.health(), SensorHealth::Err);
        t.record_ok();
        assert_eq!(t.health(), SensorHealth::Ok);
    }

    #[test]
    fn mark_absent_overrides_any_prior_state() {
        let mut t = SensorHealthTracker::new();
        t.record_ok();
        t.mark_absent();
        assert_eq!(t.health(), SensorHealth::Absent);
    }
}
