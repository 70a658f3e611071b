//! Compile-time-ish configuration: every threshold, period and geometry
//! constant the core needs, bundled into one value built at construction
//! instead of scattered `const`s. Mirrors the source firmware's
//! `UserConfig.h`, but as data rather than preprocessor defines so tests
//! and the host simulator can vary tuning without touching algorithm code.

/// Standard gravity, m/s^2 — used to convert the `*_ACC` thresholds from g to m/s^2.
pub const STANDARD_GRAVITY: f32 = 9.80665;

/// FSM and task periods, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Periods {
    pub fsm_eval_ms: u32,
    pub imu_read_ms: u32,
    pub altimeter_read_ms: u32,
    pub gnss_read_ms: u32,
    pub deployment_retain_ms: u32,
    pub sd_flush_ms: u32,
    pub debug_serial_ms: u32,
}

impl Default for Periods {
    fn default() -> Self {
        Self {
            fsm_eval_ms: 5,
            imu_read_ms: 10,
            altimeter_read_ms: 100,
            gnss_read_ms: 500,
            deployment_retain_ms: 100,
            sd_flush_ms: 1000,
            debug_serial_ms: 500,
        }
    }
}

/// Detection thresholds and time safeguards for the flight FSM.
///
/// `*_min_ms`/`*_max_ms` bound the Powered->Coasting and Coasting->DrogueDeploy
/// safeguards. The source template shipped `min == max` (a placeholder meant
/// to be tuned per motor); here they are distinct defaults an airframe is
/// expected to override before flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    /// True-to-false ratio required by the sampler before a detection latches.
    pub sampler_ratio: f32,

    /// Launch acceleration threshold, in g.
    pub launch_acc_g: f32,
    /// Duration the launch acceleration must be sustained, in ms.
    pub launch_ton_ms: u32,

    /// Burnout acceleration threshold, in g.
    pub burnout_acc_g: f32,
    /// Sampler detection window for the burnout-acceleration test, ms.
    pub burnout_ton_ms: u32,
    pub burnout_min_ms: u32,
    pub burnout_max_ms: u32,

    /// Apogee velocity threshold, m/s.
    pub apogee_vel_ms: f32,
    /// Sampler detection window for the apogee-velocity test, ms.
    pub apogee_ton_ms: u32,
    pub apogee_min_ms: u32,
    pub apogee_max_ms: u32,

    /// Theoretical drogue descent velocity used for main-altitude compensation, m/s.
    pub drogue_vel_ms: f32,
    /// Raw main-deployment altitude, m AGL.
    pub main_alt_raw_m: f32,
    /// Detection window for the main-altitude sampler, ms.
    pub main_ton_ms: u32,
    /// Compensation multiplier `k` in `MAIN_ALT_COMPENSATED = raw + k * v_drogue * (ton/1000)`.
    pub main_compensation_mult: f32,

    /// Landed velocity threshold, m/s.
    pub landed_vel_ms: f32,
    /// Detection window for the landed-velocity sampler, ms.
    pub landed_ton_ms: u32,
}

impl Thresholds {
    /// `MAIN_ALT_COMPENSATED`, recomputed from the current `main_ton_ms`.
    pub fn main_alt_compensated_m(&self) -> f32 {
        self.main_alt_raw_m
            + self.main_compensation_mult * self.drogue_vel_ms * (self.main_ton_ms as f32 / 1000.0)
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            sampler_ratio: 1.0,

            launch_acc_g: 10.0,
            launch_ton_ms: 150,

            burnout_acc_g: 6.0,
            burnout_ton_ms: 500,
            burnout_min_ms: 700,
            burnout_max_ms: 4000,

            apogee_vel_ms: 10.0,
            apogee_ton_ms: 500,
            apogee_min_ms: 1000,
            apogee_max_ms: 20_000,

            drogue_vel_ms: 15.0,
            main_alt_raw_m: 300.0,
            main_ton_ms: 1000,
            main_compensation_mult: 2.0,

            landed_vel_ms: 0.5,
            landed_ton_ms: 5000,
        }
    }
}

/// Servo pulse-width geometry, microseconds, shared by both deployment channels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ServoGeometry {
    pub min_pulse_us: u16,
    pub max_pulse_us: u16,
    /// Pulse width corresponding to the "locked" (180 deg) angle.
    pub locked_pulse_us: u16,
    /// Pulse width corresponding to the "released" (0 deg) angle.
    pub released_pulse_us: u16,
}

impl Default for ServoGeometry {
    fn default() -> Self {
        Self {
            min_pulse_us: 500,
            max_pulse_us: 2450,
            locked_pulse_us: 2400,
            released_pulse_us: 500,
        }
    }
}

/// Kalman filter tuning (see `kalman::AltitudeKalman`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KalmanTuning {
    /// Process noise seed, diagonal of `Q`. 0.1 nominal, 0.5 in the alternate tuning.
    pub process_noise: f32,
    /// Initial (and post-divergence-reset) measurement noise `R`.
    pub measurement_noise: f32,
    /// R-adaptation gain (IAE), typically 0.20.
    pub alpha: f32,
    /// Q-adaptation gain (IAE), typically disabled (0.0).
    pub beta: f32,
    /// Innovation gate, in standard deviations of the innovation.
    pub tau: f32,
    /// Numerical floor for adapted `R`.
    pub epsilon: f32,
}

impl Default for KalmanTuning {
    fn default() -> Self {
        Self {
            process_noise: 0.1,
            measurement_noise: 0.5,
            alpha: 0.20,
            beta: 0.0,
            tau: 4.0,
            epsilon: 1e-12,
        }
    }
}

/// Everything the flight-control core needs, built once at boot and
/// threaded into the FSM/estimator/logger at construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlightConfig {
    pub periods: Periods,
    pub thresholds: Thresholds,
    pub servo: ServoGeometry,
    pub kalman: KalmanTuning,
    /// Altimeter setting (QNH), hPa, used by the ISA-76 conversion. 1013.25 = pure ISA.
    pub qnh_hpa: f32,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            periods: Periods::default(),
            thresholds: Thresholds::default(),
            servo: ServoGeometry::default(),
            kalman: KalmanTuning::default(),
            qnh_hpa: 1013.25,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_alt_compensated_matches_worked_example() {
        let t = Thresholds {
            drogue_vel_ms: 15.0,
            main_alt_raw_m: 300.0,
            main_ton_ms: 1000,
            main_compensation_mult: 2.0,
            ..Thresholds::default()
        };
        // 300 + 2 * 15 * (1000/1000) = 330
        assert!((t.main_alt_compensated_m() - 330.0).abs() < 1e-6);
    }

    #[test]
    fn main_alt_compensated_recomputes_on_ton_change() {
        let mut t = Thresholds::default();
        let before = t.main_alt_compensated_m();
        t.main_ton_ms *= 2;
        let after = t.main_alt_compensated_m();
        assert!(after > before);
    }
}
