use embassy_executor::task;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Receiver;
use embassy_time::{Duration, Instant, Timer};

use flight_core::config::ServoGeometry;
use flight_core::kalman::KalmanState;
use flight_core::logger::{logger_interval_ms, open_boot_log_file, LogRow, LogSink};
use flight_core::telemetry::{BaroSample, ImuSample};

use crate::state::FsmTelemetry;

/// Base poll period: finer than the fastest logging cadence (20 Hz =
/// 50 ms), so the variable-rate schedule below never misses its deadline
/// by more than this.
const POLL_MS: u64 = 10;

/// Inverse of `angle_deg_to_pulse_us`, for the CSV's servo-angle column:
/// the FSM only ever commands `locked`/`released` pulses, so this is purely
/// diagnostic.
fn pulse_us_to_angle_deg(pulse_us: u16, geometry: &ServoGeometry) -> f32 {
    let span = (geometry.max_pulse_us - geometry.min_pulse_us) as f32;
    let clamped = pulse_us.clamp(geometry.min_pulse_us, geometry.max_pulse_us);
    ((clamped - geometry.min_pulse_us) as f32 / span) * 180.0
}

/// CSV logger task. Logging cadence depends on the current flight state
/// (`logger_rate_hz`), re-read every cycle so a state change takes effect
/// within one period. Owns the `LogSink` outright: it is the only task that
/// ever writes to storage.
#[task]
pub async fn logger_task<S: LogSink + 'static>(
    mut sink: S,
    servo: ServoGeometry,
    flush_interval_ms: u32,
    fsm_rx: Receiver<'static, CriticalSectionRawMutex, FsmTelemetry, 1>,
    imu_rx: Receiver<'static, CriticalSectionRawMutex, ImuSample, 1>,
    kalman_rx: Receiver<'static, CriticalSectionRawMutex, KalmanState, 1>,
    baro_rx: Receiver<'static, CriticalSectionRawMutex, BaroSample, 1>,
) {
    let boot = Instant::now();
    let _ = open_boot_log_file(&mut sink);

    let mut seq: u32 = 0;
    let mut fsm = FsmTelemetry::default();
    let mut imu = ImuSample::default();
    let mut kalman = KalmanState::default();
    let mut baro = BaroSample::default();

    let mut next_log_due = Instant::now();
    let mut next_flush_due = Instant::now() + Duration::from_millis(flush_interval_ms as u64);

    loop {
        Timer::after(Duration::from_millis(POLL_MS)).await;

        if let Ok(t) = fsm_rx.try_receive() {
            fsm = t;
        }
        if let Ok(s) = imu_rx.try_receive() {
            imu = s;
        }
        if let Ok(s) = kalman_rx.try_receive() {
            kalman = s;
        }
        if let Ok(s) = baro_rx.try_receive() {
            baro = s;
        }

        let now = Instant::now();
        if now >= next_log_due {
            let row = LogRow {
                seq,
                millis: now.duration_since(boot).as_millis() as u32,
                state: fsm.state,
                acc_x_ms2: imu.ax_g * flight_core::config::STANDARD_GRAVITY,
                acc_y_ms2: imu.ay_g * flight_core::config::STANDARD_GRAVITY,
                acc_z_ms2: imu.az_g * flight_core::config::STANDARD_GRAVITY,
                fused_velocity_ms: kalman.velocity_ms,
                fused_altitude_m: kalman.altitude_m,
                pressure_hpa: baro.pressure_hpa,
                servo_a_angle_deg: pulse_us_to_angle_deg(fsm.actuator.drogue_pulse_us, &servo),
                // No dedicated CPU/board temperature sensor in this airframe;
                // the barometer's die temperature is the closest available proxy.
                cpu_temp_c: baro.temperature_c,
            };
            seq = seq.wrapping_add(1);
            let formatted = row.format();
            let _ = sink.append(formatted.as_bytes());
            next_log_due = now + Duration::from_millis(logger_interval_ms(fsm.state) as u64);
        }

        if now >= next_flush_due {
            let _ = sink.flush();
            next_flush_due = now + Duration::from_millis(flush_interval_ms as u64);
        }
    }
}

