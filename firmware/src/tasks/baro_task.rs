use embassy_executor::task;
use embassy_stm32::i2c::{I2c, Instance, RxDma, TxDma};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Sender;
use embassy_time::{Duration, Instant, Ticker};

use flight_core::isa76::altitude_msl_from_pressure;
use flight_core::kalman::{AltitudeKalman, KalmanState};
use flight_core::telemetry::{BaroSample, SensorHealth, SensorHealthTracker};
use flight_core::config::KalmanTuning;

use crate::drivers::spl06::Spl06;

/// Barometer task: reads the SPL06 at the configured rate, converts static
/// pressure to MSL altitude via ISA-76, and runs that altitude through the
/// adaptive Kalman filter. Publishes the fused state to the FSM and one
/// telemetry copy per downstream consumer (logger, debug line), the raw
/// sample for the CSV pressure column, and liveness for the debug line.
#[task]
pub async fn baro_task<T, Tx, Rx>(
    mut i2c: I2c<'static, T, Tx, Rx>,
    period_ms: u32,
    qnh_hpa: f32,
    kalman_tuning: KalmanTuning,
    kalman_tx: Sender<'static, CriticalSectionRawMutex, KalmanState, 1>,
    kalman_log_tx: Sender<'static, CriticalSectionRawMutex, KalmanState, 1>,
    kalman_dbg_tx: Sender<'static, CriticalSectionRawMutex, KalmanState, 1>,
    baro_log_tx: Sender<'static, CriticalSectionRawMutex, BaroSample, 1>,
    health_tx: Sender<'static, CriticalSectionRawMutex, SensorHealth, 1>,
) where
    T: Instance,
    Tx: TxDma<T>,
    Rx: RxDma<T>,
{
    let mut baro = Spl06::new();
    let init_ok = baro.init(&mut i2c).await.is_ok();

    let mut kf = AltitudeKalman::new(kalman_tuning);
    let dt_s = period_ms as f32 / 1000.0;
    let mut health = SensorHealthTracker::new();
    health.record_begin(init_ok);
    let mut ticker = Ticker::every(Duration::from_millis(period_ms as u64));

    loop {
        ticker.next().await;
        kf.predict(dt_s);

        match baro.read_pressure_altitude(&mut i2c).await {
            Ok((_spl06_alt_m, pressure_pa, temp_c)) => {
                health.record_ok();
                let pressure_hpa = pressure_pa / 100.0;
                let altitude_m = altitude_msl_from_pressure(pressure_hpa, qnh_hpa);
                kf.update(altitude_m);

                let _ = baro_log_tx.try_send(BaroSample {
                    pressure_hpa,
                    temperature_c: temp_c,
                    timestamp_ms: Instant::now().as_millis() as u32,
                });
            }
            Err(_) => health.record_error(),
        }

        let state = kf.state();
        let _ = kalman_tx.try_send(state);
        let _ = kalman_log_tx.try_send(state);
        let _ = kalman_dbg_tx.try_send(state);
        let _ = health_tx.try_send(health.health());
    }
}
