use embassy_executor::task;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Receiver, Sender};
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Ticker};

use flight_core::config::FlightConfig;
use flight_core::fsm::{FlightFsm, FsmInputs};
use flight_core::kalman::KalmanState;
use flight_core::telemetry::ImuSample;

use crate::state::FsmTelemetry;

/// The FSM task's only external input besides the sensor channels: ground
/// disarm, which is the sole way out of `Landed` (see `FlightFsm::disarm`).
pub type DisarmSignal = Signal<CriticalSectionRawMutex, ()>;

/// Flight FSM task. Evaluated on `config.periods.fsm_eval_ms`, consuming
/// whatever the IMU/Kalman tasks last published -- it never blocks waiting
/// for a fresh sample, per the FSM's own contract.
#[task]
pub async fn fsm_task(
    config: FlightConfig,
    imu_rx: Receiver<'static, CriticalSectionRawMutex, ImuSample, 1>,
    kalman_rx: Receiver<'static, CriticalSectionRawMutex, KalmanState, 1>,
    disarm: &'static DisarmSignal,
    actuator_tx: Sender<'static, CriticalSectionRawMutex, FsmTelemetry, 1>,
    logger_tx: Sender<'static, CriticalSectionRawMutex, FsmTelemetry, 1>,
    debug_tx: Sender<'static, CriticalSectionRawMutex, FsmTelemetry, 1>,
    led_tx: Sender<'static, CriticalSectionRawMutex, FsmTelemetry, 1>,
) {
    let boot = Instant::now();
    let mut fsm = FlightFsm::new(config);
    let mut imu = ImuSample::default();
    let mut kalman = KalmanState::default();

    let mut ticker = Ticker::every(Duration::from_millis(config.periods.fsm_eval_ms as u64));

    loop {
        ticker.next().await;

        if let Ok(s) = imu_rx.try_receive() {
            imu = s;
        }
        if let Ok(s) = kalman_rx.try_receive() {
            kalman = s;
        }
        if disarm.try_take().is_some() {
            fsm.disarm();
        }

        let inputs = FsmInputs {
            now_ms: Instant::now().duration_since(boot).as_millis() as u32,
            acc_magnitude_g: imu.magnitude_g(),
            altitude_m: kalman.altitude_m,
            velocity_ms: kalman.velocity_ms,
        };
        let out = fsm.tick(inputs);

        let telemetry = FsmTelemetry {
            state: out.state,
            actuator: out.actuator,
            led_on: out.led_on,
        };
        let _ = actuator_tx.try_send(telemetry);
        let _ = logger_tx.try_send(telemetry);
        let _ = debug_tx.try_send(telemetry);
        let _ = led_tx.try_send(telemetry);
    }
}
