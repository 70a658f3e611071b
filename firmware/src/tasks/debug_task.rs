use core::fmt::Write as _;

use embassy_executor::task;
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Receiver;
use embassy_time::{Duration, Ticker};

use flight_core::kalman::KalmanState;
use flight_core::telemetry::{GnssSample, ImuSample, SensorHealth};

use crate::state::FsmTelemetry;
use crate::tasks::fsm_task::DisarmSignal;
use crate::usb::UsbSerial;

/// Below-normal-priority USB CDC status line, fixed 2 Hz, independent of
/// the CSV logger's state-dependent cadence. Format is an internal
/// convenience only -- nothing downstream parses it.
#[task]
pub async fn debug_task(
    mut usb_serial: UsbSerial<'static>,
    disarm: &'static DisarmSignal,
    fsm_rx: Receiver<'static, CriticalSectionRawMutex, FsmTelemetry, 1>,
    imu_rx: Receiver<'static, CriticalSectionRawMutex, ImuSample, 1>,
    kalman_rx: Receiver<'static, CriticalSectionRawMutex, KalmanState, 1>,
    gnss_rx: Receiver<'static, CriticalSectionRawMutex, GnssSample, 1>,
    imu_health_rx: Receiver<'static, CriticalSectionRawMutex, SensorHealth, 1>,
    baro_health_rx: Receiver<'static, CriticalSectionRawMutex, SensorHealth, 1>,
) {
    let mut fsm = FsmTelemetry::default();
    let mut imu = ImuSample::default();
    let mut kalman = KalmanState::default();
    let mut gnss = GnssSample::default();
    let mut imu_health = SensorHealth::default();
    let mut baro_health = SensorHealth::default();

    let mut ticker = Ticker::every(Duration::from_hz(2));

    let mut cmd = [0u8; 8];

    loop {
        // Wait for either the 2 Hz status tick or an incoming ground
        // command byte, whichever comes first.
        match select(ticker.next(), usb_serial.read_packet(&mut cmd)).await {
            Either::First(()) => {}
            Either::Second(Ok(n)) => {
                if cmd[..n].contains(&b'D') {
                    disarm.signal(());
                    defmt::info!("debug: ground disarm received");
                }
                continue;
            }
            Either::Second(Err(_)) => continue,
        }

        if let Ok(t) = fsm_rx.try_receive() {
            fsm = t;
        }
        if let Ok(s) = imu_rx.try_receive() {
            imu = s;
        }
        if let Ok(s) = kalman_rx.try_receive() {
            kalman = s;
        }
        if let Ok(s) = gnss_rx.try_receive() {
            gnss = s;
        }
        if let Ok(h) = imu_health_rx.try_receive() {
            imu_health = h;
        }
        if let Ok(h) = baro_health_rx.try_receive() {
            baro_health = h;
        }

        if !usb_serial.dtr() {
            continue;
        }

        let mut line = heapless::String::<160>::new();
        let _ = write!(
            line,
            "[MFC] state={} alt={:.1}m v={:.2}m/s acc={:.2}g imu={} baro={} gnss={}sv\r\n",
            fsm.state.name(),
            kalman.altitude_m,
            kalman.velocity_ms,
            imu.magnitude_g(),
            imu_health.name(),
            baro_health.name(),
            gnss.num_satellites,
        );
        let _ = usb_serial.write_packet(line.as_bytes()).await;
    }
}
