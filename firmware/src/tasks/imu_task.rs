use embassy_executor::task;
use embassy_stm32::peripherals::SPI1;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Sender;
use embassy_time::{Duration, Instant, Ticker};
use micromath::F32Ext;

use flight_core::telemetry::{ImuSample, SensorHealth, SensorHealthTracker};

use crate::drivers::icm42688::Icm42688;

/// ICM-42688 full-scale range is configured for +/-16g; at that range the
/// datasheet's sensitivity is 2048 LSB/g.
const ACCEL_LSB_PER_G: f32 = 2048.0;

/// Default gyro full-scale range (+/-2000 dps); sensitivity 16.4 LSB/dps.
const GYRO_LSB_PER_DPS: f32 = 16.4;

/// IMU task -- reads the accelerometer and gyroscope at the configured rate
/// and publishes a hot-path copy (FSM) plus one telemetry copy per
/// downstream consumer (logger, debug line), since a capacity-1 channel
/// supports only a single receiver. Also publishes liveness for the debug
/// line, seeded from whether `init()` succeeded at boot.
#[task]
pub async fn imu_task(
    mut imu: Icm42688<'static, SPI1>,
    init_ok: bool,
    period_ms: u32,
    imu_tx: Sender<'static, CriticalSectionRawMutex, ImuSample, 1>,
    imu_log_tx: Sender<'static, CriticalSectionRawMutex, ImuSample, 1>,
    imu_dbg_tx: Sender<'static, CriticalSectionRawMutex, ImuSample, 1>,
    health_tx: Sender<'static, CriticalSectionRawMutex, SensorHealth, 1>,
) {
    let mut health = SensorHealthTracker::new();
    health.record_begin(init_ok);
    let mut ticker = Ticker::every(Duration::from_millis(period_ms as u64));

    loop {
        ticker.next().await;

        match imu.read_all().await {
            Ok((accel, gyro)) => {
                health.record_ok();
                let sample = ImuSample {
                    ax_g: accel[0] as f32 / ACCEL_LSB_PER_G,
                    ay_g: accel[1] as f32 / ACCEL_LSB_PER_G,
                    az_g: accel[2] as f32 / ACCEL_LSB_PER_G,
                    gyr_x_rads: (gyro[0] as f32 / GYRO_LSB_PER_DPS).to_radians(),
                    gyr_y_rads: (gyro[1] as f32 / GYRO_LSB_PER_DPS).to_radians(),
                    gyr_z_rads: (gyro[2] as f32 / GYRO_LSB_PER_DPS).to_radians(),
                    timestamp_ms: Instant::now().as_millis() as u32,
                };
                let _ = imu_tx.try_send(sample);
                let _ = imu_log_tx.try_send(sample);
                let _ = imu_dbg_tx.try_send(sample);
            }
            Err(_) => health.record_error(),
        }
        let _ = health_tx.try_send(health.health());
    }
}
