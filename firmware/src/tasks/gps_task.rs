use embassy_executor::task;
use embassy_futures::select::{select, Either};
use embassy_stm32::peripherals::{DMA1_CH1, DMA1_CH3, USART3};
use embassy_stm32::usart::Uart;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Sender;
use embassy_time::{Duration, Instant, Timer};

use flight_core::telemetry::GnssSample;

use crate::drivers::gps::NmeaParser;

/// GPS task: reads NMEA from USART3 and publishes a `GnssSample` whenever a
/// sentence is parsed. Carried telemetry only -- the FSM never consumes
/// GNSS.
#[task]
pub async fn gps_task(
    mut gps_uart: Uart<'static, USART3, DMA1_CH3, DMA1_CH1>,
    gnss_tx: Sender<'static, CriticalSectionRawMutex, GnssSample, 1>,
) {
    let mut parser = NmeaParser::new();
    let mut buf = [0u8; 512];

    loop {
        // Wait for a burst of NMEA data (GPS sends at 10 Hz -> 100ms window).
        match select(
            gps_uart.read_until_idle(&mut buf),
            Timer::after(Duration::from_millis(110)),
        )
        .await
        {
            Either::First(Ok(n)) => {
                parser.push_data(&buf[..n]);

                let d = &parser.data;
                let sample = GnssSample {
                    latitude_deg: d.lat,
                    longitude_deg: d.lon,
                    altitude_m: d.alt,
                    num_satellites: d.sats,
                    fix_valid: d.fix,
                    epoch_s: d.epoch_s,
                    timestamp_ms: Instant::now().as_millis() as u32,
                };
                let _ = gnss_tx.try_send(sample);
            }
            Either::First(Err(_)) | Either::Second(_) => {
                // UART error or timeout -- keep looping.
            }
        }
    }
}
