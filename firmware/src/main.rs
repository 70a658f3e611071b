#![no_std]
#![no_main]

mod board;
mod drivers;
mod state;
mod tasks;
mod usb;

use embassy_executor::Spawner;
use embassy_stm32::gpio::{Level, Output, Pin, Speed};
use embassy_stm32::i2c::I2c;
use embassy_stm32::spi::{Config as SpiConfig, Spi};
use embassy_stm32::time::Hertz as TimeHertz;
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use embassy_stm32::timer::Channel as TimChannel;
use embassy_stm32::usart::{Config as UsartConfig, Uart};
use embassy_stm32::{bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use flight_core::config::FlightConfig;
use flight_core::kalman::KalmanState;
use flight_core::telemetry::{BaroSample, GnssSample, ImuSample, SensorHealth};

use crate::board::Board;
use crate::drivers::icm42688::Icm42688;
use crate::drivers::servo::ServoPwm;
use crate::drivers::storage::RamLogSink;
use crate::state::FsmTelemetry;

// ── Inter-task channels ──────────────────────────────────────────────────
// Cap=1: every consumer wants the LATEST sample; older values are dropped.
// Producers that feed more than one consumer get one channel per consumer
// (the "_TEL" duplication pattern), since a `Channel<_, _, 1>` has a single
// receive side.
static IMU_CHAN: Channel<CriticalSectionRawMutex, ImuSample, 1> = Channel::new();
static IMU_LOG_CHAN: Channel<CriticalSectionRawMutex, ImuSample, 1> = Channel::new();
static IMU_DBG_CHAN: Channel<CriticalSectionRawMutex, ImuSample, 1> = Channel::new();
static IMU_HEALTH_CHAN: Channel<CriticalSectionRawMutex, SensorHealth, 1> = Channel::new();

static KALMAN_CHAN: Channel<CriticalSectionRawMutex, KalmanState, 1> = Channel::new();
static KALMAN_LOG_CHAN: Channel<CriticalSectionRawMutex, KalmanState, 1> = Channel::new();
static KALMAN_DBG_CHAN: Channel<CriticalSectionRawMutex, KalmanState, 1> = Channel::new();
static BARO_LOG_CHAN: Channel<CriticalSectionRawMutex, BaroSample, 1> = Channel::new();
static BARO_HEALTH_CHAN: Channel<CriticalSectionRawMutex, SensorHealth, 1> = Channel::new();

static GNSS_CHAN: Channel<CriticalSectionRawMutex, GnssSample, 1> = Channel::new();

static FSM_ACT_CHAN: Channel<CriticalSectionRawMutex, FsmTelemetry, 1> = Channel::new();
static FSM_LOG_CHAN: Channel<CriticalSectionRawMutex, FsmTelemetry, 1> = Channel::new();
static FSM_DBG_CHAN: Channel<CriticalSectionRawMutex, FsmTelemetry, 1> = Channel::new();
static FSM_LED_CHAN: Channel<CriticalSectionRawMutex, FsmTelemetry, 1> = Channel::new();

static DISARM: Signal<CriticalSectionRawMutex, ()> = Signal::new();

// ── Interrupt bindings ───────────────────────────────────────────────────
bind_interrupts!(struct Irqs {
    I2C1_EV => embassy_stm32::i2c::EventInterruptHandler<peripherals::I2C1>;
    I2C1_ER => embassy_stm32::i2c::ErrorInterruptHandler<peripherals::I2C1>;
    USART3  => embassy_stm32::usart::InterruptHandler<peripherals::USART3>;
});

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let config = FlightConfig::default();

    // 1. Board init (168 MHz PLL).
    let board = Board::init();
    let p = board.p;

    // 2. USB (CDC-ACM for the debug line and ground disarm command).
    let (usb_dev, usb_serial) = usb::init(p.USB_OTG_FS, p.PA12, p.PA11);
    spawner.spawn(usb::usb_task(usb_dev)).unwrap();

    // 3. I2C1 @ 400 kHz -- SPL06 altimeter (SCL=PB8, SDA=PB9).
    let i2c = I2c::new(
        p.I2C1,
        p.PB8,
        p.PB9,
        Irqs,
        p.DMA1_CH7,
        p.DMA1_CH0,
        TimeHertz(400_000),
        Default::default(),
    );

    // 4. SPI1 @ 10 MHz -- ICM-42688 IMU (SCK=PA5, MOSI=PA7, MISO=PA6, CS=PB12).
    let mut spi_config = SpiConfig::default();
    spi_config.frequency = TimeHertz(10_000_000);
    use embassy_stm32::dma::NoDma;
    let spi = Spi::new(p.SPI1, p.PA5, p.PA7, p.PA6, NoDma, NoDma, spi_config);
    let cs_imu = Output::new(p.PB12.degrade(), Level::High, Speed::VeryHigh);
    let mut imu = Icm42688::new(spi, cs_imu);
    Timer::after(Duration::from_millis(100)).await;
    let imu_init_ok = imu.init().await.is_ok();

    // 5. USART3 @ 115200 -- GNSS NMEA (TX=PB10, RX=PB11).
    let mut gps_config = UsartConfig::default();
    gps_config.baudrate = 115_200;
    let gps_uart = Uart::new(
        p.USART3,
        p.PB11,
        p.PB10,
        Irqs,
        p.DMA1_CH3,
        p.DMA1_CH1,
        gps_config,
    )
    .unwrap();

    // 6. Two servo PWM outputs, 50 Hz, one timer per deployment channel --
    //    drogue on TIM2_CH1 (PA0), main on TIM3_CH1 (PB4).
    let drogue_pwm_pin = PwmPin::new_ch1(p.PA0, embassy_stm32::gpio::OutputType::PushPull);
    let mut drogue_pwm = SimplePwm::new(
        p.TIM2,
        Some(drogue_pwm_pin),
        None,
        None,
        None,
        TimeHertz(50),
        Default::default(),
    );
    drogue_pwm.set_duty(TimChannel::Ch1, 0);
    let drogue_servo = ServoPwm::new(drogue_pwm, TimChannel::Ch1);

    let main_pwm_pin = PwmPin::new_ch1(p.PB4, embassy_stm32::gpio::OutputType::PushPull);
    let mut main_pwm = SimplePwm::new(
        p.TIM3,
        Some(main_pwm_pin),
        None,
        None,
        None,
        TimeHertz(50),
        Default::default(),
    );
    main_pwm.set_duty(TimChannel::Ch1, 0);
    let main_servo = ServoPwm::new(main_pwm, TimChannel::Ch1);

    // 7. Status LED (PC13), driven directly by the FSM's `led_on` via the
    //    heartbeat loop at the bottom of `main`.
    let mut led = Output::new(p.PC13, Level::High, Speed::Low);

    // 8. 'static promotion of the IMU driver handle for the sensor task.
    let imu_ref: &'static mut Icm42688<'static, peripherals::SPI1> = {
        static IMU_CELL: StaticCell<Icm42688<'static, peripherals::SPI1>> = StaticCell::new();
        IMU_CELL.init(imu)
    };

    // 9. Spawn all tasks.
    spawner
        .spawn(tasks::imu_task::imu_task(
            unsafe { core::ptr::read(imu_ref) },
            imu_init_ok,
            config.periods.imu_read_ms,
            IMU_CHAN.sender(),
            IMU_LOG_CHAN.sender(),
            IMU_DBG_CHAN.sender(),
            IMU_HEALTH_CHAN.sender(),
        ))
        .unwrap();

    spawner
        .spawn(tasks::baro_task::baro_task(
            i2c,
            config.periods.altimeter_read_ms,
            config.qnh_hpa,
            config.kalman,
            KALMAN_CHAN.sender(),
            KALMAN_LOG_CHAN.sender(),
            KALMAN_DBG_CHAN.sender(),
            BARO_LOG_CHAN.sender(),
            BARO_HEALTH_CHAN.sender(),
        ))
        .unwrap();

    spawner
        .spawn(tasks::gps_task::gps_task(gps_uart, GNSS_CHAN.sender()))
        .unwrap();

    spawner
        .spawn(tasks::fsm_task::fsm_task(
            config,
            IMU_CHAN.receiver(),
            KALMAN_CHAN.receiver(),
            &DISARM,
            FSM_ACT_CHAN.sender(),
            FSM_LOG_CHAN.sender(),
            FSM_DBG_CHAN.sender(),
            FSM_LED_CHAN.sender(),
        ))
        .unwrap();

    spawner
        .spawn(tasks::actuator_task::actuator_task(
            drogue_servo,
            main_servo,
            config.servo,
            config.periods.deployment_retain_ms,
            FSM_ACT_CHAN.receiver(),
        ))
        .unwrap();

    spawner
        .spawn(tasks::logger_task::logger_task(
            RamLogSink::new(),
            config.servo,
            config.periods.sd_flush_ms,
            FSM_LOG_CHAN.receiver(),
            IMU_LOG_CHAN.receiver(),
            KALMAN_LOG_CHAN.receiver(),
            BARO_LOG_CHAN.receiver(),
        ))
        .unwrap();

    spawner
        .spawn(tasks::debug_task::debug_task(
            usb_serial,
            &DISARM,
            FSM_DBG_CHAN.receiver(),
            IMU_DBG_CHAN.receiver(),
            KALMAN_DBG_CHAN.receiver(),
            GNSS_CHAN.receiver(),
            IMU_HEALTH_CHAN.receiver(),
            BARO_HEALTH_CHAN.receiver(),
        ))
        .unwrap();

    // 10. Status LED, mirroring the FSM's `led_on`: ON during Startup,
    //     OFF during powered flight, ON again once recovery devices are
    //     out.
    let mut current = FsmTelemetry::default();
    loop {
        if let Ok(t) = FSM_LED_CHAN.try_receive() {
            current = t;
        }
        if current.led_on {
            led.set_high();
        } else {
            led.set_low();
        }
        Timer::after(Duration::from_millis(20)).await;
    }
}
