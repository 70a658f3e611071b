use embassy_executor::task;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Receiver;
use embassy_time::{Duration, Ticker};

use flight_core::actuator::{retain_tick, ActuatorCommand, ServoChannel};
use flight_core::config::ServoGeometry;

use crate::state::FsmTelemetry;

/// Deployment-retain task: rewrites both servo channels from the FSM's
/// latest command every `period_ms`, independent of whether the FSM
/// produced a new value this cycle. See `flight_core::actuator` for why
/// this continuous rewrite is part of the contract.
#[task]
pub async fn actuator_task<D: ServoChannel + 'static, M: ServoChannel + 'static>(
    mut drogue: D,
    mut main: M,
    geometry: ServoGeometry,
    period_ms: u32,
    fsm_rx: Receiver<'static, CriticalSectionRawMutex, FsmTelemetry, 1>,
) {
    let mut command = ActuatorCommand::locked(&geometry);
    let mut ticker = Ticker::every(Duration::from_millis(period_ms as u64));

    loop {
        ticker.next().await;
        if let Ok(t) = fsm_rx.try_receive() {
            command = t.actuator;
        }
        retain_tick(&command, &geometry, &mut drogue, &mut main);
    }
}
