//! The flight finite-state machine: a twelve-state progression from
//! power-on through recovery, driven by raw acceleration and the fused
//! Kalman state. Evaluated once per FSM tick (5 ms nominal).

use crate::actuator::{ActuatorCommand, DeploymentChannel, DeploymentState};
use crate::config::FlightConfig;
use crate::sampler::ThresholdSampler;

/// Ordered flight states, `Startup` through `RecoveredSafe`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum FlightState {
    Startup,
    IdleSafe,
    Armed,
    PadPreop,
    Powered,
    Coasting,
    DrogueDeploy,
    DrogueDescend,
    MainDeploy,
    MainDescend,
    Landed,
    RecoveredSafe,
}

impl Default for FlightState {
    fn default() -> Self {
        FlightState::Startup
    }
}

impl FlightState {
    /// Short name used in the CSV `state_name` column and the debug line,
    /// matching the source firmware's abbreviations for the deploy/descend
    /// pairs.
    pub fn name(self) -> &'static str {
        match self {
            FlightState::Startup => "STARTUP",
            FlightState::IdleSafe => "IDLE_SAFE",
            FlightState::Armed => "ARMED",
            FlightState::PadPreop => "PAD_PREOP",
            FlightState::Powered => "POWERED",
            FlightState::Coasting => "COASTING",
            FlightState::DrogueDeploy => "DROG_DEPL",
            FlightState::DrogueDescend => "DROG_DESC",
            FlightState::MainDeploy => "MAIN_DEPL",
            FlightState::MainDescend => "MAIN_DESC",
            FlightState::Landed => "LANDED",
            FlightState::RecoveredSafe => "REC_SAFE",
        }
    }

    /// Status-indicator LED state for this flight state: ON during
    /// `Startup`, OFF during powered flight, ON again once recovery
    /// devices are out and the vehicle is coming down or has landed.
    pub fn led_on(self) -> bool {
        !matches!(self, FlightState::Powered | FlightState::Coasting)
    }
}

/// One tick's worth of fused/raw sensor inputs the FSM consumes. The FSM
/// never blocks waiting for a fresh sample — callers pass whatever they
/// last received, even if it predates this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FsmInputs {
    pub now_ms: u32,
    pub acc_magnitude_g: f32,
    pub altitude_m: f32,
    pub velocity_ms: f32,
}

/// What the FSM produced this tick, for the logger and actuator retain task.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FsmOutputs {
    pub state: FlightState,
    /// True on the single tick this state was entered.
    pub entered: bool,
    pub led_on: bool,
    pub actuator: ActuatorCommand,
}

/// The flight FSM: current/previous state, the shared detection sampler,
/// entry timestamp for the time-safeguarded transitions, and the live
/// actuator command.
pub struct FlightFsm {
    state: FlightState,
    prev: Option<FlightState>,
    entry_ms: u32,
    sampler: ThresholdSampler,
    actuator: ActuatorCommand,
    config: FlightConfig,
}

impl FlightFsm {
    pub fn new(config: FlightConfig) -> Self {
        Self {
            state: FlightState::Startup,
            prev: None,
            entry_ms: 0,
            sampler: ThresholdSampler::new(),
            actuator: ActuatorCommand::locked(&config.servo),
            config,
        }
    }

    pub fn state(&self) -> FlightState {
        self.state
    }

    pub fn actuator(&self) -> ActuatorCommand {
        self.actuator
    }

    /// Evaluate one FSM tick: run the on-entry hook if this is the first
    /// tick in the current state, then the state's detection logic, which
    /// may call `transfer` into the next state.
    pub fn tick(&mut self, inputs: FsmInputs) -> FsmOutputs {
        let entered = self.consume_on_enter();
        if entered {
            self.on_enter(inputs.now_ms);
        }

        let elapsed_ms = inputs.now_ms.saturating_sub(self.entry_ms);
        let r = self.config.thresholds.sampler_ratio;

        match self.state {
            FlightState::Startup => self.transfer(FlightState::IdleSafe),
            FlightState::IdleSafe => self.transfer(FlightState::Armed),
            FlightState::Armed => self.transfer(FlightState::PadPreop),

            FlightState::PadPreop => {
                self.sampler.push(inputs.acc_magnitude_g);
                if self.sampler.over_by_under(r) {
                    self.transfer(FlightState::Powered);
                }
            }

            FlightState::Powered => {
                self.sampler.push(inputs.acc_magnitude_g);
                let t = self.config.thresholds;
                let timed_out = elapsed_ms >= t.burnout_max_ms;
                let detected = elapsed_ms >= t.burnout_min_ms && self.sampler.under_by_over(r);
                if timed_out || detected {
                    self.transfer(FlightState::Coasting);
                }
            }

            FlightState::Coasting => {
                self.sampler.push(inputs.velocity_ms);
                let t = self.config.thresholds;
                let timed_out = elapsed_ms >= t.apogee_max_ms;
                let detected = elapsed_ms >= t.apogee_min_ms && self.sampler.under_by_over(r);
                if timed_out || detected {
                    self.transfer(FlightState::DrogueDeploy);
                }
            }

            FlightState::DrogueDeploy => self.transfer(FlightState::DrogueDescend),

            FlightState::DrogueDescend => {
                self.sampler.push(inputs.altitude_m);
                if self.sampler.under_by_over(r) {
                    self.transfer(FlightState::MainDeploy);
                }
            }

            FlightState::MainDeploy => self.transfer(FlightState::MainDescend),

            FlightState::MainDescend => {
                self.sampler.push(inputs.velocity_ms.abs());
                if self.sampler.under_by_over(r) {
                    self.transfer(FlightState::Landed);
                }
            }

            // Awaits an external disarm command; see `disarm`.
            FlightState::Landed => {}
            FlightState::RecoveredSafe => {}
        }

        FsmOutputs {
            state: self.state,
            entered,
            led_on: self.state.led_on(),
            actuator: self.actuator,
        }
    }

    /// External ground/debug command: the only way out of `Landed`, since
    /// nothing in the sensor stream can distinguish "landed" from
    /// "recovered and being carried back to the pad".
    pub fn disarm(&mut self) {
        if self.state == FlightState::Landed {
            self.transfer(FlightState::RecoveredSafe);
        }
    }

    /// Returns `true` exactly once per state entry: the first tick whose
    /// state differs from the state recorded at the end of the previous
    /// tick's evaluation.
    fn consume_on_enter(&mut self) -> bool {
        if self.prev == Some(self.state) {
            false
        } else {
            self.prev = Some(self.state);
            true
        }
    }

    fn transfer(&mut self, next: FlightState) {
        self.prev = Some(self.state);
        self.state = next;
    }

    /// On-entry actions: reset/reconfigure the shared detection sampler,
    /// record the entry timestamp, and fire deployment actuators. Idempotent
    /// on repeat since it only runs on the tick `consume_on_enter` latches.
    fn on_enter(&mut self, now_ms: u32) {
        self.entry_ms = now_ms;
        let t = self.config.thresholds;
        let fsm_dt_ms = self.config.periods.fsm_eval_ms.max(1);
        let cap_from_window = |window_ms: u32| (window_ms / fsm_dt_ms).max(1) as usize;

        match self.state {
            FlightState::PadPreop => {
                self.sampler.reset(cap_from_window(t.launch_ton_ms), t.launch_acc_g);
            }
            FlightState::Powered => {
                self.sampler.reset(cap_from_window(t.burnout_ton_ms), t.burnout_acc_g);
            }
            FlightState::Coasting => {
                self.sampler.reset(cap_from_window(t.apogee_ton_ms), t.apogee_vel_ms);
            }
            FlightState::DrogueDeploy => {
                self.actuator.set(
                    DeploymentChannel::Drogue,
                    DeploymentState::Released,
                    &self.config.servo,
                );
            }
            FlightState::DrogueDescend => {
                self.sampler
                    .reset(cap_from_window(t.main_ton_ms), t.main_alt_compensated_m());
            }
            FlightState::MainDeploy => {
                self.actuator.set(
                    DeploymentChannel::Main,
                    DeploymentState::Released,
                    &self.config.servo,
                );
            }
            FlightState::MainDescend => {
                self.sampler.reset(cap_from_window(t.landed_ton_ms), t.landed_vel_ms);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boots_through_the_always_states_within_three_ticks() {
        let mut fsm = FlightFsm::new(FlightConfig::default());
        for _ in 0..3 {
            fsm.tick(FsmInputs {
                now_ms: 0,
                acc_magnitude_g: 1.0,
                altitude_m: 0.0,
                velocity_ms: 0.0,
            });
        }
        assert_eq!(fsm.state(), FlightState::PadPreop);
    }

    #[test]
    fn on_enter_fires_exactly_once_per_entry() {
        let mut fsm = FlightFsm::new(FlightConfig::default());
        let mut entry_count = 0;
        for i in 0..10 {
            let out = fsm.tick(FsmInputs {
                now_ms: i * 5,
                acc_magnitude_g: 1.0,
                altitude_m: 0.0,
                velocity_ms: 0.0,
            });
            if out.entered {
                entry_count += 1;
            }
        }
        // Startup, IdleSafe, Armed, PadPreop: exactly one entry each within 10 ticks.
        assert_eq!(entry_count, 4);
    }

    #[test]
    fn pad_idle_stays_in_pad_preop_under_gravity_only() {
        let mut fsm = FlightFsm::new(FlightConfig::default());
        let mut now = 0u32;
        for _ in 0..2000 {
            now += 5;
            fsm.tick(FsmInputs {
                now_ms: now,
                acc_magnitude_g: 1.0,
                altitude_m: 0.0,
                velocity_ms: 0.0,
            });
        }
        assert_eq!(fsm.state(), FlightState::PadPreop);
    }

    #[test]
    fn sustained_launch_acceleration_triggers_powered_and_not_before() {
        let cfg = FlightConfig::default();
        let mut fsm = FlightFsm::new(cfg);
        let mut now = 0u32;
        // Drive through Startup/IdleSafe/Armed into PadPreop.
        for _ in 0..3 {
            now += 5;
            fsm.tick(FsmInputs { now_ms: now, acc_magnitude_g: 1.0, altitude_m: 0.0, velocity_ms: 0.0 });
        }
        assert_eq!(fsm.state(), FlightState::PadPreop);

        let launch_ticks = cfg.thresholds.launch_ton_ms / cfg.periods.fsm_eval_ms;
        for _ in 0..launch_ticks.saturating_sub(1) {
            now += 5;
            fsm.tick(FsmInputs {
                now_ms: now,
                acc_magnitude_g: cfg.thresholds.launch_acc_g + 2.0,
                altitude_m: 0.0,
                velocity_ms: 0.0,
            });
            assert_eq!(fsm.state(), FlightState::PadPreop, "transitioned before the window filled");
        }
        // One more tick completes the window and should latch the detection.
        now += 5;
        fsm.tick(FsmInputs {
            now_ms: now,
            acc_magnitude_g: cfg.thresholds.launch_acc_g + 2.0,
            altitude_m: 0.0,
            velocity_ms: 0.0,
        });
        assert_eq!(fsm.state(), FlightState::Powered);
    }

    #[test]
    fn burnout_and_apogee_timeouts_fire_without_their_detectors() {
        let mut cfg = FlightConfig::default();
        cfg.thresholds.burnout_max_ms = 100;
        cfg.thresholds.burnout_min_ms = 50;
        cfg.thresholds.apogee_max_ms = 100;
        cfg.thresholds.apogee_min_ms = 50;
        let mut fsm = FlightFsm::new(cfg);
        let mut now = 0u32;
        for _ in 0..3 {
            now += 5;
            fsm.tick(FsmInputs { now_ms: now, acc_magnitude_g: 1.0, altitude_m: 0.0, velocity_ms: 0.0 });
        }
        // Force straight into Powered by feeding a huge launch acceleration burst.
        let launch_ticks = cfg.thresholds.launch_ton_ms / cfg.periods.fsm_eval_ms + 1;
        for _ in 0..launch_ticks {
            now += 5;
            fsm.tick(FsmInputs {
                now_ms: now,
                acc_magnitude_g: cfg.thresholds.launch_acc_g + 5.0,
                altitude_m: 0.0,
                velocity_ms: 0.0,
            });
        }
        assert_eq!(fsm.state(), FlightState::Powered);

        // Never satisfy the burnout detector (acceleration stays high) but
        // let the hard timeout force the transition.
        let entry_now = now;
        while now - entry_now < 300 {
            now += 5;
            fsm.tick(FsmInputs {
                now_ms: now,
                acc_magnitude_g: cfg.thresholds.launch_acc_g + 5.0,
                altitude_m: 0.0,
                velocity_ms: 0.0,
            });
        }
        assert_eq!(fsm.state(), FlightState::Coasting);

        let entry_now = now;
        while now - entry_now < 300 {
            now += 5;
            fsm.tick(FsmInputs {
                now_ms: now,
                acc_magnitude_g: 1.0,
                altitude_m: 100.0,
                velocity_ms: 50.0, // never under the apogee velocity threshold
            });
        }
        assert_eq!(fsm.state(), FlightState::DrogueDeploy);
    }

    #[test]
    fn disarm_only_takes_effect_from_landed() {
        let mut fsm = FlightFsm::new(FlightConfig::default());
        fsm.disarm();
        assert_eq!(fsm.state(), FlightState::Startup);
    }

    #[test]
    fn led_is_off_during_powered_flight_and_on_elsewhere() {
        assert!(FlightState::Startup.led_on());
        assert!(!FlightState::Powered.led_on());
        assert!(!FlightState::Coasting.led_on());
        assert!(FlightState::Landed.led_on());
    }

    #[test]
    fn drogue_deploy_fires_actuator_and_advances_immediately() {
        let cfg = FlightConfig::default();
        let mut fsm = FlightFsm::new(cfg);
        let mut now = 0u32;
        for _ in 0..3 {
            now += 5;
            fsm.tick(FsmInputs { now_ms: now, acc_magnitude_g: 1.0, altitude_m: 0.0, velocity_ms: 0.0 });
        }
        let launch_ticks = cfg.thresholds.launch_ton_ms / cfg.periods.fsm_eval_ms + 1;
        for _ in 0..launch_ticks {
            now += 5;
            fsm.tick(FsmInputs {
                now_ms: now,
                acc_magnitude_g: cfg.thresholds.launch_acc_g + 5.0,
                altitude_m: 0.0,
                velocity_ms: 0.0,
            });
        }
        assert_eq!(fsm.state(), FlightState::Powered);
        // Force immediate burnout via the hard max timeout.
        let mut n2 = now;
        while fsm.state() == FlightState::Powered {
            n2 += 5;
            fsm.tick(FsmInputs { now_ms: n2, acc_magnitude_g: 20.0, altitude_m: 0.0, velocity_ms: 0.0 });
        }
        assert_eq!(fsm.state(), FlightState::Coasting);
        while fsm.state() == FlightState::Coasting {
            n2 += 5;
            fsm.tick(FsmInputs { now_ms: n2, acc_magnitude_g: 1.0, altitude_m: 100.0, velocity_ms: 50.0 });
        }
        assert_eq!(fsm.state(), FlightState::DrogueDescend);
        assert_eq!(fsm.actuator().drogue_pulse_us, cfg.servo.released_pulse_us);
    }
}
