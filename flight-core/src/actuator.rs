//! Actuator mapping: translate FSM deployment commands into servo pulse
//! widths and keep them refreshed against hardware glitches.
//!
//! The retain task exists because PWM-servo hardware can silently drift or
//! reset into an undefined position; continuously rewriting the target is
//! part of the contract, not a workaround for a software bug.

use crate::config::ServoGeometry;

/// One of the two recovery deployment channels. `Main` is reserved for a
/// second recovery event and is currently unused by the FSM transition
/// table beyond its own deploy/descend pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeploymentChannel {
    Drogue,
    Main,
}

/// Whether a deployment channel is holding its recovery device closed or
/// has fired it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeploymentState {
    /// Near `SERVO_MAX` pulse — 180 deg, retaining the recovery device.
    Locked,
    /// Near `SERVO_MIN` pulse — 0 deg, releasing the recovery device.
    Released,
}

/// Current servo set-point for both deployment channels, retained between
/// FSM transitions so the retain task always has a target to rewrite.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ActuatorCommand {
    pub drogue_pulse_us: u16,
    pub main_pulse_us: u16,
}

impl ActuatorCommand {
    /// Both channels locked — the boot/pad default.
    pub fn locked(geometry: &ServoGeometry) -> Self {
        Self {
            drogue_pulse_us: geometry.locked_pulse_us,
            main_pulse_us: geometry.locked_pulse_us,
        }
    }

    /// Set one channel's deployment state. Idempotent: calling this again
    /// with the same state is a no-op on the stored value.
    pub fn set(&mut self, channel: DeploymentChannel, state: DeploymentState, geometry: &ServoGeometry) {
        let pulse = match state {
            DeploymentState::Locked => geometry.locked_pulse_us,
            DeploymentState::Released => geometry.released_pulse_us,
        };
        match channel {
            DeploymentChannel::Drogue => self.drogue_pulse_us = pulse,
            DeploymentChannel::Main => self.main_pulse_us = pulse,
        }
    }

    pub fn pulse_us(&self, channel: DeploymentChannel) -> u16 {
        match channel {
            DeploymentChannel::Drogue => self.drogue_pulse_us,
            DeploymentChannel::Main => self.main_pulse_us,
        }
    }
}

/// Maps a 0-180 degree angle linearly onto `[min_pulse_us, max_pulse_us]`,
/// clamping both the input angle and the resulting pulse width.
pub fn angle_deg_to_pulse_us(angle_deg: f32, geometry: &ServoGeometry) -> u16 {
    let clamped_deg = angle_deg.clamp(0.0, 180.0);
    let span = (geometry.max_pulse_us - geometry.min_pulse_us) as f32;
    let pulse = geometry.min_pulse_us as f32 + (clamped_deg / 180.0) * span;
    clamp_pulse_us(pulse as u16, geometry)
}

/// Clamps a raw pulse width into `[min_pulse_us, max_pulse_us]`.
pub fn clamp_pulse_us(pulse_us: u16, geometry: &ServoGeometry) -> u16 {
    pulse_us.clamp(geometry.min_pulse_us, geometry.max_pulse_us)
}

/// A single hardware PWM output the retain task can rewrite. Kept narrow so
/// the retain logic below is hardware-agnostic and host-testable; the
/// embedded binary wires this to an `embassy-stm32` timer channel.
pub trait ServoChannel {
    fn write_pulse_us(&mut self, pulse_us: u16);
}

/// One tick of the deployment-retain task: rewrite both channels' targets
/// from `command`, clamped to the configured geometry. Called at 10 Hz so
/// transient glitches or a servo reset cannot leave the mechanism in an
/// undefined intermediate position.
pub fn retain_tick<D: ServoChannel, M: ServoChannel>(
    command: &ActuatorCommand,
    geometry: &ServoGeometry,
    drogue: &mut D,
    main: &mut M,
) {
    drogue.write_pulse_us(clamp_pulse_us(command.drogue_pulse_us, geometry));
    main.write_pulse_us(clamp_pulse_us(command.main_pulse_us, geometry));
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingChannel {
        last_pulse_us: u16,
    }

    impl ServoChannel for RecordingChannel {
        fn write_pulse_us(&mut self, pulse_us: u16) {
            self.last_pulse_us = pulse_us;
        }
    }

    #[test]
    fn locked_sets_both_channels_to_locked_pulse() {
        let geom = ServoGeometry::default();
        let cmd = ActuatorCommand::locked(&geom);
        assert_eq!(cmd.drogue_pulse_us, geom.locked_pulse_us);
        assert_eq!(cmd.main_pulse_us, geom.locked_pulse_us);
    }

    #[test]
    fn set_only_touches_the_named_channel() {
        let geom = ServoGeometry::default();
        let mut cmd = ActuatorCommand::locked(&geom);
        cmd.set(DeploymentChannel::Drogue, DeploymentState::Released, &geom);
        assert_eq!(cmd.drogue_pulse_us, geom.released_pulse_us);
        assert_eq!(cmd.main_pulse_us, geom.locked_pulse_us);
    }

    #[test]
    fn angle_mapping_is_linear_across_the_full_range() {
        let geom = ServoGeometry::default();
        assert_eq!(angle_deg_to_pulse_us(0.0, &geom), geom.min_pulse_us);
        assert_eq!(angle_deg_to_pulse_us(180.0, &geom), geom.max_pulse_us);
        let mid = angle_deg_to_pulse_us(90.0, &geom);
        let expected_mid = (geom.min_pulse_us + geom.max_pulse_us) / 2;
        assert!((mid as i32 - expected_mid as i32).abs() <= 1);
    }

    #[test]
    fn angle_input_is_clamped_outside_zero_to_one_eighty() {
        let geom = ServoGeometry::default();
        assert_eq!(angle_deg_to_pulse_us(-30.0, &geom), geom.min_pulse_us);
        assert_eq!(angle_deg_to_pulse_us(270.0, &geom), geom.max_pulse_us);
    }

    #[test]
    fn clamp_pulse_rejects_out_of_geometry_values() {
        let geom = ServoGeometry::default();
        assert_eq!(clamp_pulse_us(0, &geom), geom.min_pulse_us);
        assert_eq!(clamp_pulse_us(u16::MAX, &geom), geom.max_pulse_us);
    }

    #[test]
    fn retain_tick_rewrites_both_channels_every_call() {
        let geom = ServoGeometry::default();
        let cmd = ActuatorCommand::locked(&geom);
        let mut drogue = RecordingChannel { last_pulse_us: 0 };
        let mut main = RecordingChannel { last_pulse_us: 0 };
        retain_tick(&cmd, &geom, &mut drogue, &mut main);
        assert_eq!(drogue.last_pulse_us, geom.locked_pulse_us);
        assert_eq!(main.last_pulse_us, geom.locked_pulse_us);
    }
}
