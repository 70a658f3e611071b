//! `flight_core::actuator::ServoChannel` wired to an `embassy-stm32` PWM
//! timer channel. The timer is configured for a 50 Hz period elsewhere at
//! init; this only ever rewrites the duty cycle for a given pulse width.

use embassy_stm32::timer::simple_pwm::{Channel as PwmChannel, SimplePwm};
use embassy_stm32::timer::GeneralInstance4Channel;

use flight_core::actuator::ServoChannel;

/// Nominal servo PWM period, microseconds (50 Hz).
const PERIOD_US: u32 = 20_000;

pub struct ServoPwm<'d, T: GeneralInstance4Channel> {
    pwm: SimplePwm<'d, T>,
    channel: PwmChannel,
}

impl<'d, T: GeneralInstance4Channel> ServoPwm<'d, T> {
    pub fn new(mut pwm: SimplePwm<'d, T>, channel: PwmChannel) -> Self {
        pwm.enable(channel);
        Self { pwm, channel }
    }
}

impl<'d, T: GeneralInstance4Channel> ServoChannel for ServoPwm<'d, T> {
    fn write_pulse_us(&mut self, pulse_us: u16) {
        let max_duty = self.pwm.get_max_duty() as u32;
        let duty = (pulse_us as u32 * max_duty / PERIOD_US).min(max_duty) as u16;
        self.pwm.set_duty(self.channel, duty);
    }
}
