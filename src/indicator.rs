//! Ready indicator.

use embedded_hal::PwmPin;

/// The indicator runs at one twentieth of full brightness, enough to show
/// the board is up without lighting the bench.
const BRIGHTNESS_DIVISOR: u16 = 20;

/// Light the status indicator at a fixed low duty cycle.
///
/// Called once at startup, after the measurement hardware is ready. The
/// channel is enabled and never touched again; there is no corresponding
/// teardown.
pub fn indicate_ready<P>(led: &mut P)
where
    P: PwmPin<Duty = u16>,
{
    let duty = led.get_max_duty() / BRIGHTNESS_DIVISOR;
    led.set_duty(duty);
    led.enable();
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Led {
        duty: u16,
        enabled: bool,
    }

    impl PwmPin for Led {
        type Duty = u16;

        fn disable(&mut self) {
            self.enabled = false;
        }

        fn enable(&mut self) {
            self.enabled = true;
        }

        fn get_duty(&self) -> u16 {
            self.duty
        }

        fn get_max_duty(&self) -> u16 {
            u16::MAX
        }

        fn set_duty(&mut self, duty: u16) {
            self.duty = duty;
        }
    }

    #[test]
    fn indicator_is_dim_and_enabled() {
        let mut led = Led {
            duty: 0,
            enabled: false,
        };
        indicate_ready(&mut led);
        assert!(led.enabled);
        assert_eq!(led.duty, u16::MAX / 20);
    }
}
