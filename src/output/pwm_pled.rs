//! Player LEDs on PWM slices 2 and 5 (see [`crate::board::PLED_PINS`]).

use embassy_rp::pwm::{Config, Pwm};
use fightstick_core::pled::PLED_MAX_LEVEL;
use fightstick_core::{PledOutput, PLAYER_LED_COUNT};

/// Counter configuration for a player LED slice, LEDs off.
#[must_use]
pub fn pled_pwm_config() -> Config {
    let mut config = Config::default();
    // A compare value of PLED_MAX_LEVEL then keeps the output high for the whole period.
    config.top = PLED_MAX_LEVEL - 1;
    config.compare_a = 0;
    config.compare_b = 0;
    config
}

/// Four player LEDs driven by two PWM slices, two LEDs per slice.
pub struct PwmPlayerLeds {
    slices: [Pwm<'static>; 2],
    configs: [Config; 2],
    levels: [u16; PLAYER_LED_COUNT],
}

impl PwmPlayerLeds {
    /// `low` drives player LEDs 1 and 2 on channels A and B, `high` LEDs 3 and 4.
    pub fn new(low: Pwm<'static>, high: Pwm<'static>) -> Self {
        Self {
            slices: [low, high],
            configs: [pled_pwm_config(), pled_pwm_config()],
            levels: [0; PLAYER_LED_COUNT],
        }
    }
}

impl PledOutput for PwmPlayerLeds {
    fn set_levels(&mut self, levels: &[u16; PLAYER_LED_COUNT]) {
        if self.levels == *levels {
            return;
        }
        self.levels = *levels;
        for ((pwm, config), pair) in self
            .slices
            .iter_mut()
            .zip(self.configs.iter_mut())
            .zip(levels.chunks_exact(2))
        {
            config.compare_a = pair[0];
            config.compare_b = pair[1];
            pwm.set_config(config);
        }
    }
}
