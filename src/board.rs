//! Board definition: LED data pin and the default LED configuration.
//!
//! Button GPIOs are claimed in `main`; the LED data pin here must match the
//! pin handed to the strip factory.

use fightstick_core::{
    ButtonIndices, ButtonLabel, ButtonLayout, LedFormat, LedOptions, PlayerLedOptions, PledType,
};

/// GPIO driving the WS2812 data line.
pub const LED_DATA_PIN: u8 = 14;

/// GPIOs of the discrete player LEDs 1 to 4: PWM slice 2 A/B, slice 5 A/B.
pub const PLED_PINS: [u8; 4] = [20, 21, 26, 27];

#[cfg(not(feature = "arcade-layout"))]
const LAYOUT: ButtonLayout = ButtonLayout::Hitbox;
#[cfg(feature = "arcade-layout")]
const LAYOUT: ButtonLayout = ButtonLayout::Arcade;

/// Strip order of the button LEDs, one LED per button.
fn button_indices() -> ButtonIndices {
    ButtonIndices::UNASSIGNED
        .with(ButtonLabel::Left, 0)
        .with(ButtonLabel::Down, 1)
        .with(ButtonLabel::Right, 2)
        .with(ButtonLabel::Up, 3)
        .with(ButtonLabel::B3, 4)
        .with(ButtonLabel::B4, 5)
        .with(ButtonLabel::R1, 6)
        .with(ButtonLabel::L1, 7)
        .with(ButtonLabel::B1, 8)
        .with(ButtonLabel::B2, 9)
        .with(ButtonLabel::R2, 10)
        .with(ButtonLabel::L2, 11)
}

/// Factory LED settings used until the user stores others.
#[must_use]
pub fn default_led_options() -> LedOptions {
    LedOptions {
        data_pin: Some(LED_DATA_PIN),
        format: LedFormat::Grb,
        layout: LAYOUT,
        leds_per_button: 1,
        brightness_maximum: 100,
        brightness_steps: 5,
        indices: button_indices(),
        player_leds: player_leds(),
    }
}

/// Four player LEDs chained after the twelve button LEDs.
#[cfg(not(feature = "pwm-player-leds"))]
fn player_leds() -> PlayerLedOptions {
    PlayerLedOptions {
        kind: PledType::Rgb,
        slots: [Some(12), Some(13), Some(14), Some(15)],
    }
}

#[cfg(feature = "pwm-player-leds")]
fn player_leds() -> PlayerLedOptions {
    PlayerLedOptions {
        kind: PledType::Pwm,
        slots: [None; 4],
    }
}
