use embassy_rp::gpio::Input;
use fightstick_core::{ButtonLabel, GamepadState};

/// Direct-wired buttons, one pulled-up GPIO per button.
///
/// A button reads as pressed while its pin is pulled to ground.
pub struct GpioButtons<'d> {
    pins: [Input<'d>; ButtonLabel::COUNT],
}

impl<'d> GpioButtons<'d> {
    /// `pins` must be ordered like [`ButtonLabel::ALL`].
    pub fn new(pins: [Input<'d>; ButtonLabel::COUNT]) -> Self {
        Self { pins }
    }

    /// Raw combined input mask, undebounced.
    #[must_use]
    pub fn read_mask(&self) -> u32 {
        ButtonLabel::ALL
            .iter()
            .zip(self.pins.iter())
            .filter(|(_, pin)| pin.is_low())
            .fold(0, |mask, (label, _)| mask | label.mask())
    }

    /// Sample every button into a gamepad state with neutral sticks.
    #[must_use]
    pub fn read(&self) -> GamepadState {
        let mut state = GamepadState::neutral();
        state.set_input_mask(self.read_mask());
        state
    }
}
