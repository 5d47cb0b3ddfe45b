//! Core gamepad types: Buttons, Dpad, AnalogStick, GamepadState, GamepadSnapshot.

use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

/// Size of a USB feature/output report carried across cores.
pub const FEATURE_REPORT_SIZE: usize = 32;

/// Raw feature report bytes as received from the USB host.
pub type FeatureReport = [u8; FEATURE_REPORT_SIZE];

/// Action and system buttons as a bitfield.
///
/// Fourteen buttons are defined (B1-B4, shoulders, stick clicks, system
/// and auxiliary buttons). Directions live in [`Dpad`].
///
/// # Example
///
/// ```
/// use fightstick_core::Buttons;
///
/// let buttons = Buttons::B1 | Buttons::B2;
/// assert!(buttons.contains(Buttons::B1));
/// assert!(buttons.contains(Buttons::B2));
/// assert!(!buttons.contains(Buttons::B3));
/// ```
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Buttons(pub u16);

impl Buttons {
    pub const B1: Self = Self(1 << 0);
    pub const B2: Self = Self(1 << 1);
    pub const B3: Self = Self(1 << 2);
    pub const B4: Self = Self(1 << 3);
    pub const L1: Self = Self(1 << 4);
    pub const R1: Self = Self(1 << 5);
    pub const L2: Self = Self(1 << 6);
    pub const R2: Self = Self(1 << 7);
    pub const S1: Self = Self(1 << 8); // Select/Back
    pub const S2: Self = Self(1 << 9); // Start
    pub const L3: Self = Self(1 << 10);
    pub const R3: Self = Self(1 << 11);
    pub const A1: Self = Self(1 << 12); // Home/Guide
    pub const A2: Self = Self(1 << 13); // Capture

    /// No buttons pressed.
    pub const NONE: Self = Self(0);

    /// Check if the given button(s) are pressed.
    #[inline]
    #[must_use]
    pub const fn contains(self, button: Buttons) -> bool {
        (self.0 & button.0) == button.0
    }

    /// Check if the given button is pressed (alias for contains).
    #[inline]
    #[must_use]
    pub const fn is_pressed(self, button: Buttons) -> bool {
        self.contains(button)
    }

    /// Set or clear button(s).
    #[inline]
    pub fn set(&mut self, button: Buttons, pressed: bool) {
        if pressed {
            self.0 |= button.0;
        } else {
            self.0 &= !button.0;
        }
    }

    /// Get the raw u16 value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Check if no buttons are pressed.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Buttons {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Buttons {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Buttons {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for Buttons {
    #[inline]
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl Not for Buttons {
    type Output = Self;

    #[inline]
    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

/// Directional input as a 4-bit field.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Dpad(pub u8);

impl Dpad {
    pub const UP: Self = Self(1 << 0);
    pub const DOWN: Self = Self(1 << 1);
    pub const LEFT: Self = Self(1 << 2);
    pub const RIGHT: Self = Self(1 << 3);

    pub const NONE: Self = Self(0);

    /// HID hat value reported when no direction is held.
    pub const HAT_NEUTRAL: u8 = 8;

    #[inline]
    #[must_use]
    pub const fn contains(self, direction: Dpad) -> bool {
        (self.0 & direction.0) == direction.0
    }

    #[inline]
    pub fn set(&mut self, direction: Dpad, pressed: bool) {
        if pressed {
            self.0 |= direction.0;
        } else {
            self.0 &= !direction.0;
        }
    }

    /// Convert to a HID hat switch value (0 = up, clockwise, 8 = neutral).
    ///
    /// Opposing directions cancel each other out.
    #[must_use]
    pub const fn to_hat(self) -> u8 {
        let up = self.contains(Self::UP) && !self.contains(Self::DOWN);
        let down = self.contains(Self::DOWN) && !self.contains(Self::UP);
        let left = self.contains(Self::LEFT) && !self.contains(Self::RIGHT);
        let right = self.contains(Self::RIGHT) && !self.contains(Self::LEFT);

        match (up, down, left, right) {
            (true, _, false, false) => 0,
            (true, _, _, true) => 1,
            (false, false, false, true) => 2,
            (_, true, _, true) => 3,
            (_, true, false, false) => 4,
            (_, true, true, _) => 5,
            (false, false, true, false) => 6,
            (true, _, true, _) => 7,
            _ => Self::HAT_NEUTRAL,
        }
    }
}

/// Analog stick with X/Y axes.
///
/// Range: [-32768, 32767] for full precision.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AnalogStick {
    pub x: i16,
    pub y: i16,
}

impl AnalogStick {
    #[must_use]
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }

    pub const NEUTRAL: Self = Self { x: 0, y: 0 };
}

/// Complete gamepad input state.
///
/// Digital inputs are split into [`Dpad`] and [`Buttons`]; the combined
/// 32-bit input mask places directions in the upper half.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GamepadState {
    pub dpad: Dpad,
    pub buttons: Buttons,
    pub left_stick: AnalogStick,
    pub right_stick: AnalogStick,
    pub left_trigger: u8,
    pub right_trigger: u8,
}

impl GamepadState {
    /// Create a zeroed/neutral gamepad state (no buttons pressed, sticks centered).
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            dpad: Dpad::NONE,
            buttons: Buttons::NONE,
            left_stick: AnalogStick::NEUTRAL,
            right_stick: AnalogStick::NEUTRAL,
            left_trigger: 0,
            right_trigger: 0,
        }
    }

    /// Combined digital input mask: `dpad << 16 | buttons`.
    #[inline]
    #[must_use]
    pub const fn input_mask(&self) -> u32 {
        ((self.dpad.0 as u32) << 16) | self.buttons.0 as u32
    }

    /// Replace the digital inputs from a combined input mask.
    #[inline]
    pub fn set_input_mask(&mut self, mask: u32) {
        self.dpad = Dpad(((mask >> 16) & 0x0F) as u8);
        self.buttons = Buttons((mask & 0xFFFF) as u16);
    }
}

/// USB personality negotiated at boot.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputMode {
    /// Xbox 360 compatible; the only mode that carries player LED commands.
    #[default]
    XInput,
    /// Nintendo Switch compatible.
    Switch,
    /// Generic HID gamepad.
    Hid,
    /// Web configuration mode; peripherals idle.
    Config,
}

/// Default modifier for hotkeys: S1 + S2 held together.
pub const DEFAULT_F1_MASK: Buttons = Buttons(Buttons::S1.0 | Buttons::S2.0);

/// One Core 0 poll cycle worth of input, passed by value to Core 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GamepadSnapshot {
    pub state: GamepadState,
    /// Buttons that together form the F1 hotkey modifier.
    pub f1_mask: Buttons,
    pub input_mode: InputMode,
}

impl GamepadSnapshot {
    #[must_use]
    pub const fn new(state: GamepadState, input_mode: InputMode) -> Self {
        Self {
            state,
            f1_mask: DEFAULT_F1_MASK,
            input_mode,
        }
    }

    /// True when every modifier button is held.
    #[inline]
    #[must_use]
    pub const fn pressed_f1(&self) -> bool {
        !self.f1_mask.is_empty() && self.state.buttons.contains(self.f1_mask)
    }
}

impl Default for GamepadSnapshot {
    fn default() -> Self {
        Self::new(GamepadState::neutral(), InputMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buttons_bitwise_or() {
        let buttons = Buttons::B1 | Buttons::B2;
        assert!(buttons.contains(Buttons::B1));
        assert!(buttons.contains(Buttons::B2));
        assert!(!buttons.contains(Buttons::B3));
    }

    #[test]
    fn test_buttons_set_clear() {
        let mut buttons = Buttons::NONE;
        buttons.set(Buttons::R2, true);
        assert!(buttons.is_pressed(Buttons::R2));
        buttons.set(Buttons::R2, false);
        assert!(!buttons.is_pressed(Buttons::R2));
    }

    #[test]
    fn test_input_mask_places_dpad_high() {
        let mut state = GamepadState::neutral();
        state.dpad = Dpad::LEFT;
        state.buttons = Buttons::B1;
        assert_eq!(state.input_mask(), (1 << 18) | 1);

        let mut copy = GamepadState::neutral();
        copy.set_input_mask(state.input_mask());
        assert_eq!(copy, state);
    }

    #[test]
    fn test_hat_values() {
        assert_eq!(Dpad::NONE.to_hat(), Dpad::HAT_NEUTRAL);
        assert_eq!(Dpad::UP.to_hat(), 0);
        assert_eq!((Dpad(Dpad::UP.0 | Dpad::RIGHT.0)).to_hat(), 1);
        assert_eq!(Dpad::RIGHT.to_hat(), 2);
        assert_eq!((Dpad(Dpad::DOWN.0 | Dpad::RIGHT.0)).to_hat(), 3);
        assert_eq!(Dpad::DOWN.to_hat(), 4);
        assert_eq!((Dpad(Dpad::DOWN.0 | Dpad::LEFT.0)).to_hat(), 5);
        assert_eq!(Dpad::LEFT.to_hat(), 6);
        assert_eq!((Dpad(Dpad::UP.0 | Dpad::LEFT.0)).to_hat(), 7);
    }

    #[test]
    fn test_hat_opposites_cancel() {
        assert_eq!(Dpad(Dpad::LEFT.0 | Dpad::RIGHT.0).to_hat(), Dpad::HAT_NEUTRAL);
        assert_eq!(Dpad(Dpad::UP.0 | Dpad::DOWN.0 | Dpad::LEFT.0).to_hat(), 6);
    }

    #[test]
    fn test_pressed_f1_requires_all_modifier_bits() {
        let mut snapshot = GamepadSnapshot::default();
        snapshot.state.buttons = Buttons::S1;
        assert!(!snapshot.pressed_f1());
        snapshot.state.buttons |= Buttons::S2;
        assert!(snapshot.pressed_f1());
    }
}
