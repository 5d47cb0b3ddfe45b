//! LED and animation configuration as held by the settings store.

use crate::types::{Buttons, Dpad};

/// Maximum number of LEDs a single button may drive.
pub const MAX_LEDS_PER_BUTTON: usize = 4;

/// Largest strip the firmware drives, button and player LEDs together.
pub const MAX_LEDS: usize = 100;

/// Number of player indicator LEDs.
pub const PLAYER_LED_COUNT: usize = 4;

/// Error type for LED configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Raw layout value does not name a known layout.
    UnknownLayout(u8),
    /// No data pin configured for the strip.
    NoDataPin,
    /// `leds_per_button` is zero or above [`MAX_LEDS_PER_BUTTON`].
    InvalidLedsPerButton(u8),
    /// A button index is not below the assigned button count.
    IndexOutOfRange(u8),
    /// Two buttons share the same logical index.
    DuplicateIndex(u8),
    /// A player LED slot points outside the strip.
    PlayerSlotOutOfRange(u8),
    /// A player LED slot overlaps a button LED or another player LED.
    PlayerSlotConflict(u8),
    /// The strip driver rejected the configuration.
    Driver(LedError),
}

impl From<LedError> for ConfigError {
    fn from(e: LedError) -> Self {
        ConfigError::Driver(e)
    }
}

/// Error type for LED strip operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedError {
    /// The data pin cannot drive a strip.
    UnsupportedPin(u8),
    /// Zero LEDs requested.
    EmptyStrip,
    /// More LEDs than the driver can address.
    TooManyLeds(usize),
    /// Color format not supported by the driver.
    UnsupportedFormat(LedFormat),
    /// The driver is still owned elsewhere.
    Busy,
    /// Transfer to the strip failed.
    Io,
}

/// Wire color order of the strip.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedFormat {
    #[default]
    Grb,
    Rgb,
    Grbw,
    Rgbw,
}

impl LedFormat {
    /// True for formats carrying a fourth white channel.
    #[must_use]
    pub const fn has_white(self) -> bool {
        matches!(self, LedFormat::Grbw | LedFormat::Rgbw)
    }
}

/// Physical arrangement of the buttons.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonLayout {
    #[default]
    Arcade,
    Hitbox,
    Wasd,
}

impl TryFrom<u8> for ButtonLayout {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ButtonLayout::Arcade),
            1 => Ok(ButtonLayout::Hitbox),
            2 => Ok(ButtonLayout::Wasd),
            other => Err(ConfigError::UnknownLayout(other)),
        }
    }
}

/// Every button that can own LEDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonLabel {
    Up,
    Down,
    Left,
    Right,
    B1,
    B2,
    B3,
    B4,
    L1,
    R1,
    L2,
    R2,
    S1,
    S2,
    L3,
    R3,
    A1,
    A2,
}

impl ButtonLabel {
    pub const COUNT: usize = 18;

    pub const ALL: [ButtonLabel; Self::COUNT] = [
        ButtonLabel::Up,
        ButtonLabel::Down,
        ButtonLabel::Left,
        ButtonLabel::Right,
        ButtonLabel::B1,
        ButtonLabel::B2,
        ButtonLabel::B3,
        ButtonLabel::B4,
        ButtonLabel::L1,
        ButtonLabel::R1,
        ButtonLabel::L2,
        ButtonLabel::R2,
        ButtonLabel::S1,
        ButtonLabel::S2,
        ButtonLabel::L3,
        ButtonLabel::R3,
        ButtonLabel::A1,
        ButtonLabel::A2,
    ];

    /// Bit of this button in the combined input mask (directions in the upper 16 bits).
    #[must_use]
    pub const fn mask(self) -> u32 {
        const fn dpad(d: Dpad) -> u32 {
            (d.0 as u32) << 16
        }
        const fn button(b: Buttons) -> u32 {
            b.0 as u32
        }
        match self {
            ButtonLabel::Up => dpad(Dpad::UP),
            ButtonLabel::Down => dpad(Dpad::DOWN),
            ButtonLabel::Left => dpad(Dpad::LEFT),
            ButtonLabel::Right => dpad(Dpad::RIGHT),
            ButtonLabel::B1 => button(Buttons::B1),
            ButtonLabel::B2 => button(Buttons::B2),
            ButtonLabel::B3 => button(Buttons::B3),
            ButtonLabel::B4 => button(Buttons::B4),
            ButtonLabel::L1 => button(Buttons::L1),
            ButtonLabel::R1 => button(Buttons::R1),
            ButtonLabel::L2 => button(Buttons::L2),
            ButtonLabel::R2 => button(Buttons::R2),
            ButtonLabel::S1 => button(Buttons::S1),
            ButtonLabel::S2 => button(Buttons::S2),
            ButtonLabel::L3 => button(Buttons::L3),
            ButtonLabel::R3 => button(Buttons::R3),
            ButtonLabel::A1 => button(Buttons::A1),
            ButtonLabel::A2 => button(Buttons::A2),
        }
    }

    const fn slot(self) -> usize {
        self as usize
    }
}

/// Logical LED index per button; `None` leaves the button unlit.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonIndices([Option<u8>; ButtonLabel::COUNT]);

impl ButtonIndices {
    pub const UNASSIGNED: Self = Self([None; ButtonLabel::COUNT]);

    #[must_use]
    pub const fn get(&self, label: ButtonLabel) -> Option<u8> {
        self.0[label.slot()]
    }

    pub fn set(&mut self, label: ButtonLabel, index: Option<u8>) {
        self.0[label.slot()] = index;
    }

    /// Builder-style variant of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, label: ButtonLabel, index: u8) -> Self {
        self.0[label.slot()] = Some(index);
        self
    }

    /// Number of buttons with an assigned index.
    #[must_use]
    pub fn assigned_count(&self) -> usize {
        self.0.iter().filter(|i| i.is_some()).count()
    }

    /// Check every assigned index is below `button_count` and unique.
    pub fn validate(&self, button_count: usize) -> Result<(), ConfigError> {
        let mut seen = [false; ButtonLabel::COUNT];
        for index in self.0.iter().flatten().copied() {
            let slot = usize::from(index);
            if slot >= button_count {
                return Err(ConfigError::IndexOutOfRange(index));
            }
            if seen[slot] {
                return Err(ConfigError::DuplicateIndex(index));
            }
            seen[slot] = true;
        }
        Ok(())
    }
}

/// Player indicator hardware.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PledType {
    #[default]
    None,
    /// Discrete LEDs on PWM pins, outside the strip.
    Pwm,
    /// Extra pixels on the addressable strip.
    Rgb,
}

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlayerLedOptions {
    pub kind: PledType,
    /// Strip position of each player LED when `kind` is [`PledType::Rgb`].
    pub slots: [Option<u8>; PLAYER_LED_COUNT],
}

impl PlayerLedOptions {
    pub const DISABLED: Self = Self {
        kind: PledType::None,
        slots: [None; PLAYER_LED_COUNT],
    };

    /// Number of strip pixels used by player LEDs.
    #[must_use]
    pub fn strip_slot_count(&self) -> usize {
        match self.kind {
            PledType::Rgb => self.slots.iter().flatten().count(),
            PledType::None | PledType::Pwm => 0,
        }
    }
}

/// Addressable LED configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedOptions {
    pub data_pin: Option<u8>,
    pub format: LedFormat,
    pub layout: ButtonLayout,
    pub leds_per_button: u8,
    pub brightness_maximum: u8,
    pub brightness_steps: u8,
    pub indices: ButtonIndices,
    pub player_leds: PlayerLedOptions,
}

impl LedOptions {
    /// Options with no strip attached.
    pub const DISABLED: Self = Self {
        data_pin: None,
        format: LedFormat::Grb,
        layout: ButtonLayout::Arcade,
        leds_per_button: 1,
        brightness_maximum: 255,
        brightness_steps: 5,
        indices: ButtonIndices::UNASSIGNED,
        player_leds: PlayerLedOptions::DISABLED,
    };

    /// Validate everything that does not depend on the strip driver.
    ///
    /// Returns the number of buttons with an assigned LED index.
    pub fn validate(&self) -> Result<usize, ConfigError> {
        if self.data_pin.is_none() {
            return Err(ConfigError::NoDataPin);
        }
        if self.leds_per_button == 0 || usize::from(self.leds_per_button) > MAX_LEDS_PER_BUTTON {
            return Err(ConfigError::InvalidLedsPerButton(self.leds_per_button));
        }
        let button_count = self.indices.assigned_count();
        self.indices.validate(button_count)?;
        Ok(button_count)
    }
}

impl Default for LedOptions {
    fn default() -> Self {
        Self::DISABLED
    }
}

/// Persisted animation engine options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AnimationOptions {
    pub base_animation: u8,
    pub brightness: u8,
    pub static_color: u8,
    pub pressed_color: u8,
    pub theme: u8,
    pub rainbow_cycle_ms: u16,
}

impl AnimationOptions {
    pub const DEFAULT: Self = Self {
        base_animation: 0,
        brightness: 3,
        static_color: 2,
        pressed_color: 1,
        theme: 0,
        rainbow_cycle_ms: 40,
    };
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}
