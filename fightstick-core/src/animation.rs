//! Animation engine surface and the built-in [`AnimationStation`].
//!
//! The LED module only talks to the engine through [`AnimationEngine`]: it
//! forwards hotkeys and pressed pixels, asks for a new frame every tick and
//! reads it back with brightness applied.

use embassy_time::{Duration, Instant};
use heapless::Vec;
use smart_leds::RGB8;

use crate::hotkey::AnimationHotkey;
use crate::matrix::{Matrix, Pixel, MAX_PIXELS};
use crate::options::{AnimationOptions, ButtonLabel, ButtonLayout, LedOptions, MAX_LEDS};

/// Capability surface of an LED animation engine.
pub trait AnimationEngine {
    /// Apply a hotkey action (mode, brightness or parameter change).
    fn handle_event(&mut self, hotkey: AnimationHotkey);

    /// Highlight the given pixels until the next call or [`clear_pressed`](Self::clear_pressed).
    fn handle_pressed(&mut self, pressed: &[Pixel]);

    fn clear_pressed(&mut self);

    /// Advance the current animation to `now`.
    fn animate(&mut self, now: Instant);

    /// Write the current frame scaled by the active brightness into `frame`.
    fn apply_brightness(&self, frame: &mut [RGB8]);

    fn set_mode(&mut self, mode: u8);

    fn set_matrix(&mut self, matrix: &Matrix);

    fn configure_brightness(&mut self, maximum: u8, steps: u8);

    fn set_options(&mut self, options: AnimationOptions);

    fn options(&self) -> AnimationOptions;

    /// Seed the static color themes for the given LED configuration.
    fn add_static_themes(&mut self, options: &LedOptions);

    /// Active brightness, 0 (off) to 255.
    fn brightness(&self) -> u8;
}

pub const BLACK: RGB8 = RGB8::new(0, 0, 0);
pub const WHITE: RGB8 = RGB8::new(255, 255, 255);
pub const RED: RGB8 = RGB8::new(255, 0, 0);
pub const ORANGE: RGB8 = RGB8::new(255, 128, 0);
pub const YELLOW: RGB8 = RGB8::new(255, 255, 0);
pub const GREEN: RGB8 = RGB8::new(0, 255, 0);
pub const AQUA: RGB8 = RGB8::new(0, 255, 255);
pub const BLUE: RGB8 = RGB8::new(0, 0, 255);
pub const PURPLE: RGB8 = RGB8::new(128, 0, 255);
pub const MAGENTA: RGB8 = RGB8::new(255, 0, 255);

/// Colors selectable as static and pressed colors.
pub const PALETTE: [RGB8; 10] = [BLACK, WHITE, RED, ORANGE, YELLOW, GREEN, AQUA, BLUE, PURPLE, MAGENTA];

/// Themes the station can hold at once.
pub const MAX_THEMES: usize = 4;

const MIN_CYCLE_MS: u16 = 10;
const MAX_CYCLE_MS: u16 = 2000;
const CYCLE_STEP_MS: u16 = 10;

/// Hue distance between neighbouring pixels in the rainbow.
const RAINBOW_STRIDE: u8 = 14;

/// Per-button colors; buttons not listed stay dark.
pub type StaticTheme = Vec<(u32, RGB8), MAX_PIXELS>;

/// Base animations offered by [`AnimationStation`].
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AnimationMode {
    #[default]
    StaticColor,
    Rainbow,
    Chase,
    StaticTheme,
}

impl AnimationMode {
    pub const COUNT: u8 = 4;

    /// Mode for a stored index; out of range values wrap around.
    #[must_use]
    pub const fn from_index(index: u8) -> Self {
        match index % Self::COUNT {
            0 => AnimationMode::StaticColor,
            1 => AnimationMode::Rainbow,
            2 => AnimationMode::Chase,
            _ => AnimationMode::StaticTheme,
        }
    }

    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    #[must_use]
    pub const fn previous(self) -> Self {
        Self::from_index(self.index() + Self::COUNT - 1)
    }
}

/// Classic color wheel: 0 = red through green and blue back to red.
#[must_use]
pub fn wheel(mut position: u8) -> RGB8 {
    position = 255 - position;
    if position < 85 {
        return RGB8::new(255 - position * 3, 0, position * 3);
    }
    if position < 170 {
        position -= 85;
        return RGB8::new(0, position * 3, 255 - position * 3);
    }
    position -= 170;
    RGB8::new(position * 3, 255 - position * 3, 0)
}

fn cycle(value: u8, len: usize, forward: bool) -> u8 {
    let len = len.min(usize::from(u8::MAX)) as u8;
    if len == 0 {
        return 0;
    }
    let value = value % len;
    if forward {
        (value + 1) % len
    } else {
        (value + len - 1) % len
    }
}

/// Built-in animation engine.
pub struct AnimationStation {
    matrix: Matrix,
    mode: AnimationMode,
    options: AnimationOptions,
    brightness_maximum: u8,
    brightness_steps: u8,
    themes: Vec<StaticTheme, MAX_THEMES>,
    pressed: Vec<Pixel, MAX_PIXELS>,
    frame: [RGB8; MAX_LEDS],
    hue: u8,
    chase: usize,
    next_step: Instant,
}

impl AnimationStation {
    #[must_use]
    pub fn new() -> Self {
        Self {
            matrix: Matrix::empty(),
            mode: AnimationMode::default(),
            options: AnimationOptions::DEFAULT,
            brightness_maximum: u8::MAX,
            brightness_steps: 5,
            themes: Vec::new(),
            pressed: Vec::new(),
            frame: [BLACK; MAX_LEDS],
            hue: 0,
            chase: 0,
            next_step: Instant::MIN,
        }
    }

    #[must_use]
    pub fn mode(&self) -> AnimationMode {
        self.mode
    }

    /// Frame before brightness is applied.
    #[must_use]
    pub fn raw_frame(&self) -> &[RGB8] {
        &self.frame
    }

    #[must_use]
    pub fn theme_count(&self) -> usize {
        self.themes.len()
    }

    fn cycle_time(&self) -> Duration {
        let ms = self.options.rainbow_cycle_ms.clamp(MIN_CYCLE_MS, MAX_CYCLE_MS);
        Duration::from_millis(u64::from(ms))
    }

    fn paint(&mut self, pixel_positions: &[u8], color: RGB8) {
        for &p in pixel_positions {
            if let Some(slot) = self.frame.get_mut(usize::from(p)) {
                *slot = color;
            }
        }
    }

    fn step_due(&mut self, now: Instant) -> bool {
        if now < self.next_step {
            return false;
        }
        self.next_step = now + self.cycle_time();
        true
    }

    fn adjust_parameter(&mut self, forward: bool) {
        match self.mode {
            AnimationMode::StaticColor => {
                self.options.static_color = cycle(self.options.static_color, PALETTE.len(), forward);
            }
            AnimationMode::Rainbow | AnimationMode::Chase => {
                let ms = self.options.rainbow_cycle_ms;
                self.options.rainbow_cycle_ms = if forward {
                    ms.saturating_add(CYCLE_STEP_MS).min(MAX_CYCLE_MS)
                } else {
                    ms.saturating_sub(CYCLE_STEP_MS).max(MIN_CYCLE_MS)
                };
            }
            AnimationMode::StaticTheme => {
                self.options.theme = cycle(self.options.theme, self.themes.len(), forward);
            }
        }
    }
}

impl Default for AnimationStation {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationEngine for AnimationStation {
    fn handle_event(&mut self, hotkey: AnimationHotkey) {
        match hotkey {
            AnimationHotkey::None => {}
            AnimationHotkey::AnimationUp => self.set_mode(self.mode.next().index()),
            AnimationHotkey::AnimationDown => self.set_mode(self.mode.previous().index()),
            AnimationHotkey::BrightnessUp => {
                self.options.brightness =
                    self.options.brightness.saturating_add(1).min(self.brightness_steps);
            }
            AnimationHotkey::BrightnessDown => {
                self.options.brightness = self.options.brightness.min(self.brightness_steps).saturating_sub(1);
            }
            AnimationHotkey::ParameterUp => self.adjust_parameter(true),
            AnimationHotkey::ParameterDown => self.adjust_parameter(false),
            AnimationHotkey::PressParameterUp => {
                self.options.pressed_color = cycle(self.options.pressed_color, PALETTE.len(), true);
            }
            AnimationHotkey::PressParameterDown => {
                self.options.pressed_color = cycle(self.options.pressed_color, PALETTE.len(), false);
            }
        }
        debug!("animation event, mode {} brightness {}", self.mode.index(), self.options.brightness);
    }

    fn handle_pressed(&mut self, pressed: &[Pixel]) {
        self.pressed.clear();
        for pixel in pressed.iter().take(MAX_PIXELS) {
            let _ = self.pressed.push(pixel.clone());
        }
    }

    fn clear_pressed(&mut self) {
        self.pressed.clear();
    }

    fn animate(&mut self, now: Instant) {
        self.frame = [BLACK; MAX_LEDS];

        // Temporarily take the matrix so pixels can be painted into the frame.
        let matrix = core::mem::take(&mut self.matrix);
        match self.mode {
            AnimationMode::StaticColor => {
                let color = PALETTE[usize::from(self.options.static_color) % PALETTE.len()];
                for pixel in matrix.pixels() {
                    self.paint(&pixel.positions, color);
                }
            }
            AnimationMode::Rainbow => {
                if self.step_due(now) {
                    self.hue = self.hue.wrapping_add(1);
                }
                for (n, pixel) in matrix.pixels().enumerate() {
                    let offset = (n as u8).wrapping_mul(RAINBOW_STRIDE);
                    self.paint(&pixel.positions, wheel(self.hue.wrapping_add(offset)));
                }
            }
            AnimationMode::Chase => {
                let lit = matrix.pixels().filter(|p| !p.positions.is_empty()).count();
                if self.step_due(now) && lit > 0 {
                    self.chase = (self.chase + 1) % lit;
                    self.hue = self.hue.wrapping_add(RAINBOW_STRIDE);
                }
                if let Some(pixel) = matrix.pixels().filter(|p| !p.positions.is_empty()).nth(self.chase) {
                    self.paint(&pixel.positions, wheel(self.hue));
                }
            }
            AnimationMode::StaticTheme => {
                let theme = self.themes.get(usize::from(self.options.theme)).cloned();
                for pixel in matrix.pixels() {
                    let color = theme
                        .as_ref()
                        .and_then(|t| t.iter().find(|(mask, _)| *mask == pixel.mask))
                        .map_or(BLACK, |(_, c)| *c);
                    self.paint(&pixel.positions, color);
                }
            }
        }
        self.matrix = matrix;

        let pressed_color = PALETTE[usize::from(self.options.pressed_color) % PALETTE.len()];
        let pressed = core::mem::take(&mut self.pressed);
        for pixel in pressed.iter() {
            self.paint(&pixel.positions, pressed_color);
        }
        self.pressed = pressed;
    }

    fn apply_brightness(&self, frame: &mut [RGB8]) {
        let scaled = smart_leds::brightness(self.frame.iter().copied(), self.brightness());
        for (dst, color) in frame.iter_mut().zip(scaled) {
            *dst = color;
        }
    }

    fn set_mode(&mut self, mode: u8) {
        self.mode = AnimationMode::from_index(mode);
        self.options.base_animation = self.mode.index();
        self.chase = 0;
        self.next_step = Instant::MIN;
    }

    fn set_matrix(&mut self, matrix: &Matrix) {
        self.matrix = matrix.clone();
        self.pressed.clear();
        self.chase = 0;
    }

    fn configure_brightness(&mut self, maximum: u8, steps: u8) {
        self.brightness_maximum = maximum;
        self.brightness_steps = steps;
    }

    fn set_options(&mut self, options: AnimationOptions) {
        self.options = options;
        self.options.brightness = options.brightness.min(self.brightness_steps);
    }

    fn options(&self) -> AnimationOptions {
        self.options
    }

    fn add_static_themes(&mut self, options: &LedOptions) {
        self.themes.clear();

        // Hitbox sticks have Up on a thumb button, colored like the face buttons.
        let up = match options.layout {
            ButtonLayout::Hitbox => RED,
            ButtonLayout::Arcade | ButtonLayout::Wasd => WHITE,
        };
        let classic: &[(ButtonLabel, RGB8)] = &[
            (ButtonLabel::Up, up),
            (ButtonLabel::Down, WHITE),
            (ButtonLabel::Left, WHITE),
            (ButtonLabel::Right, WHITE),
            (ButtonLabel::B1, BLUE),
            (ButtonLabel::B2, RED),
            (ButtonLabel::B3, GREEN),
            (ButtonLabel::B4, YELLOW),
            (ButtonLabel::L1, ORANGE),
            (ButtonLabel::R1, ORANGE),
            (ButtonLabel::L2, PURPLE),
            (ButtonLabel::R2, PURPLE),
        ];
        let neon: &[(ButtonLabel, RGB8)] = &[
            (ButtonLabel::Up, AQUA),
            (ButtonLabel::Down, AQUA),
            (ButtonLabel::Left, AQUA),
            (ButtonLabel::Right, AQUA),
            (ButtonLabel::B1, MAGENTA),
            (ButtonLabel::B2, MAGENTA),
            (ButtonLabel::B3, MAGENTA),
            (ButtonLabel::B4, MAGENTA),
            (ButtonLabel::L1, MAGENTA),
            (ButtonLabel::R1, MAGENTA),
            (ButtonLabel::L2, MAGENTA),
            (ButtonLabel::R2, MAGENTA),
            (ButtonLabel::S1, WHITE),
            (ButtonLabel::S2, WHITE),
        ];

        for source in [classic, neon] {
            let theme: StaticTheme = source
                .iter()
                .map(|&(label, color)| (label.mask(), color))
                .collect();
            let _ = self.themes.push(theme);
        }
        self.options.theme %= self.themes.len() as u8;
    }

    fn brightness(&self) -> u8 {
        if self.brightness_steps == 0 {
            return self.brightness_maximum;
        }
        let level = u16::from(self.options.brightness.min(self.brightness_steps));
        (level * u16::from(self.brightness_maximum) / u16::from(self.brightness_steps)) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::build_layout;
    use crate::options::ButtonIndices;

    fn station_with(indices: ButtonIndices, count: usize) -> AnimationStation {
        let matrix = build_layout(ButtonLayout::Arcade, 1, count, &indices).unwrap();
        let mut station = AnimationStation::new();
        station.configure_brightness(255, 5);
        station.set_options(AnimationOptions {
            brightness: 5,
            static_color: 2,
            pressed_color: 1,
            ..AnimationOptions::DEFAULT
        });
        station.set_matrix(&matrix);
        station
    }

    #[test]
    fn test_mode_cycles_both_ways() {
        assert_eq!(AnimationMode::StaticColor.previous(), AnimationMode::StaticTheme);
        assert_eq!(AnimationMode::StaticTheme.next(), AnimationMode::StaticColor);
        assert_eq!(AnimationMode::from_index(5), AnimationMode::Rainbow);
    }

    #[test]
    fn test_static_color_and_pressed_override() {
        let ix = ButtonIndices::UNASSIGNED
            .with(ButtonLabel::B1, 0)
            .with(ButtonLabel::B2, 1);
        let mut station = station_with(ix, 2);
        let matrix = station.matrix.clone();

        station.animate(Instant::from_millis(0));
        assert_eq!(station.raw_frame()[0], RED);
        assert_eq!(station.raw_frame()[1], RED);

        station.handle_pressed(&matrix.pressed(ButtonLabel::B2.mask()));
        station.animate(Instant::from_millis(10));
        assert_eq!(station.raw_frame()[0], RED);
        assert_eq!(station.raw_frame()[1], WHITE);

        station.clear_pressed();
        station.animate(Instant::from_millis(20));
        assert_eq!(station.raw_frame()[1], RED);
    }

    #[test]
    fn test_brightness_levels() {
        let mut station = station_with(ButtonIndices::UNASSIGNED.with(ButtonLabel::B1, 0), 1);
        station.configure_brightness(100, 5);
        assert_eq!(station.brightness(), 100);

        station.handle_event(AnimationHotkey::BrightnessUp);
        assert_eq!(station.options().brightness, 5);

        station.handle_event(AnimationHotkey::BrightnessDown);
        assert_eq!(station.brightness(), 80);

        for _ in 0..10 {
            station.handle_event(AnimationHotkey::BrightnessDown);
        }
        assert_eq!(station.brightness(), 0);

        station.animate(Instant::from_millis(0));
        let mut frame = [WHITE; 4];
        station.apply_brightness(&mut frame);
        assert_eq!(frame, [BLACK; 4]);
    }

    #[test]
    fn test_brightness_up_saturates_at_255_steps() {
        let mut station = station_with(ButtonIndices::UNASSIGNED.with(ButtonLabel::B1, 0), 1);
        station.configure_brightness(255, 255);
        station.set_options(AnimationOptions {
            brightness: 255,
            ..station.options()
        });

        station.handle_event(AnimationHotkey::BrightnessUp);
        assert_eq!(station.options().brightness, 255);
        assert_eq!(station.brightness(), 255);
    }

    #[test]
    fn test_apply_brightness_full_scale() {
        let mut station = station_with(ButtonIndices::UNASSIGNED.with(ButtonLabel::B1, 0), 1);
        station.animate(Instant::from_millis(0));
        let mut frame = [BLACK; 2];
        station.apply_brightness(&mut frame);
        assert_eq!(frame, [RED, BLACK]);
    }

    #[test]
    fn test_hotkeys_change_mode_and_parameters() {
        let mut station = station_with(ButtonIndices::UNASSIGNED, 0);
        station.handle_event(AnimationHotkey::AnimationUp);
        assert_eq!(station.mode(), AnimationMode::Rainbow);
        assert_eq!(station.options().base_animation, 1);

        let before = station.options().rainbow_cycle_ms;
        station.handle_event(AnimationHotkey::ParameterUp);
        assert_eq!(station.options().rainbow_cycle_ms, before + CYCLE_STEP_MS);

        station.handle_event(AnimationHotkey::AnimationDown);
        station.handle_event(AnimationHotkey::AnimationDown);
        assert_eq!(station.mode(), AnimationMode::StaticTheme);

        station.handle_event(AnimationHotkey::PressParameterDown);
        assert_eq!(station.options().pressed_color, 0);
    }

    #[test]
    fn test_rainbow_advances_on_cycle() {
        let mut station = station_with(ButtonIndices::UNASSIGNED.with(ButtonLabel::B3, 0), 1);
        station.set_mode(AnimationMode::Rainbow.index());
        station.animate(Instant::from_millis(0));
        let first = station.raw_frame()[0];
        station.animate(Instant::from_millis(1));
        assert_eq!(station.raw_frame()[0], first);
        station.animate(Instant::from_millis(1000));
        assert_ne!(station.raw_frame()[0], first);
    }

    #[test]
    fn test_static_theme_colors_by_button() {
        let ix = ButtonIndices::UNASSIGNED
            .with(ButtonLabel::B1, 0)
            .with(ButtonLabel::Up, 1)
            .with(ButtonLabel::A1, 2);
        let mut station = station_with(ix, 3);
        let mut options = LedOptions::DISABLED;
        options.layout = ButtonLayout::Hitbox;
        station.add_static_themes(&options);
        assert_eq!(station.theme_count(), 2);

        station.set_mode(AnimationMode::StaticTheme.index());
        station.animate(Instant::from_millis(0));
        assert_eq!(&station.raw_frame()[..3], &[BLUE, RED, BLACK]);
    }
}
