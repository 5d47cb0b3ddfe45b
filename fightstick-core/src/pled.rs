//! Player indicator LEDs: XInput LED command decoding, level animation and
//! the module driving discrete PWM player LEDs.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Instant};

use crate::leds::FRAME_INTERVAL;
use crate::options::{PledType, PLAYER_LED_COUNT};
use crate::queue::FeatureQueue;
use crate::storage::Storage;
use crate::types::{GamepadSnapshot, InputMode};

/// Report type byte of an XInput LED command.
pub const XINPUT_LED_REPORT: u8 = 0x01;

/// Full brightness level of a player LED.
pub const PLED_MAX_LEVEL: u16 = 0xFFFF;

/// XInput LED pattern codes carried in byte 2 of the LED command.
pub mod xinput {
    pub const OFF: u8 = 0x00;
    pub const BLINK_ALL: u8 = 0x01;
    pub const FLASH1: u8 = 0x02;
    pub const FLASH2: u8 = 0x03;
    pub const FLASH3: u8 = 0x04;
    pub const FLASH4: u8 = 0x05;
    pub const ON1: u8 = 0x06;
    pub const ON2: u8 = 0x07;
    pub const ON3: u8 = 0x08;
    pub const ON4: u8 = 0x09;
    pub const ROTATE: u8 = 0x0A;
    pub const BLINK: u8 = 0x0B;
    pub const SLOW_BLINK: u8 = 0x0C;
    pub const ALTERNATE: u8 = 0x0D;
}

/// Bitmask of lit player LEDs.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PledState(pub u8);

impl PledState {
    pub const NONE: Self = Self(0);
    pub const LED1: Self = Self(1 << 0);
    pub const LED2: Self = Self(1 << 1);
    pub const LED3: Self = Self(1 << 2);
    pub const LED4: Self = Self(1 << 3);
    pub const ALL: Self = Self(0x0F);

    /// True if player LED `n` (0-based) is part of the state.
    #[must_use]
    pub const fn is_lit(self, n: usize) -> bool {
        n < PLAYER_LED_COUNT && self.0 & (1 << n) != 0
    }
}

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PledAnimation {
    #[default]
    None,
    Solid,
    Blink,
}

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PledSpeed {
    #[default]
    Off,
    Fast,
}

impl PledSpeed {
    /// Toggle period of a blinking animation at this speed.
    #[must_use]
    pub const fn period(self) -> Option<Duration> {
        match self {
            PledSpeed::Off => None,
            PledSpeed::Fast => Some(Duration::from_millis(100)),
        }
    }
}

/// Requested player LED animation.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PledAnimationState {
    pub state: PledState,
    pub animation: PledAnimation,
    pub speed: PledSpeed,
}

impl PledAnimationState {
    pub const NONE: Self = Self {
        state: PledState::NONE,
        animation: PledAnimation::None,
        speed: PledSpeed::Off,
    };

    const fn solid(state: PledState) -> Self {
        Self {
            state,
            animation: PledAnimation::Solid,
            speed: PledSpeed::Off,
        }
    }
}

/// Decode an XInput LED command into an animation request.
///
/// Unknown report types, unknown patterns and short buffers all decode to
/// [`PledAnimationState::NONE`].
#[must_use]
pub fn decode_xinput(report: &[u8]) -> PledAnimationState {
    let (Some(&kind), Some(&pattern)) = (report.first(), report.get(2)) else {
        return PledAnimationState::NONE;
    };
    if kind != XINPUT_LED_REPORT {
        return PledAnimationState::NONE;
    }

    match pattern {
        xinput::BLINK_ALL | xinput::ROTATE | xinput::BLINK | xinput::SLOW_BLINK | xinput::ALTERNATE => {
            PledAnimationState {
                state: PledState::ALL,
                animation: PledAnimation::Blink,
                speed: PledSpeed::Fast,
            }
        }
        xinput::FLASH1 | xinput::ON1 => PledAnimationState::solid(PledState::LED1),
        xinput::FLASH2 | xinput::ON2 => PledAnimationState::solid(PledState::LED2),
        xinput::FLASH3 | xinput::ON3 => PledAnimationState::solid(PledState::LED3),
        xinput::FLASH4 | xinput::ON4 => PledAnimationState::solid(PledState::LED4),
        _ => PledAnimationState::NONE,
    }
}

/// Turns the requested animation into per-LED levels over time.
#[derive(Debug, Default)]
pub struct PlayerLeds {
    current: PledAnimationState,
    levels: [u16; PLAYER_LED_COUNT],
    blink_on: bool,
    next_toggle: Option<Instant>,
}

impl PlayerLeds {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: PledAnimationState::NONE,
            levels: [0; PLAYER_LED_COUNT],
            blink_on: false,
            next_toggle: None,
        }
    }

    /// Current level of every player LED, `0..=PLED_MAX_LEVEL`.
    #[must_use]
    pub fn levels(&self) -> &[u16; PLAYER_LED_COUNT] {
        &self.levels
    }

    /// Advance the animation to `now`, optionally switching to a new request.
    ///
    /// A blink starts in the lit phase whenever the request changes.
    pub fn animate(&mut self, request: Option<PledAnimationState>, now: Instant) {
        if let Some(request) = request {
            if request != self.current {
                self.current = request;
                self.blink_on = true;
                self.next_toggle = request.speed.period().map(|p| now + p);
            }
        }

        let lit = match self.current.animation {
            PledAnimation::None => false,
            PledAnimation::Solid => true,
            PledAnimation::Blink => {
                if let (Some(deadline), Some(period)) = (self.next_toggle, self.current.speed.period()) {
                    if now >= deadline {
                        self.blink_on = !self.blink_on;
                        self.next_toggle = Some(now + period);
                    }
                }
                self.blink_on
            }
        };

        for (n, level) in self.levels.iter_mut().enumerate() {
            *level = if lit && self.current.state.is_lit(n) {
                PLED_MAX_LEVEL
            } else {
                0
            };
        }
    }
}

/// Sink for player LED levels, one PWM channel per LED.
pub trait PledOutput {
    /// Apply `levels`, each in `0..=PLED_MAX_LEVEL`.
    fn set_levels(&mut self, levels: &[u16; PLAYER_LED_COUNT]);
}

/// Player LEDs wired to their own GPIOs instead of the strip.
///
/// Only active when the stored options select [`PledType::Pwm`]. It then
/// owns the feature report queue; with RGB player LEDs the strip module
/// consumes it instead.
pub struct PwmPledModule<'a, M: RawMutex, S, O> {
    storage: S,
    output: O,
    features: &'a FeatureQueue<M>,
    leds: PlayerLeds,
    request: Option<PledAnimationState>,
    input_mode: InputMode,
    next_run: Instant,
}

impl<'a, M, S, O> PwmPledModule<'a, M, S, O>
where
    M: RawMutex,
    S: Storage,
    O: PledOutput,
{
    pub fn new(storage: S, output: O, features: &'a FeatureQueue<M>) -> Self {
        Self {
            storage,
            output,
            features,
            leds: PlayerLeds::new(),
            request: None,
            input_mode: InputMode::default(),
            next_run: Instant::MAX,
        }
    }

    pub fn available(&self) -> bool {
        self.storage.led_options().player_leds.kind == PledType::Pwm
    }

    /// Start with every player LED off.
    pub fn setup(&mut self) {
        self.leds = PlayerLeds::new();
        self.request = None;
        self.output.set_levels(self.leds.levels());
        self.next_run = Instant::MIN;
        info!("PWM player LEDs configured");
    }

    /// Take at most one feature report; only XInput reports are decoded.
    pub fn process(&mut self, snapshot: &mut GamepadSnapshot) {
        self.input_mode = snapshot.input_mode;
        if let Some(report) = self.features.try_pop() {
            if self.input_mode == InputMode::XInput {
                let request = decode_xinput(&report);
                trace!("player LED request {:?}", request);
                self.request = Some(request);
            }
        }
    }

    pub fn run(&mut self, now: Instant) {
        if now < self.next_run {
            return;
        }
        self.leds.animate(self.request.take(), now);
        if self.input_mode == InputMode::XInput {
            self.output.set_levels(self.leds.levels());
        } else {
            self.output.set_levels(&[0; PLAYER_LED_COUNT]);
        }
        self.next_run = now + FRAME_INTERVAL;
    }

    pub fn next_run(&self) -> Instant {
        self.next_run
    }
}

#[cfg(test)]
pub(crate) mod tests {
    extern crate std;

    use super::*;
    use crate::leds::tests::{hitbox_options, MockStorage};
    use crate::queue::CoalescingQueue;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use std::sync::{Arc, Mutex};
    use std::vec::Vec;

    pub(crate) fn report(kind: u8, pattern: u8) -> [u8; 32] {
        let mut r = [0u8; 32];
        r[0] = kind;
        r[1] = 0x03;
        r[2] = pattern;
        r
    }

    #[test]
    fn test_decode_blink_all() {
        let s = decode_xinput(&report(0x01, xinput::BLINK_ALL));
        assert_eq!(s.animation, PledAnimation::Blink);
        assert_eq!(s.speed, PledSpeed::Fast);
        assert_eq!(s.state, PledState::ALL);
    }

    #[test]
    fn test_decode_blink_variants_collapse() {
        for code in [xinput::ROTATE, xinput::BLINK, xinput::SLOW_BLINK, xinput::ALTERNATE] {
            assert_eq!(
                decode_xinput(&report(0x01, code)),
                decode_xinput(&report(0x01, xinput::BLINK_ALL))
            );
        }
    }

    #[test]
    fn test_decode_on2() {
        let s = decode_xinput(&report(0x01, xinput::ON2));
        assert_eq!(s.animation, PledAnimation::Solid);
        assert_eq!(s.speed, PledSpeed::Off);
        assert_eq!(s.state, PledState::LED2);
        assert_eq!(decode_xinput(&report(0x01, xinput::FLASH2)), s);
    }

    #[test]
    fn test_decode_rejects_wrong_type() {
        assert_eq!(decode_xinput(&report(0x00, xinput::BLINK_ALL)), PledAnimationState::NONE);
        assert_eq!(decode_xinput(&report(0x01, xinput::OFF)), PledAnimationState::NONE);
        assert_eq!(decode_xinput(&report(0x01, 0x42)), PledAnimationState::NONE);
        assert_eq!(decode_xinput(&[0x01, 0x03]), PledAnimationState::NONE);
    }

    #[test]
    fn test_solid_levels() {
        let mut leds = PlayerLeds::new();
        leds.animate(Some(decode_xinput(&report(0x01, xinput::ON3))), Instant::from_millis(0));
        assert_eq!(leds.levels(), &[0, 0, PLED_MAX_LEVEL, 0]);

        leds.animate(None, Instant::from_millis(500));
        assert_eq!(leds.levels(), &[0, 0, PLED_MAX_LEVEL, 0]);
    }

    #[test]
    fn test_blink_toggles_every_period() {
        let mut leds = PlayerLeds::new();
        let blink = decode_xinput(&report(0x01, xinput::BLINK_ALL));
        leds.animate(Some(blink), Instant::from_millis(0));
        assert_eq!(leds.levels(), &[PLED_MAX_LEVEL; 4]);

        leds.animate(None, Instant::from_millis(50));
        assert_eq!(leds.levels(), &[PLED_MAX_LEVEL; 4]);

        leds.animate(None, Instant::from_millis(100));
        assert_eq!(leds.levels(), &[0; 4]);

        // Repeating the same request does not restart the blink.
        leds.animate(Some(blink), Instant::from_millis(150));
        assert_eq!(leds.levels(), &[0; 4]);

        leds.animate(None, Instant::from_millis(200));
        assert_eq!(leds.levels(), &[PLED_MAX_LEVEL; 4]);
    }

    #[test]
    fn test_none_turns_off() {
        let mut leds = PlayerLeds::new();
        leds.animate(Some(decode_xinput(&report(0x01, xinput::ON1))), Instant::from_millis(0));
        leds.animate(Some(PledAnimationState::NONE), Instant::from_millis(10));
        assert_eq!(leds.levels(), &[0; 4]);
    }

    #[derive(Clone, Default)]
    pub(crate) struct MockOutput(pub Arc<Mutex<Vec<[u16; PLAYER_LED_COUNT]>>>);

    impl PledOutput for MockOutput {
        fn set_levels(&mut self, levels: &[u16; PLAYER_LED_COUNT]) {
            self.0.lock().unwrap().push(*levels);
        }
    }

    fn pwm_module<'a>(
        storage: &MockStorage,
        output: &MockOutput,
        features: &'a FeatureQueue<CriticalSectionRawMutex>,
    ) -> PwmPledModule<'a, CriticalSectionRawMutex, MockStorage, MockOutput> {
        PwmPledModule::new(storage.clone(), output.clone(), features)
    }

    fn snapshot(mode: InputMode) -> GamepadSnapshot {
        let mut s = GamepadSnapshot::default();
        s.input_mode = mode;
        s
    }

    #[test]
    fn test_pwm_module_only_for_pwm_type() {
        let storage = MockStorage::default();
        let output = MockOutput::default();
        let features = CoalescingQueue::new();

        storage.0.lock().unwrap().led = Some(hitbox_options(PledType::Rgb));
        assert!(!pwm_module(&storage, &output, &features).available());

        storage.0.lock().unwrap().led = Some(hitbox_options(PledType::Pwm));
        let mut pleds = pwm_module(&storage, &output, &features);
        assert!(pleds.available());
        pleds.setup();
        assert_eq!(pleds.next_run(), Instant::MIN);
        assert_eq!(output.0.lock().unwrap().as_slice(), &[[0; PLAYER_LED_COUNT]]);
    }

    #[test]
    fn test_pwm_module_drives_xinput_levels() {
        let storage = MockStorage::default();
        let output = MockOutput::default();
        let features = CoalescingQueue::new();
        storage.0.lock().unwrap().led = Some(hitbox_options(PledType::Pwm));

        let mut pleds = pwm_module(&storage, &output, &features);
        pleds.setup();

        assert!(features.try_push(report(0x01, xinput::ON3)));
        pleds.process(&mut snapshot(InputMode::XInput));
        assert!(features.is_empty());

        pleds.run(Instant::from_millis(0));
        assert_eq!(pleds.next_run(), Instant::from_millis(10));
        // Not due yet.
        pleds.run(Instant::from_millis(5));

        let levels = output.0.lock().unwrap();
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[1], [0, 0, PLED_MAX_LEVEL, 0]);
    }

    #[test]
    fn test_pwm_module_dark_outside_xinput() {
        let storage = MockStorage::default();
        let output = MockOutput::default();
        let features = CoalescingQueue::new();
        storage.0.lock().unwrap().led = Some(hitbox_options(PledType::Pwm));

        let mut pleds = pwm_module(&storage, &output, &features);
        pleds.setup();

        assert!(features.try_push(report(0x01, xinput::ON1)));
        pleds.process(&mut snapshot(InputMode::Hid));
        // The report is consumed but not decoded.
        assert!(features.is_empty());

        pleds.run(Instant::from_millis(0));
        assert_eq!(output.0.lock().unwrap().last(), Some(&[0; PLAYER_LED_COUNT]));
    }
}
