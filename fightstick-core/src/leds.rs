//! Addressable LED module: reconfiguration controller and per-frame render loop.
//!
//! The module runs on Core 1. [`LedModule::process`] is fed every gamepad
//! snapshot drained from Core 0 and only queues work; [`LedModule::run`]
//! renders at most one frame per [`FRAME_INTERVAL`].
//!
//! Reconfiguration and rendering never overlap because both run on the same
//! executor and the render deadline is pushed to [`Instant::MAX`] for the
//! whole rebuild.

use embassy_sync::blocking_mutex::raw::{NoopRawMutex, RawMutex};
use embassy_time::{Duration, Instant};
use smart_leds::RGB8;

use crate::animation::{AnimationEngine, BLACK};
use crate::driver::{LedDriver, LedDriverFactory, StripConfig};
use crate::hotkey::{detect_hotkey, AnimationHotkey};
use crate::matrix::{build_layout, Matrix};
use crate::options::{ConfigError, LedOptions, PledType, MAX_LEDS};
use crate::pled::{decode_xinput, PledAnimationState, PlayerLeds, PLED_MAX_LEVEL};
use crate::queue::{FeatureQueue, LocalQueues, SaveRequest};
use crate::storage::Storage;
use crate::types::{GamepadSnapshot, InputMode};

/// Render cadence of the LED strip.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(10);

/// LED strip module owning the matrix, the strip driver and the local queues.
pub struct LedModule<'a, M: RawMutex, S, E, F: LedDriverFactory> {
    storage: S,
    engine: E,
    factory: F,
    driver: Option<F::Driver>,
    features: &'a FeatureQueue<M>,
    local: LocalQueues<NoopRawMutex>,
    options: LedOptions,
    matrix: Matrix,
    led_count: usize,
    frame: [RGB8; MAX_LEDS],
    player_leds: PlayerLeds,
    pled_request: Option<PledAnimationState>,
    input_mode: InputMode,
    next_run: Instant,
}

impl<'a, M, S, E, F> LedModule<'a, M, S, E, F>
where
    M: RawMutex,
    S: Storage,
    E: AnimationEngine,
    F: LedDriverFactory,
{
    /// Create an unconfigured module. Nothing renders until [`setup`](Self::setup) succeeds.
    pub fn new(storage: S, engine: E, factory: F, features: &'a FeatureQueue<M>) -> Self {
        Self {
            storage,
            engine,
            factory,
            driver: None,
            features,
            local: LocalQueues::new(),
            options: LedOptions::DISABLED,
            matrix: Matrix::empty(),
            led_count: 0,
            frame: [BLACK; MAX_LEDS],
            player_leds: PlayerLeds::new(),
            pled_request: None,
            input_mode: InputMode::default(),
            next_run: Instant::MAX,
        }
    }

    /// True when the stored options name a data pin.
    pub fn available(&self) -> bool {
        self.storage.led_options().data_pin.is_some()
    }

    /// First configuration of the strip.
    pub async fn setup(&mut self) -> Result<(), ConfigError> {
        self.reconfigure().await
    }

    /// Rebuild matrix, local queues and strip driver from the stored options.
    ///
    /// Everything is validated before any state is touched: on error the
    /// previous configuration keeps rendering unchanged. If the driver build
    /// itself fails, the previous strip is rebuilt from the old options.
    pub async fn reconfigure(&mut self) -> Result<(), ConfigError> {
        let options = self.storage.led_options();
        let button_count = options.validate()?;
        let matrix = build_layout(
            options.layout,
            options.leds_per_button,
            button_count,
            &options.indices,
        )?;
        let led_count = matrix.led_count() + options.player_leds.strip_slot_count();

        if options.player_leds.kind == PledType::Rgb {
            check_player_slots(&options.player_leds.slots, matrix.led_count(), led_count)?;
        }

        let pin = options.data_pin.ok_or(ConfigError::NoDataPin)?;
        let config = StripConfig {
            pin,
            count: led_count,
            format: options.format,
        };
        self.factory.check(&config)?;

        self.next_run = Instant::MAX;

        if let Some(mut old) = self.driver.take() {
            if let Err(e) = old.off().await {
                warn!("failed to turn old strip off: {:?}", e);
            }
            self.factory.release(old);
        }
        let mut driver = match self.factory.build(config) {
            Ok(driver) => driver,
            Err(e) => {
                error!("strip build failed: {:?}", e);
                self.restore_driver();
                self.next_run = Instant::MIN;
                return Err(e.into());
            }
        };
        if let Err(e) = driver.off().await {
            warn!("failed to clear new strip: {:?}", e);
        }
        self.driver = Some(driver);

        self.options = options;
        self.matrix = matrix;
        self.led_count = led_count;
        self.local = LocalQueues::new();

        self.engine
            .configure_brightness(options.brightness_maximum, options.brightness_steps);
        self.engine.set_options(self.storage.animation_options());
        self.engine.add_static_themes(&options);
        self.engine.set_mode(self.engine.options().base_animation);
        self.engine.set_matrix(&self.matrix);
        self.frame = [BLACK; MAX_LEDS];

        info!(
            "LEDs configured: {} buttons, {} LEDs on pin {}",
            button_count,
            led_count,
            pin
        );
        self.next_run = Instant::MIN;
        Ok(())
    }

    /// Rebuild the strip of the active configuration after a failed build.
    fn restore_driver(&mut self) {
        let Some(pin) = self.options.data_pin else {
            return;
        };
        let config = StripConfig {
            pin,
            count: self.led_count,
            format: self.options.format,
        };
        match self.factory.build(config) {
            Ok(driver) => self.driver = Some(driver),
            Err(e) => error!("previous strip could not be restored: {:?}", e),
        }
    }

    /// Queue the work carried by one gamepad snapshot.
    ///
    /// Hotkey buttons are cleared from `snapshot` so later modules see the
    /// same input the LED module reacted to.
    pub fn process(&mut self, snapshot: &mut GamepadSnapshot) {
        let hotkey = detect_hotkey(snapshot);
        if hotkey != AnimationHotkey::None {
            self.local.hotkeys.try_push(hotkey);
        }

        self.input_mode = snapshot.input_mode;
        if self.options.player_leds.kind == PledType::Rgb {
            if let Some(report) = self.features.try_pop() {
                if self.input_mode == InputMode::XInput {
                    let request = decode_xinput(&report);
                    trace!("player LED request {:?}", request);
                    self.pled_request = Some(request);
                }
            }
        }

        self.local.button_masks.try_push(snapshot.state.input_mask());
    }

    /// Render one frame if the deadline has passed.
    pub async fn run(&mut self, now: Instant) {
        if self.options.data_pin.is_none() || now < self.next_run {
            return;
        }
        let Some(driver) = self.driver.as_mut() else {
            return;
        };

        if let Some(hotkey) = self.local.hotkeys.try_pop() {
            self.engine.handle_event(hotkey);
            self.local.saves.try_push(SaveRequest);
        }

        if let Some(mask) = self.local.button_masks.try_pop() {
            let pressed = self.matrix.pressed(mask);
            if pressed.is_empty() {
                self.engine.clear_pressed();
            } else {
                self.engine.handle_pressed(&pressed);
            }
        }

        self.engine.animate(now);
        let frame = &mut self.frame[..self.led_count];
        self.engine.apply_brightness(frame);

        self.player_leds.animate(self.pled_request.take(), now);
        if self.options.player_leds.kind == PledType::Rgb && self.input_mode == InputMode::XInput {
            let brightness = u32::from(self.engine.brightness());
            for (slot, level) in self
                .options
                .player_leds
                .slots
                .iter()
                .zip(self.player_leds.levels().iter())
            {
                let Some(slot) = slot else { continue };
                if let Some(pixel) = frame.get_mut(usize::from(*slot)) {
                    let green = brightness * u32::from(*level) / u32::from(PLED_MAX_LEVEL);
                    *pixel = RGB8::new(0, green as u8, 0);
                }
            }
        }

        driver.set_frame(frame);
        if let Err(e) = driver.show().await {
            warn!("LED show failed: {:?}", e);
        }

        self.next_run = now + FRAME_INTERVAL;

        if self.local.saves.try_pop().is_some() {
            self.storage.save_animation_options(self.engine.options());
        }
    }

    /// Total strip LEDs of the active configuration.
    pub fn led_count(&self) -> usize {
        self.led_count
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// Last composed frame, one color per strip LED.
    pub fn frame(&self) -> &[RGB8] {
        &self.frame[..self.led_count]
    }

    pub fn next_run(&self) -> Instant {
        self.next_run
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

}

/// Player LED slots must follow the button LEDs, stay on the strip and not repeat.
fn check_player_slots(
    slots: &[Option<u8>],
    button_leds: usize,
    led_count: usize,
) -> Result<(), ConfigError> {
    for (n, slot) in slots.iter().enumerate() {
        let Some(slot) = *slot else { continue };
        if usize::from(slot) >= led_count {
            return Err(ConfigError::PlayerSlotOutOfRange(slot));
        }
        if usize::from(slot) < button_leds || slots[..n].contains(&Some(slot)) {
            return Err(ConfigError::PlayerSlotConflict(slot));
        }
    }
    Ok(())
}
