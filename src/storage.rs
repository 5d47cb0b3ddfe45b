//! Settings store shared by both cores.
//!
//! Values live in RAM behind critical-section mutexes. Saving only records
//! the new value and wakes [`persist_task`], so the Core 1 render loop never
//! waits on the writer.

use core::cell::Cell;

use defmt::info;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use fightstick_core::{AnimationOptions, InputMode, LedOptions, Storage};

/// RAM-backed settings with a persistence hand-off.
pub struct RamStorage {
    led: Mutex<CriticalSectionRawMutex, Cell<LedOptions>>,
    animation: Mutex<CriticalSectionRawMutex, Cell<AnimationOptions>>,
    input_mode: Mutex<CriticalSectionRawMutex, Cell<InputMode>>,
    pending: Signal<CriticalSectionRawMutex, ()>,
}

impl RamStorage {
    #[must_use]
    pub const fn new(led: LedOptions, input_mode: InputMode) -> Self {
        Self {
            led: Mutex::new(Cell::new(led)),
            animation: Mutex::new(Cell::new(AnimationOptions::DEFAULT)),
            input_mode: Mutex::new(Cell::new(input_mode)),
            pending: Signal::new(),
        }
    }

    #[must_use]
    pub fn input_mode(&self) -> InputMode {
        self.input_mode.lock(Cell::get)
    }

    pub fn save_input_mode(&self, mode: InputMode) {
        self.input_mode.lock(|m| m.set(mode));
        self.pending.signal(());
    }

    /// Wait for the next save request. Requests raised meanwhile coalesce.
    pub async fn wait_save(&self) {
        self.pending.wait().await;
    }
}

impl Storage for &RamStorage {
    fn led_options(&self) -> LedOptions {
        self.led.lock(Cell::get)
    }

    fn animation_options(&self) -> AnimationOptions {
        self.animation.lock(Cell::get)
    }

    fn save_animation_options(&mut self, options: AnimationOptions) {
        self.animation.lock(|o| o.set(options));
        self.pending.signal(());
    }
}

/// Persistence task: drains save requests raised by either core.
#[embassy_executor::task]
pub async fn persist_task(storage: &'static RamStorage) {
    loop {
        storage.wait_save().await;
        info!(
            "Persisting settings: mode {:?}, animation {:?}",
            storage.input_mode(),
            storage.animation_options()
        );
    }
}
