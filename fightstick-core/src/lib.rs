//! Platform-agnostic LED pipeline, hotkeys and cross-core plumbing for a fight stick.
//!
//! This crate holds everything in the firmware that does not touch hardware,
//! so it can be unit-tested on the host. The RP2040 firmware supplies the
//! strip driver, storage and GPIO sampling through the traits defined here.
//!
//! # Overview
//!
//! - [`types`]: gamepad state ([`GamepadState`], [`Buttons`], [`Dpad`]) and the
//!   [`GamepadSnapshot`] passed from Core 0 to Core 1
//! - [`options`]: LED and animation configuration ([`LedOptions`], [`AnimationOptions`])
//! - [`matrix`]: logical button to physical LED mapping ([`build_layout`], [`Matrix`])
//! - [`hotkey`]: F1 + button animation hotkeys ([`detect_hotkey`])
//! - [`pled`]: XInput player LED commands ([`decode_xinput`], [`PlayerLeds`]) and
//!   discrete PWM player LEDs ([`PwmPledModule`])
//! - [`queue`]: bounded try-only queues ([`CoalescingQueue`], [`CrossCoreQueues`])
//! - [`animation`]: engine trait and the built-in [`AnimationStation`]
//! - [`driver`]: strip driver traits ([`LedDriver`], [`LedDriverFactory`])
//! - [`storage`]: settings store trait ([`Storage`])
//! - [`leds`]: the LED module, its reconfiguration and render loop ([`LedModule`])
//! - [`core0`]: boot mode negotiation and publishing ([`GamepadPublisher`])
//! - [`core1`]: module dispatcher ([`Core1`], [`PeripheralModule`])
//! - [`debounce`]: per-button debouncing ([`Debouncer`])
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Log through defmt and derive `defmt::Format` on public types
//! - **`log`**: Log through the `log` facade when defmt is off

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

// This must go first so the logging macros are visible to every module.
mod fmt;

pub mod animation;
pub mod core0;
pub mod core1;
pub mod debounce;
pub mod driver;
pub mod hotkey;
pub mod leds;
pub mod matrix;
pub mod options;
pub mod pled;
pub mod queue;
pub mod storage;
pub mod types;

// Re-export main types at crate root
pub use animation::{AnimationEngine, AnimationMode, AnimationStation};
pub use core0::{host_state, negotiate_boot_mode, BootAction, GamepadPublisher};
pub use core1::{Core1, Core1State, PeripheralModule};
pub use debounce::{Debouncer, DEBOUNCE_WINDOW};
pub use driver::{LedDriver, LedDriverFactory, StripConfig};
pub use hotkey::{detect_hotkey, AnimationHotkey};
pub use leds::{LedModule, FRAME_INTERVAL};
pub use matrix::{build_layout, Matrix, Pixel};
pub use options::{
    AnimationOptions, ButtonIndices, ButtonLabel, ButtonLayout, ConfigError, LedError, LedFormat,
    LedOptions, PlayerLedOptions, PledType, MAX_LEDS, MAX_LEDS_PER_BUTTON, PLAYER_LED_COUNT,
};
pub use pled::{
    decode_xinput, PledAnimation, PledAnimationState, PledOutput, PledSpeed, PledState, PlayerLeds,
    PwmPledModule,
};
pub use queue::{
    CoalescingQueue, CrossCoreQueues, FeatureQueue, LocalQueues, SnapshotQueue, FEATURE_QUEUE_DEPTH,
    SNAPSHOT_QUEUE_DEPTH,
};
pub use storage::Storage;
pub use types::{
    AnalogStick, Buttons, Dpad, FeatureReport, GamepadSnapshot, GamepadState, InputMode,
    DEFAULT_F1_MASK, FEATURE_REPORT_SIZE,
};
