//! Dual-core RP2040 fight-stick firmware.
//!
//! Core 0 samples the buttons and serves USB HID; Core 1 runs the LED
//! pipeline from `fightstick-core` on a WS2812 strip and, when configured,
//! on PWM player LEDs.

#![no_std]

// Re-export core types for convenience
pub use fightstick_core::{
    host_state, negotiate_boot_mode, AnimationStation, BootAction, CoalescingQueue, Core1, Core1State,
    CrossCoreQueues, Debouncer, FeatureQueue, GamepadPublisher, GamepadSnapshot, GamepadState,
    InputMode, LedModule, PwmPledModule, SnapshotQueue, DEFAULT_F1_MASK,
};

pub mod board;
pub mod input;
pub mod output;
pub mod storage;

pub use input::GpioButtons;
pub use output::{
    configure_usb_hid, pled_pwm_config, GamepadReport, GamepadRequestHandler, PioStrip,
    PioStripFactory, PwmPlayerLeds, UsbHidOutput, Ws2812,
};
pub use storage::{persist_task, RamStorage};
