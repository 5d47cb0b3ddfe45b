//! Settings store contract.

use crate::options::{AnimationOptions, LedOptions};

/// Persistent settings as seen by the LED pipeline.
///
/// Reads return copies; callers never hold on to store internals.
pub trait Storage {
    fn led_options(&self) -> LedOptions;

    fn animation_options(&self) -> AnimationOptions;

    /// Request that `options` be persisted. Must not block on flash writes.
    fn save_animation_options(&mut self, options: AnimationOptions);
}

impl<S: Storage + ?Sized> Storage for &mut S {
    fn led_options(&self) -> LedOptions {
        (**self).led_options()
    }

    fn animation_options(&self) -> AnimationOptions {
        (**self).animation_options()
    }

    fn save_animation_options(&mut self, options: AnimationOptions) {
        (**self).save_animation_options(options);
    }
}
