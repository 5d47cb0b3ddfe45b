//! Addressable LED strip driver traits.

use core::future::Future;
use smart_leds::RGB8;

use crate::options::{LedError, LedFormat};

/// Parameters a strip driver is built with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StripConfig {
    pub pin: u8,
    pub count: usize,
    pub format: LedFormat,
}

/// Async trait for an addressable LED strip.
///
/// A driver holds one frame; [`set_frame`](Self::set_frame) replaces it and
/// [`show`](Self::show) transfers it to the LEDs.
pub trait LedDriver {
    /// Number of LEDs on the strip.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy `frame` into the driver. Extra colors are ignored, missing ones are black.
    fn set_frame(&mut self, frame: &[RGB8]);

    /// Push the current frame to the strip.
    fn show(&mut self) -> impl Future<Output = Result<(), LedError>>;

    /// Turn every LED off immediately.
    fn off(&mut self) -> impl Future<Output = Result<(), LedError>>;
}

/// Creates and takes back strip drivers during reconfiguration.
pub trait LedDriverFactory {
    type Driver: LedDriver;

    /// Check whether [`build`](Self::build) would accept `config`, without side effects.
    fn check(&self, config: &StripConfig) -> Result<(), LedError>;

    fn build(&mut self, config: StripConfig) -> Result<Self::Driver, LedError>;

    /// Return a driver so its hardware can be reused by the next `build`.
    fn release(&mut self, driver: Self::Driver);
}

/// Checks shared by every driver: non-empty strip within `capacity` LEDs.
pub fn check_count(config: &StripConfig, capacity: usize) -> Result<(), LedError> {
    if config.count == 0 {
        return Err(LedError::EmptyStrip);
    }
    if config.count > capacity {
        return Err(LedError::TooManyLeds(config.count));
    }
    Ok(())
}

/// Reorder `color` so a GRB wire encoder emits it in `format` order.
#[must_use]
pub fn to_grb_wire(color: RGB8, format: LedFormat) -> RGB8 {
    match format {
        LedFormat::Grb | LedFormat::Grbw => color,
        LedFormat::Rgb | LedFormat::Rgbw => RGB8::new(color.g, color.r, color.b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_count() {
        let mut config = StripConfig {
            pin: 14,
            count: 0,
            format: LedFormat::Grb,
        };
        assert_eq!(check_count(&config, 16), Err(LedError::EmptyStrip));
        config.count = 17;
        assert_eq!(check_count(&config, 16), Err(LedError::TooManyLeds(17)));
        config.count = 16;
        assert_eq!(check_count(&config, 16), Ok(()));
    }

    #[test]
    fn test_rgb_strip_swaps_red_and_green() {
        let c = RGB8::new(1, 2, 3);
        assert_eq!(to_grb_wire(c, LedFormat::Grb), c);
        assert_eq!(to_grb_wire(c, LedFormat::Rgb), RGB8::new(2, 1, 3));
    }
}
