//! WS2812 strip on PIO0 state machine 0.
//!
//! The PIO program, state machine and DMA channel are claimed once at boot.
//! [`PioStripFactory`] lends them out as a [`PioStrip`] and takes them back
//! when the LED module reconfigures.

use embassy_rp::peripherals::PIO0;
use embassy_rp::pio_programs::ws2812::{Grb, PioWs2812};
use fightstick_core::animation::BLACK;
use fightstick_core::driver::{check_count, to_grb_wire};
use fightstick_core::{LedDriver, LedDriverFactory, LedError, LedFormat, StripConfig, MAX_LEDS};
use smart_leds::RGB8;

/// PIO encoder sized for the longest supported strip. Shorter strips are padded with black.
pub type Ws2812 = PioWs2812<'static, PIO0, 0, MAX_LEDS, Grb>;

/// A configured strip: encoder plus its frame in wire order.
pub struct PioStrip {
    ws: Ws2812,
    format: LedFormat,
    len: usize,
    frame: [RGB8; MAX_LEDS],
}

impl LedDriver for PioStrip {
    fn len(&self) -> usize {
        self.len
    }

    fn set_frame(&mut self, frame: &[RGB8]) {
        self.frame = [BLACK; MAX_LEDS];
        for (wire, color) in self.frame[..self.len].iter_mut().zip(frame) {
            *wire = to_grb_wire(*color, self.format);
        }
    }

    async fn show(&mut self) -> Result<(), LedError> {
        self.ws.write(&self.frame).await;
        Ok(())
    }

    async fn off(&mut self) -> Result<(), LedError> {
        self.frame = [BLACK; MAX_LEDS];
        self.ws.write(&self.frame).await;
        Ok(())
    }
}

/// Hands out the single PIO encoder wired to `pin`.
pub struct PioStripFactory {
    pin: u8,
    ws: Option<Ws2812>,
}

impl PioStripFactory {
    pub fn new(ws: Ws2812, pin: u8) -> Self {
        Self { pin, ws: Some(ws) }
    }
}

impl LedDriverFactory for PioStripFactory {
    type Driver = PioStrip;

    fn check(&self, config: &StripConfig) -> Result<(), LedError> {
        if config.pin != self.pin {
            return Err(LedError::UnsupportedPin(config.pin));
        }
        check_count(config, MAX_LEDS)?;
        // The PIO program only clocks out 24-bit pixels.
        if config.format.has_white() {
            return Err(LedError::UnsupportedFormat(config.format));
        }
        Ok(())
    }

    fn build(&mut self, config: StripConfig) -> Result<PioStrip, LedError> {
        self.check(&config)?;
        let ws = self.ws.take().ok_or(LedError::Busy)?;
        Ok(PioStrip {
            ws,
            format: config.format,
            len: config.count,
            frame: [BLACK; MAX_LEDS],
        })
    }

    fn release(&mut self, driver: PioStrip) {
        self.ws = Some(driver.ws);
    }
}
