//! Per-button debouncing of the digital input mask.

use embassy_time::{Duration, Instant};

use crate::types::GamepadState;

/// Minimum time between two accepted changes of the same input.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(5);

/// Highest bit used in the combined input mask (dpad bits 16..20).
const INPUT_BITS: usize = 20;

/// Accepts a change of an input only if its previous change is at least one window old.
///
/// The first edge of a bounce goes through immediately; the chatter that
/// follows inside the window is ignored.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    state: u32,
    changed_at: [Option<Instant>; INPUT_BITS],
}

impl Debouncer {
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            state: 0,
            changed_at: [None; INPUT_BITS],
        }
    }

    /// Debounced input mask.
    #[must_use]
    pub fn state(&self) -> u32 {
        self.state
    }

    /// Feed one raw sample and return the debounced mask.
    pub fn update(&mut self, raw: u32, now: Instant) -> u32 {
        let changed = raw ^ self.state;
        if changed == 0 {
            return self.state;
        }
        for (bit, changed_at) in self.changed_at.iter_mut().enumerate() {
            let mask = 1u32 << bit;
            if changed & mask == 0 {
                continue;
            }
            let settled = changed_at.map_or(true, |t| now.saturating_duration_since(t) >= self.window);
            if settled {
                self.state ^= mask;
                *changed_at = Some(now);
            }
        }
        self.state
    }

    /// Debounce the digital inputs of `state` in place.
    pub fn debounce(&mut self, state: &mut GamepadState, now: Instant) {
        let mask = self.update(state.input_mask(), now);
        state.set_input_mask(mask);
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEBOUNCE_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Buttons, Dpad};

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    #[test]
    fn test_first_edge_passes() {
        let mut d = Debouncer::default();
        assert_eq!(d.update(0b1, at(0)), 0b1);
    }

    #[test]
    fn test_chatter_inside_window_is_ignored() {
        let mut d = Debouncer::default();
        d.update(0b1, at(100));
        assert_eq!(d.update(0b0, at(101)), 0b1);
        assert_eq!(d.update(0b1, at(102)), 0b1);
        assert_eq!(d.update(0b0, at(104)), 0b1);
        assert_eq!(d.update(0b0, at(105)), 0b0);
    }

    #[test]
    fn test_bits_are_independent() {
        let mut d = Debouncer::default();
        d.update(0b01, at(100));
        assert_eq!(d.update(0b11, at(101)), 0b11);
        assert_eq!(d.update(0b10, at(102)), 0b11);
        assert_eq!(d.update(0b10, at(105)), 0b10);
    }

    #[test]
    fn test_debounce_state_covers_dpad() {
        let mut d = Debouncer::default();
        let mut state = GamepadState::neutral();
        state.dpad = Dpad::DOWN;
        state.buttons = Buttons::R3;
        d.debounce(&mut state, at(50));
        assert_eq!(state.dpad, Dpad::DOWN);

        state.dpad = Dpad::NONE;
        d.debounce(&mut state, at(52));
        assert_eq!(state.dpad, Dpad::DOWN);
        assert_eq!(state.buttons, Buttons::R3);
    }
}
