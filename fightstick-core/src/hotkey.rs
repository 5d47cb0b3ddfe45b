//! F1 + button hotkeys controlling the LED animation.

use crate::types::{Buttons, GamepadSnapshot};

/// Animation control event produced by a hotkey.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AnimationHotkey {
    #[default]
    None,
    AnimationUp,
    AnimationDown,
    BrightnessUp,
    BrightnessDown,
    ParameterUp,
    ParameterDown,
    PressParameterUp,
    PressParameterDown,
}

/// Buttons checked while F1 is held, highest priority first.
const HOTKEYS: [(Buttons, AnimationHotkey); 8] = [
    (Buttons::B3, AnimationHotkey::AnimationUp),
    (Buttons::B1, AnimationHotkey::AnimationDown),
    (Buttons::B4, AnimationHotkey::BrightnessUp),
    (Buttons::B2, AnimationHotkey::BrightnessDown),
    (Buttons::R1, AnimationHotkey::ParameterUp),
    (Buttons::R2, AnimationHotkey::ParameterDown),
    (Buttons::L1, AnimationHotkey::PressParameterUp),
    (Buttons::L2, AnimationHotkey::PressParameterDown),
];

/// Detect at most one hotkey in `snapshot`.
///
/// On a hit, the matched button and the F1 modifier bits are cleared from the
/// snapshot so the combination is not reported as regular input. Lower
/// priority buttons held at the same time are left untouched.
pub fn detect_hotkey(snapshot: &mut GamepadSnapshot) -> AnimationHotkey {
    if !snapshot.pressed_f1() {
        return AnimationHotkey::None;
    }

    let buttons = snapshot.state.buttons;
    match HOTKEYS.iter().find(|(button, _)| buttons.contains(*button)) {
        Some(&(button, action)) => {
            snapshot.state.buttons &= !(button | snapshot.f1_mask);
            action
        }
        None => AnimationHotkey::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(buttons: Buttons) -> GamepadSnapshot {
        let mut s = GamepadSnapshot::default();
        s.state.buttons = buttons;
        s
    }

    #[test]
    fn test_no_modifier_no_hotkey() {
        let mut s = snapshot(Buttons::B3 | Buttons::S1);
        assert_eq!(detect_hotkey(&mut s), AnimationHotkey::None);
        assert_eq!(s.state.buttons, Buttons::B3 | Buttons::S1);
    }

    #[test]
    fn test_modifier_alone_is_untouched() {
        let mut s = snapshot(Buttons::S1 | Buttons::S2);
        assert_eq!(detect_hotkey(&mut s), AnimationHotkey::None);
        assert_eq!(s.state.buttons, Buttons::S1 | Buttons::S2);
    }

    #[test]
    fn test_priority_and_clearing() {
        let mut s = snapshot(Buttons::S1 | Buttons::S2 | Buttons::B3 | Buttons::B4 | Buttons::R3);
        assert_eq!(detect_hotkey(&mut s), AnimationHotkey::AnimationUp);
        assert_eq!(s.state.buttons, Buttons::B4 | Buttons::R3);
    }

    #[test]
    fn test_each_hotkey() {
        for (button, action) in HOTKEYS {
            let mut s = snapshot(Buttons::S1 | Buttons::S2 | button);
            assert_eq!(detect_hotkey(&mut s), action);
            assert!(s.state.buttons.is_empty());
        }
    }

    #[test]
    fn test_custom_modifier() {
        let mut s = snapshot(Buttons::A1 | Buttons::L2);
        s.f1_mask = Buttons::A1;
        assert_eq!(detect_hotkey(&mut s), AnimationHotkey::PressParameterDown);
        assert!(s.state.buttons.is_empty());
    }
}
