//! Core 0 side of the pipeline: boot mode negotiation and cross-core publishing.

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::hotkey::detect_hotkey;
use crate::queue::CrossCoreQueues;
use crate::types::{Buttons, Dpad, FeatureReport, GamepadSnapshot, GamepadState, InputMode, FEATURE_REPORT_SIZE};

/// What to do after sampling the buttons held at power-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootAction {
    /// Start in `mode`; `save` is set when the stored mode must be updated.
    Start { mode: InputMode, save: bool },
    /// Reboot into the USB mass-storage bootloader.
    UsbBootloader,
}

/// Pick the USB mode from the buttons held at boot.
///
/// F1 + Up reboots to the bootloader. Otherwise S2 selects config mode, B3
/// HID, B1 Switch and B2 XInput, in that order; with none held the stored
/// mode is kept. Config mode is never persisted.
#[must_use]
pub fn negotiate_boot_mode(state: &GamepadState, f1_mask: Buttons, stored: InputMode) -> BootAction {
    let buttons = state.buttons;
    if !f1_mask.is_empty() && buttons.contains(f1_mask) && state.dpad.contains(Dpad::UP) {
        return BootAction::UsbBootloader;
    }

    let mode = if buttons.contains(Buttons::S2) {
        InputMode::Config
    } else if buttons.contains(Buttons::B3) {
        InputMode::Hid
    } else if buttons.contains(Buttons::B1) {
        InputMode::Switch
    } else if buttons.contains(Buttons::B2) {
        InputMode::XInput
    } else {
        stored
    };

    BootAction::Start {
        mode,
        save: mode != stored && mode != InputMode::Config,
    }
}

/// State reported to the USB host for `snapshot`.
///
/// An LED hotkey combination (F1 modifier plus its button) is left out so the
/// host does not see it as regular input.
#[must_use]
pub fn host_state(snapshot: &GamepadSnapshot) -> GamepadState {
    let mut host = *snapshot;
    detect_hotkey(&mut host);
    host.state
}

/// Pushes Core 0 data into the cross-core queues without ever blocking.
pub struct GamepadPublisher<'a, M: RawMutex> {
    queues: CrossCoreQueues<'a, M>,
}

impl<'a, M: RawMutex> GamepadPublisher<'a, M> {
    pub fn new(queues: CrossCoreQueues<'a, M>) -> Self {
        Self { queues }
    }

    /// Publish a snapshot if Core 1 has consumed the previous one.
    ///
    /// Returns `true` when the snapshot was queued.
    pub fn publish_snapshot(&self, snapshot: GamepadSnapshot) -> bool {
        if !self.queues.snapshots.is_empty() {
            return false;
        }
        self.queues.snapshots.try_push(snapshot)
    }

    /// Publish a feature report received from the host.
    ///
    /// Empty reports and reports whose first byte is zero are ignored;
    /// shorter reports are zero-padded, longer ones truncated.
    pub fn publish_feature(&self, data: &[u8]) -> bool {
        match data.first() {
            Some(&kind) if kind != 0 => {}
            _ => return false,
        }
        let mut report: FeatureReport = [0; FEATURE_REPORT_SIZE];
        let len = data.len().min(FEATURE_REPORT_SIZE);
        report[..len].copy_from_slice(&data[..len]);
        self.queues.features.try_push(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{CoalescingQueue, FeatureQueue, SnapshotQueue};
    use crate::types::DEFAULT_F1_MASK;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    fn held(buttons: Buttons, dpad: Dpad) -> GamepadState {
        let mut state = GamepadState::neutral();
        state.buttons = buttons;
        state.dpad = dpad;
        state
    }

    #[test]
    fn test_boot_mode_overrides() {
        let cases = [
            (Buttons::S2, InputMode::Config, false),
            (Buttons::B3 | Buttons::B1, InputMode::Hid, true),
            (Buttons::B1, InputMode::Switch, true),
            (Buttons::B2, InputMode::XInput, false),
            (Buttons::NONE, InputMode::XInput, false),
        ];
        for (buttons, mode, save) in cases {
            assert_eq!(
                negotiate_boot_mode(&held(buttons, Dpad::NONE), DEFAULT_F1_MASK, InputMode::XInput),
                BootAction::Start { mode, save }
            );
        }
    }

    #[test]
    fn test_boot_mode_keeps_stored() {
        assert_eq!(
            negotiate_boot_mode(&held(Buttons::NONE, Dpad::NONE), DEFAULT_F1_MASK, InputMode::Switch),
            BootAction::Start {
                mode: InputMode::Switch,
                save: false
            }
        );
    }

    #[test]
    fn test_boot_to_bootloader() {
        assert_eq!(
            negotiate_boot_mode(&held(DEFAULT_F1_MASK, Dpad::UP), DEFAULT_F1_MASK, InputMode::Hid),
            BootAction::UsbBootloader
        );
        assert_eq!(
            negotiate_boot_mode(&held(Buttons::NONE, Dpad::UP), DEFAULT_F1_MASK, InputMode::Hid),
            BootAction::Start {
                mode: InputMode::Hid,
                save: false
            }
        );
    }

    #[test]
    fn test_snapshot_only_published_when_empty() {
        let snapshots: SnapshotQueue<CriticalSectionRawMutex> = CoalescingQueue::new();
        let features: FeatureQueue<CriticalSectionRawMutex> = CoalescingQueue::new();
        let publisher = GamepadPublisher::new(CrossCoreQueues {
            snapshots: &snapshots,
            features: &features,
        });

        let mut first = GamepadSnapshot::default();
        first.state.buttons = Buttons::B1;
        assert!(publisher.publish_snapshot(first));
        assert!(!publisher.publish_snapshot(GamepadSnapshot::default()));
        assert_eq!(snapshots.try_pop(), Some(first));
        assert!(publisher.publish_snapshot(GamepadSnapshot::default()));
    }

    #[test]
    fn test_feature_reports_filtered_and_padded() {
        let snapshots: SnapshotQueue<CriticalSectionRawMutex> = CoalescingQueue::new();
        let features: FeatureQueue<CriticalSectionRawMutex> = CoalescingQueue::new();
        let publisher = GamepadPublisher::new(CrossCoreQueues {
            snapshots: &snapshots,
            features: &features,
        });

        assert!(!publisher.publish_feature(&[]));
        assert!(!publisher.publish_feature(&[0x00, 0x03, 0x06]));
        assert!(publisher.publish_feature(&[0x01, 0x03, 0x06]));

        let report = features.try_pop().unwrap();
        assert_eq!(&report[..3], &[0x01, 0x03, 0x06]);
        assert!(report[3..].iter().all(|b| *b == 0));
        assert!(features.is_empty());
    }

    #[test]
    fn test_host_state_hides_led_hotkeys() {
        let snapshot = GamepadSnapshot::new(
            held(Buttons::S1 | Buttons::S2 | Buttons::B4 | Buttons::R3, Dpad::LEFT),
            InputMode::Hid,
        );
        let host = host_state(&snapshot);
        assert_eq!(host.buttons, Buttons::R3);
        assert_eq!(host.dpad, Dpad::LEFT);
        // Core 1 still receives the full combination.
        assert!(snapshot.pressed_f1());

        let plain = GamepadSnapshot::new(held(Buttons::S1 | Buttons::B4, Dpad::NONE), InputMode::Hid);
        assert_eq!(host_state(&plain), plain.state);
    }
}
