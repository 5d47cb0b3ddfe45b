//! Bounded non-blocking queues between the two cores and inside Core 1.
//!
//! Producers never wait: a push on a full queue drops the new value. A
//! depth-1 queue therefore coalesces a burst of pushes to the first value
//! until the consumer drains it.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;

use crate::hotkey::AnimationHotkey;
use crate::types::{FeatureReport, GamepadSnapshot};

/// Gamepad snapshots from Core 0 (latest-wins, only pushed when empty).
pub const SNAPSHOT_QUEUE_DEPTH: usize = 1;
/// Feature reports from the USB host.
pub const FEATURE_QUEUE_DEPTH: usize = 20;
/// Core-1-local queues between `process` and the render loop.
pub const LOCAL_QUEUE_DEPTH: usize = 1;

/// Fixed-capacity queue with try-only semantics.
pub struct CoalescingQueue<M: RawMutex, T, const N: usize> {
    channel: Channel<M, T, N>,
}

impl<M: RawMutex, T, const N: usize> CoalescingQueue<M, T, N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Push `value`, returning `false` if the queue was full and the value was dropped.
    pub fn try_push(&self, value: T) -> bool {
        match self.channel.try_send(value) {
            Ok(()) => true,
            Err(_) => {
                trace!("queue full, dropping value");
                false
            }
        }
    }

    /// Pop the oldest value, if any.
    pub fn try_pop(&self) -> Option<T> {
        self.channel.try_receive().ok()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.channel.len()
    }

    /// Drop every queued value.
    pub fn clear(&self) {
        self.channel.clear();
    }
}

impl<M: RawMutex, T, const N: usize> Default for CoalescingQueue<M, T, N> {
    fn default() -> Self {
        Self::new()
    }
}

pub type SnapshotQueue<M> = CoalescingQueue<M, GamepadSnapshot, SNAPSHOT_QUEUE_DEPTH>;
pub type FeatureQueue<M> = CoalescingQueue<M, FeatureReport, FEATURE_QUEUE_DEPTH>;

/// Marker pushed when the animation options should be persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SaveRequest;

/// The two queues crossing from Core 0 to Core 1.
///
/// Both are `'static` in firmware and shared by reference between the
/// producer (Core 0) and the consumer (Core 1).
pub struct CrossCoreQueues<'a, M: RawMutex> {
    pub snapshots: &'a SnapshotQueue<M>,
    pub features: &'a FeatureQueue<M>,
}

impl<M: RawMutex> Clone for CrossCoreQueues<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: RawMutex> Copy for CrossCoreQueues<'_, M> {}

/// Core-1-local queues owned by the LED module; replaced on reconfiguration.
pub struct LocalQueues<M: RawMutex> {
    pub hotkeys: CoalescingQueue<M, AnimationHotkey, LOCAL_QUEUE_DEPTH>,
    pub button_masks: CoalescingQueue<M, u32, LOCAL_QUEUE_DEPTH>,
    pub saves: CoalescingQueue<M, SaveRequest, LOCAL_QUEUE_DEPTH>,
}

impl<M: RawMutex> LocalQueues<M> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            hotkeys: CoalescingQueue::new(),
            button_masks: CoalescingQueue::new(),
            saves: CoalescingQueue::new(),
        }
    }
}

impl<M: RawMutex> Default for LocalQueues<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, NoopRawMutex};

    #[test]
    fn test_depth_one_keeps_first_value() {
        let q: CoalescingQueue<NoopRawMutex, u32, 1> = CoalescingQueue::new();
        assert!(q.try_push(1));
        assert!(!q.try_push(2));
        assert!(!q.try_push(3));
        assert_eq!(q.try_pop(), Some(1));
        assert_eq!(q.try_pop(), None);
    }

    #[test]
    fn test_feature_queue_fifo_until_full() {
        let q: FeatureQueue<CriticalSectionRawMutex> = CoalescingQueue::new();
        for i in 0..FEATURE_QUEUE_DEPTH {
            let mut r = [0u8; 32];
            r[0] = i as u8 + 1;
            assert!(q.try_push(r));
        }
        assert!(!q.try_push([0xFF; 32]));
        assert_eq!(q.len(), FEATURE_QUEUE_DEPTH);
        assert_eq!(q.try_pop().map(|r| r[0]), Some(1));
    }

    #[test]
    fn test_clear_empties_queue() {
        let q: CoalescingQueue<NoopRawMutex, u8, 4> = CoalescingQueue::new();
        q.try_push(1);
        q.try_push(2);
        q.clear();
        assert!(q.is_empty());
    }

    #[test]
    fn test_cross_core_queues_share_storage() {
        let snapshots: SnapshotQueue<CriticalSectionRawMutex> = CoalescingQueue::new();
        let features: FeatureQueue<CriticalSectionRawMutex> = CoalescingQueue::new();
        let producer = CrossCoreQueues {
            snapshots: &snapshots,
            features: &features,
        };
        let consumer = producer;

        assert!(producer.snapshots.try_push(GamepadSnapshot::default()));
        assert!(!consumer.snapshots.is_empty());
        assert_eq!(consumer.snapshots.try_pop(), Some(GamepadSnapshot::default()));
    }
}
