//! Sleep bookkeeping: per-body wake counters and island grouping.
//!
//! Bodies fall asleep only as whole islands. The scene unions connected
//! actors each step and an island sleeps once every member has counted its
//! wake frames down to zero.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Wake counter granted when an actor is disturbed by an external mutation.
pub const DEFAULT_WAKE_FRAMES: u32 = 20;

/// Whether a body is simulating or at rest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SleepState {
    /// Integrated every step.
    #[default]
    Awake,
    /// Excluded from integration until woken.
    Asleep,
}

/// Per-body sleep state, counter, and threshold overrides.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub(crate) struct SleepControl {
    /// Current state.
    pub state: SleepState,
    /// Steps of guaranteed wakefulness remaining.
    pub wake_frames: u32,
    /// Linear speed below which the counter runs down (None = scene default).
    pub linear_threshold: Option<f32>,
    /// Angular speed below which the counter runs down (None = scene default).
    pub angular_threshold: Option<f32>,
}

impl SleepControl {
    pub fn new(wake_frames: u32) -> Self {
        Self {
            state: SleepState::Awake,
            wake_frames,
            linear_threshold: None,
            angular_threshold: None,
        }
    }

    /// Forces the body awake with at least `frames` steps of wakefulness.
    pub fn wake(&mut self, frames: u32) {
        self.state = SleepState::Awake;
        self.wake_frames = self.wake_frames.max(frames);
    }

    /// Puts the body to rest immediately.
    pub fn sleep(&mut self) {
        self.state = SleepState::Asleep;
        self.wake_frames = 0;
    }
}

// ============================================================================
// Island map
// ============================================================================

/// Union-find over actor slots, rebuilt each step from the connection list.
pub(crate) struct IslandMap {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl IslandMap {
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
        }
    }

    /// Representative slot for the island containing `id`, with path halving.
    pub fn find(&mut self, id: usize) -> usize {
        let mut x = id;
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merges the islands containing `a` and `b`.
    pub fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        if self.rank[ra] < self.rank[rb] {
            self.parent[ra] = rb;
        } else if self.rank[ra] > self.rank[rb] {
            self.parent[rb] = ra;
        } else {
            self.parent[rb] = ra;
            self.rank[ra] += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singletons_are_their_own_islands() {
        let mut map = IslandMap::new(3);
        assert_eq!(map.find(0), 0);
        assert_ne!(map.find(1), map.find(2));
    }

    #[test]
    fn test_union_is_transitive() {
        let mut map = IslandMap::new(5);
        map.union(0, 1);
        map.union(1, 2);
        assert_eq!(map.find(0), map.find(2));
        assert_ne!(map.find(0), map.find(3));
    }

    #[test]
    fn test_union_idempotent() {
        let mut map = IslandMap::new(4);
        map.union(0, 1);
        map.union(0, 1);
        map.union(1, 0);
        assert_eq!(map.find(0), map.find(1));
        assert_ne!(map.find(2), map.find(0));
    }

    #[test]
    fn test_wake_keeps_larger_counter() {
        let mut control = SleepControl::new(20);
        control.wake(5);
        assert_eq!(control.wake_frames, 20);
        control.wake_frames = 2;
        control.wake(10);
        assert_eq!(control.wake_frames, 10);
        assert_eq!(control.state, SleepState::Awake);
    }

    #[test]
    fn test_sleep_zeroes_counter() {
        let mut control = SleepControl::new(20);
        control.sleep();
        assert_eq!(control.state, SleepState::Asleep);
        assert_eq!(control.wake_frames, 0);
        control.wake(DEFAULT_WAKE_FRAMES);
        assert_eq!(control.state, SleepState::Awake);
        assert_eq!(control.wake_frames, DEFAULT_WAKE_FRAMES);
    }
}
