//! Recursion guard for cycle detection and depth limiting in recursive
//! type computations.
//!
//! Inference walks declarations on demand, so evaluating `x = y` may need
//! `y`, which may need `x` again. `RecursionGuard` tracks the keys currently
//! being evaluated and refuses to re-enter one of them.

use rustc_hash::FxHashSet;
use std::hash::Hash;
use tracing::debug;

/// Named recursion limit presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionProfile {
    /// Expression and declaration inference.
    ///
    /// depth = 64
    TypeEvaluation,

    Custom { max_depth: u32 },
}

impl RecursionProfile {
    pub const fn max_depth(self) -> u32 {
        match self {
            Self::TypeEvaluation => 64,
            Self::Custom { max_depth } => max_depth,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionResult {
    Entered,
    Cycle,
    DepthExceeded,
}

#[derive(Debug)]
pub struct RecursionGuard<K: Hash + Eq + Copy> {
    visiting: FxHashSet<K>,
    depth: u32,
    max_depth: u32,
}

impl<K: Hash + Eq + Copy> RecursionGuard<K> {
    pub fn new(max_depth: u32) -> Self {
        Self {
            visiting: FxHashSet::default(),
            depth: 0,
            max_depth,
        }
    }

    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self::new(profile.max_depth())
    }

    /// Try to start evaluating `key`. Every `Entered` must be paired with
    /// a [`leave`](Self::leave).
    pub fn enter(&mut self, key: K) -> RecursionResult {
        if self.depth >= self.max_depth {
            debug!(max_depth = self.max_depth, "recursion depth limit reached");
            return RecursionResult::DepthExceeded;
        }
        if !self.visiting.insert(key) {
            return RecursionResult::Cycle;
        }
        self.depth += 1;
        RecursionResult::Entered
    }

    pub fn leave(&mut self, key: K) {
        let was_present = self.visiting.remove(&key);
        debug_assert!(
            was_present,
            "RecursionGuard::leave() called with a key that is not in the visiting set"
        );
        self.depth = self.depth.saturating_sub(1);
    }

    #[inline]
    pub fn is_visiting(&self, key: &K) -> bool {
        self.visiting.contains(key)
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }
}

#[cfg(debug_assertions)]
impl<K: Hash + Eq + Copy> Drop for RecursionGuard<K> {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            debug_assert!(
                self.visiting.is_empty(),
                "RecursionGuard dropped with {} active entries",
                self.visiting.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reentering_active_key_is_a_cycle() {
        let mut guard = RecursionGuard::with_profile(RecursionProfile::TypeEvaluation);
        assert_eq!(guard.enter(1u32), RecursionResult::Entered);
        assert_eq!(guard.enter(2u32), RecursionResult::Entered);
        assert_eq!(guard.enter(1u32), RecursionResult::Cycle);
        assert_eq!(guard.depth(), 2);
        guard.leave(2);
        guard.leave(1);
        assert_eq!(guard.enter(1u32), RecursionResult::Entered);
        guard.leave(1);
    }

    #[test]
    fn test_depth_limit() {
        let mut guard = RecursionGuard::with_profile(RecursionProfile::Custom { max_depth: 2 });
        assert_eq!(guard.enter(1u32), RecursionResult::Entered);
        assert_eq!(guard.enter(2u32), RecursionResult::Entered);
        assert_eq!(guard.enter(3u32), RecursionResult::DepthExceeded);
        assert!(!guard.is_visiting(&3));
        guard.leave(2);
        guard.leave(1);
    }
}
