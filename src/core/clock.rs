//! Injected Time Source
//!
//! Deadlines are measured in abstract ticks. What a tick means is decided by
//! the clock handed to the engine:
//!
//! - [`ManualClock`]: set explicitly (tests, simulations)
//! - [`BlockClock`]: advances one tick per committed transaction
//! - [`SystemClock`]: wall-clock Unix seconds

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic source of "now" in ticks.
pub trait Clock: Send + Sync {
    /// Current tick.
    fn now(&self) -> u64;

    /// Called after every committed state-changing transaction.
    fn on_commit(&self) {}
}

/// Clock driven by hand.
///
/// Cloning shares the underlying counter, so a test can keep a handle
/// while the engine owns another.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock starting at `start`.
    pub fn new(start: u64) -> Self {
        Self { now: Arc::new(AtomicU64::new(start)) }
    }

    /// Set the current tick. Never moves backwards.
    pub fn set(&self, tick: u64) {
        self.now.fetch_max(tick, Ordering::SeqCst);
    }

    /// Advance by `ticks`.
    pub fn advance(&self, ticks: u64) {
        self.now.fetch_add(ticks, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Block-height clock.
///
/// Every committed transaction mines one block, so a window of N ticks
/// closes after N further transactions.
#[derive(Clone, Debug, Default)]
pub struct BlockClock {
    height: Arc<AtomicU64>,
}

impl BlockClock {
    /// Create a clock at block height `start`.
    pub fn new(start: u64) -> Self {
        Self { height: Arc::new(AtomicU64::new(start)) }
    }

    /// Mine `blocks` empty blocks.
    pub fn mine(&self, blocks: u64) {
        self.height.fetch_add(blocks, Ordering::SeqCst);
    }
}

impl Clock for BlockClock {
    fn now(&self) -> u64 {
        self.height.load(Ordering::SeqCst)
    }

    fn on_commit(&self) {
        self.height.fetch_add(1, Ordering::SeqCst);
    }
}

/// Wall-clock seconds since the Unix epoch.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        chrono::Utc::now().timestamp().max(0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_handle() {
        let clock = ManualClock::new(10);
        let handle = clock.clone();

        handle.advance(5);
        assert_eq!(clock.now(), 15);

        // Never moves backwards
        handle.set(3);
        assert_eq!(clock.now(), 15);
    }

    #[test]
    fn test_block_clock_advances_on_commit() {
        let clock = BlockClock::new(0);
        clock.on_commit();
        clock.on_commit();
        clock.mine(3);
        assert_eq!(clock.now(), 5);
    }

    #[test]
    fn test_system_clock_is_recent() {
        // 2020-01-01
        assert!(SystemClock.now() > 1_577_836_800);
    }
}
