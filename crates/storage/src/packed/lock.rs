//! Three-mode lock: optimistic read, pessimistic read, exclusive write

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::atomic::{fence, AtomicU64, Ordering};

/// Version-stamped reader/writer lock.
///
/// The stamp is odd while a writer holds the lock. Optimistic readers take
/// a stamp, read without blocking, and keep their result only if
/// [`validate`](Self::validate) confirms no writer intervened. Everything
/// read optimistically must itself be memory-safe under concurrent writes
/// (atomics, `ArcSwap` snapshots).
#[derive(Debug, Default)]
pub struct StampedLock {
    stamp: AtomicU64,
    gate: RwLock<()>,
}

impl StampedLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp to validate against, or `None` while a writer is active
    #[inline]
    pub fn try_optimistic_read(&self) -> Option<u64> {
        let stamp = self.stamp.load(Ordering::Acquire);
        (stamp & 1 == 0).then_some(stamp)
    }

    /// Whether no writer has entered since `stamp` was taken
    #[inline]
    pub fn validate(&self, stamp: u64) -> bool {
        fence(Ordering::Acquire);
        self.stamp.load(Ordering::Relaxed) == stamp
    }

    /// Block writers for the lifetime of the guard
    pub fn read(&self) -> RwLockReadGuard<'_, ()> {
        self.gate.read()
    }

    /// Exclusive access; optimistic reads overlapping the guard fail validation
    pub fn write(&self) -> StampedWriteGuard<'_> {
        let gate = self.gate.write();
        self.stamp.fetch_add(1, Ordering::Relaxed);
        fence(Ordering::Release);
        StampedWriteGuard { lock: self, _gate: gate }
    }

    /// Current stamp; even when no writer is active
    pub fn stamp(&self) -> u64 {
        self.stamp.load(Ordering::Acquire)
    }
}

pub struct StampedWriteGuard<'a> {
    lock: &'a StampedLock,
    _gate: RwLockWriteGuard<'a, ()>,
}

impl Drop for StampedWriteGuard<'_> {
    fn drop(&mut self) {
        self.lock.stamp.fetch_add(1, Ordering::Release);
    }
}
