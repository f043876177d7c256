//! Bounded transit buffer bridging the capture and cable-output callbacks.
//!
//! Single producer (the capture callback), single consumer (the cable
//! callback). Storage is a fixed-capacity ring guarded by a mutex that both
//! real-time sides acquire with `try_lock` only and hold for one bounded
//! copy; a failed acquisition drops one block of audio instead of blocking
//! the callback, and self-heals on the next period.
//!
//! Capacity is set once at construction and never changes; no operation
//! allocates.

use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

use ringbuf::traits::{Consumer, Observer, Producer};
use ringbuf::HeapRb;

/// Outcome of a capture-side write, for drop accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushReport {
    /// Stale samples discarded from the front to honor the latency threshold.
    pub skipped: usize,
    /// New samples that did not fit, or the whole block on lock contention.
    pub dropped: usize,
}

/// Fixed-capacity circular sample buffer.
///
/// See the [module docs](self) for the threading contract. Interleaved `f32`
/// samples throughout; "one sample" below always means one interleaved slot,
/// not one frame.
pub struct TransitBuffer {
    ring: Mutex<HeapRb<f32>>,
    capacity: usize,
}

impl TransitBuffer {
    /// Creates a buffer holding at most `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ring: Mutex::new(HeapRb::new(capacity)),
            capacity,
        }
    }

    /// Fixed capacity in samples.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples currently waiting to be read. Never exceeds [`capacity`](Self::capacity).
    pub fn available_read(&self) -> usize {
        lock(&self.ring).occupied_len()
    }

    /// Free space in samples.
    pub fn available_write(&self) -> usize {
        lock(&self.ring).vacant_len()
    }

    /// Capture-side write with the anti-lag policy applied first.
    ///
    /// If the unread count exceeds `latency_threshold`, the oldest excess is
    /// discarded by advancing the read cursor, then as much of `samples` as
    /// fits is copied in. Everything happens under one non-blocking
    /// acquisition: on contention the whole block is dropped and reported.
    pub fn push_with_antilag(&self, samples: &[f32], latency_threshold: usize) -> PushReport {
        let mut ring = match try_lock(&self.ring) {
            Some(guard) => guard,
            None => {
                return PushReport {
                    skipped: 0,
                    dropped: samples.len(),
                }
            }
        };

        let unread = ring.occupied_len();
        let skipped = if unread > latency_threshold {
            ring.skip(unread - latency_threshold)
        } else {
            0
        };

        let written = ring.push_slice(samples);
        PushReport {
            skipped,
            dropped: samples.len() - written,
        }
    }

    /// Consumer-side read of up to `out.len()` samples.
    ///
    /// Reads only what is available; there is no waiting for more. Returns
    /// the number of samples copied into the front of `out`; returns 0 on
    /// lock contention.
    pub fn pop_into(&self, out: &mut [f32]) -> usize {
        match try_lock(&self.ring) {
            Some(mut ring) => ring.pop_slice(out),
            None => 0,
        }
    }

    /// Advances the read cursor without consuming data.
    ///
    /// Returns the number of samples actually skipped (0 on contention).
    pub fn skip(&self, count: usize) -> usize {
        match try_lock(&self.ring) {
            Some(mut ring) => ring.skip(count),
            None => 0,
        }
    }

    /// Discards all buffered samples.
    pub fn clear(&self) {
        lock(&self.ring).clear();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // The ring holds no invariants a panicked holder could break mid-update
    // that we rely on past the guard, so a poisoned lock is recoverable.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn try_lock<T>(mutex: &Mutex<T>) -> Option<MutexGuard<'_, T>> {
    match mutex.try_lock() {
        Ok(guard) => Some(guard),
        Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
        Err(TryLockError::WouldBlock) => None,
    }
}
