//! Operation metrics
//!
//! Every public operation on a collection is timed and counted. Counters
//! only grow; they reset when the collection is recreated.

#![allow(clippy::cast_precision_loss)] // Averages intentionally accept precision loss

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

/// Point-in-time view of a collection's metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionStats {
    /// Operations performed since construction
    pub operation_count: u64,
    /// Sum of all operation latencies
    pub total_latency: Duration,
    /// Current backend capacity in bytes
    pub memory_usage_bytes: u64,
}

impl CollectionStats {
    /// Mean latency per operation
    #[inline]
    pub fn average_latency(&self) -> Duration {
        if self.operation_count == 0 {
            Duration::ZERO
        } else {
            let nanos = self.total_latency.as_nanos() / u128::from(self.operation_count);
            Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
        }
    }

    /// Mean latency per operation in milliseconds
    #[inline]
    pub fn average_latency_ms(&self) -> f64 {
        if self.operation_count == 0 {
            0.0
        } else {
            self.total_latency.as_nanos() as f64 / self.operation_count as f64 / 1_000_000.0
        }
    }
}

/// Atomic operation counters
///
/// Atomics let read-only operations record through `&self`.
#[derive(Debug, Default)]
pub struct OperationMetrics {
    operation_count: AtomicU64,
    total_latency_nanos: AtomicU64,
}

impl OperationMetrics {
    /// Create zeroed metrics
    pub const fn new() -> Self {
        Self {
            operation_count: AtomicU64::new(0),
            total_latency_nanos: AtomicU64::new(0),
        }
    }

    /// Record one operation that took `duration`
    #[inline]
    pub fn record(&self, duration: Duration) {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.operation_count.fetch_add(1, Ordering::Relaxed);
        self.total_latency_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    /// Record one operation started at `start`
    #[inline]
    pub fn record_since(&self, start: Instant) {
        self.record(start.elapsed());
    }

    /// Operations recorded so far
    pub fn operation_count(&self) -> u64 {
        self.operation_count.load(Ordering::Relaxed)
    }

    /// Snapshot the counters, tagging the backend capacity
    pub fn snapshot(&self, memory_usage_bytes: u64) -> CollectionStats {
        CollectionStats {
            operation_count: self.operation_count.load(Ordering::Acquire),
            total_latency: Duration::from_nanos(self.total_latency_nanos.load(Ordering::Relaxed)),
            memory_usage_bytes,
        }
    }
}
