use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// A directed, capacity-bounded token bucket.
///
/// `bucket` is the capacity consumed in the current window, it always stays within `0..=throughput`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// capacity units the edge can carry per second
    pub throughput: u64,
    pub bucket: u64,
    /// payloads that fit into the bucket
    pub admitted: u64,
    /// payloads rejected by the bucket
    pub dropped: u64,
    /// leaked fraction of a unit not yet taken out of the bucket, in unit-nanoseconds
    #[serde(skip)]
    carry: u64,
}

impl Edge {
    pub fn new(throughput: u64) -> Self {
        Self {
            throughput,
            ..Default::default()
        }
    }

    /// Tries to fit `n` units into the bucket, all or nothing.
    /// On rejection the bucket is left full.
    pub fn admit(&mut self, n: u64) -> bool {
        match self.bucket.checked_add(n) {
            Some(filled) if filled <= self.throughput => {
                self.bucket = filled;
                self.admitted += 1;
                true
            }
            _ => {
                self.bucket = self.throughput;
                self.dropped += 1;
                false
            }
        }
    }

    /// Leaks `throughput * elapsed` out of the bucket, `throughput / intervals_per_second` for one tick.
    /// Whatever does not make up a whole unit is carried into the next drain.
    pub fn drain(&mut self, elapsed: Duration) {
        let owed = u128::from(self.throughput)
            .saturating_mul(elapsed.as_nanos())
            .saturating_add(u128::from(self.carry));
        let leak = u64::try_from(owed / NANOS_PER_SEC).unwrap_or(u64::MAX);
        // always below NANOS_PER_SEC
        self.carry = (owed % NANOS_PER_SEC) as u64;
        self.bucket = self.bucket.saturating_sub(leak);
    }
}

/// An [`Edge`] shared between every sender contending for it and the clock.
#[derive(Debug, Default)]
pub struct Link {
    edge: Mutex<Edge>,
}

impl Link {
    pub fn new(throughput: u64) -> Self {
        Self {
            edge: Mutex::new(Edge::new(throughput)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Edge> {
        // an Edge is valid after every statement, a panicking holder cannot leave it torn
        self.edge.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn admit(&self, n: u64) -> bool {
        self.lock().admit(n)
    }

    pub fn drain(&self, elapsed: Duration) {
        self.lock().drain(elapsed)
    }

    /// Copy of the current bucket state
    pub fn snapshot(&self) -> Edge {
        self.lock().clone()
    }
}
