use chrono::Utc;
use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

///
/// MicrosClock
///
/// Strictly increasing microsecond timestamps for ordered batches. When the
/// wall clock stalls or steps back, the previous value plus one is used.
/// Clones share the same sequence.
///

#[derive(Clone, Debug, Default)]
pub struct MicrosClock {
    last: Arc<AtomicI64>,
}

impl MicrosClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next timestamp, greater than every value handed out before.
    pub fn next(&self) -> i64 {
        let now = Utc::now().timestamp_micros();
        let mut last = self.last.load(Ordering::Acquire);

        loop {
            let candidate = now.max(last.saturating_add(1));
            match self
                .last
                .compare_exchange_weak(last, candidate, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }
}

///
/// TESTS
///
