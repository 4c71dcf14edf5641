use serde::{Deserialize, Serialize};

///
/// Counter
///
/// Handle for a CQL counter column.
///
/// Counters are never written as absolute values: the handle accumulates a
/// pending delta that is applied server-side (`c = c + ?`). `value` is the
/// last value read from the store, if any.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Counter {
    value: Option<i64>,
    delta: i64,
}

impl Counter {
    /// A fresh counter with no loaded value and no pending delta.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            value: None,
            delta: 0,
        }
    }

    /// A counter carrying a value read from the store.
    #[must_use]
    pub const fn loaded(value: i64) -> Self {
        Self {
            value: Some(value),
            delta: 0,
        }
    }

    pub const fn incr(&mut self) {
        self.incr_by(1);
    }

    pub const fn incr_by(&mut self, amount: i64) {
        self.delta = self.delta.saturating_add(amount);
    }

    pub const fn decr(&mut self) {
        self.decr_by(1);
    }

    pub const fn decr_by(&mut self, amount: i64) {
        self.delta = self.delta.saturating_sub(amount);
    }

    /// Loaded value plus pending delta; `None` when nothing was loaded and
    /// nothing is pending.
    #[must_use]
    pub const fn get(&self) -> Option<i64> {
        match self.value {
            Some(value) => Some(value.saturating_add(self.delta)),
            None if self.delta != 0 => Some(self.delta),
            None => None,
        }
    }

    #[must_use]
    pub const fn loaded_value(&self) -> Option<i64> {
        self.value
    }

    /// Pending delta to apply on the next write.
    #[must_use]
    pub const fn delta(&self) -> i64 {
        self.delta
    }

    #[must_use]
    pub const fn has_pending_delta(&self) -> bool {
        self.delta != 0
    }

    /// Fold the pending delta into the value once it has been written.
    #[must_use]
    pub const fn settled(self) -> Self {
        Self {
            value: self.get(),
            delta: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_counter_has_no_value() {
        let counter = Counter::new();

        assert_eq!(counter.get(), None);
        assert!(!counter.has_pending_delta());
    }

    #[test]
    fn deltas_accumulate_on_loaded_value() {
        let mut counter = Counter::loaded(10);
        counter.incr();
        counter.incr_by(4);
        counter.decr_by(2);

        assert_eq!(counter.delta(), 3);
        assert_eq!(counter.get(), Some(13));
        assert_eq!(counter.loaded_value(), Some(10));
    }

    #[test]
    fn settled_folds_delta() {
        let mut counter = Counter::new();
        counter.decr();

        let settled = counter.settled();
        assert_eq!(settled.get(), Some(-1));
        assert_eq!(settled.delta(), 0);
    }
}
