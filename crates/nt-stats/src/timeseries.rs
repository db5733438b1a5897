//! Values indexed by a tick (iteration number).

use serde::{Deserialize, Serialize};

use crate::numeric::NumericSummary;

/// Ordered `(tick, value)` observations plus a numeric summary of the values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesSummary {
    points: Vec<(u64, f64)>,
    values: NumericSummary,
}

impl TimeSeriesSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, tick: u64, value: f64) {
        // Keep ticks sorted; appends in order are the common case.
        let pos = self.points.partition_point(|(t, _)| *t <= tick);
        self.points.insert(pos, (tick, value));
        self.values.add(value);
    }

    pub fn merge(&mut self, other: &TimeSeriesSummary) {
        for &(tick, value) in &other.points {
            self.add(tick, value);
        }
    }

    pub fn n(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> &[(u64, f64)] {
        &self.points
    }

    /// Value at the highest tick.
    pub fn last(&self) -> Option<(u64, f64)> {
        self.points.last().copied()
    }

    pub fn values(&self) -> &NumericSummary {
        &self.values
    }
}
