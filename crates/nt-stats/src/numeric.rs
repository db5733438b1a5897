//! Online numeric summary.
//!
//! [`NumericSummary`] keeps count, mean and the sum of squared deviations
//! (Welford), so no raw samples are stored. Two summaries built on disjoint
//! data can be merged exactly.

use serde::{Deserialize, Serialize};

/// Running count / mean / variance of a stream of numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    n: usize,
    mean: f64,
    /// Sum of squared deviations from the running mean.
    m2: f64,
    min: Option<f64>,
    max: Option<f64>,
    last: Option<f64>,
}

/// Immutable view of a [`NumericSummary`], handed out to callers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericSnapshot {
    pub n: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub std_err: f64,
    /// `None` until something has been added.
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumericSummary {
    pub fn new() -> Self {
        Self {
            n: 0,
            mean: 0.0,
            m2: 0.0,
            min: None,
            max: None,
            last: None,
        }
    }

    pub fn add(&mut self, x: f64) {
        self.n += 1;
        let delta = x - self.mean;
        self.mean += delta / self.n as f64;
        self.m2 += delta * (x - self.mean);
        self.min = Some(self.min.map_or(x, |m| m.min(x)));
        self.max = Some(self.max.map_or(x, |m| m.max(x)));
        self.last = Some(x);
    }

    /// Fold `other` into this summary (Chan et al. pairwise update).
    pub fn merge(&mut self, other: &NumericSummary) {
        if other.n == 0 {
            return;
        }
        if self.n == 0 {
            *self = other.clone();
            return;
        }
        let n_a = self.n as f64;
        let n_b = other.n as f64;
        let n = n_a + n_b;
        let delta = other.mean - self.mean;
        self.mean += delta * n_b / n;
        self.m2 += other.m2 + delta * delta * n_a * n_b / n;
        self.n += other.n;
        self.min = pick(self.min, other.min, f64::min);
        self.max = pick(self.max, other.max, f64::max);
        self.last = other.last.or(self.last);
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Mean of the observations; 0.0 when nothing has been added.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Unbiased sample variance (0.0 with fewer than two observations).
    pub fn variance(&self) -> f64 {
        if self.n < 2 {
            0.0
        } else {
            (self.m2 / (self.n - 1) as f64).max(0.0)
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn std_err(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.std_dev() / (self.n as f64).sqrt()
        }
    }

    pub fn sum(&self) -> f64 {
        self.mean * self.n as f64
    }

    pub fn min(&self) -> Option<f64> {
        self.min
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }

    pub fn last(&self) -> Option<f64> {
        self.last
    }

    pub fn snapshot(&self) -> NumericSnapshot {
        NumericSnapshot {
            n: self.n,
            mean: self.mean,
            std_dev: self.std_dev(),
            std_err: self.std_err(),
            min: self.min,
            max: self.max,
        }
    }
}

fn pick(a: Option<f64>, b: Option<f64>, f: fn(f64, f64) -> f64) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b)),
        (a, b) => a.or(b),
    }
}

impl Default for NumericSummary {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<f64> for NumericSummary {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut summary = Self::new();
        for x in iter {
            summary.add(x);
        }
        summary
    }
}
