//! Counts of categorical outcomes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How often each category has been seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OccurrenceSummary {
    counts: BTreeMap<String, usize>,
    n: usize,
}

impl OccurrenceSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: impl Into<String>) {
        *self.counts.entry(key.into()).or_insert(0) += 1;
        self.n += 1;
    }

    pub fn merge(&mut self, other: &OccurrenceSummary) {
        for (key, count) in &other.counts {
            *self.counts.entry(key.clone()).or_insert(0) += count;
        }
        self.n += other.n;
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn count(&self, key: &str) -> usize {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn proportion(&self, key: &str) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.count(key) as f64 / self.n as f64
        }
    }

    /// Most frequent category; ties go to the lexicographically smallest key.
    pub fn mode(&self) -> Option<(&str, usize)> {
        self.counts
            .iter()
            .fold(None, |best: Option<(&str, usize)>, (key, &count)| match best {
                Some((_, c)) if c >= count => best,
                _ => Some((key.as_str(), count)),
            })
    }

    pub fn counts(&self) -> &BTreeMap<String, usize> {
        &self.counts
    }
}
