//! A single summary type over the three kinds of statistic the optimizer
//! keeps: numbers, categories and values over time.

use nt_types::{validation_error, NtResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::numeric::{NumericSnapshot, NumericSummary};
use crate::occurrence::OccurrenceSummary;
use crate::timeseries::TimeSeriesSummary;

/// One observation fed to a [`StatSummary`].
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    Number(f64),
    Category(String),
    Timed { tick: u64, value: f64 },
}

impl From<f64> for Observation {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for Observation {
    fn from(v: &str) -> Self {
        Self::Category(v.to_string())
    }
}

impl From<String> for Observation {
    fn from(v: String) -> Self {
        Self::Category(v)
    }
}

/// Which variant a summary is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryKind {
    Numeric,
    Occurrence,
    TimeSeries,
}

/// A named running statistic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatSummary {
    Numeric(NumericSummary),
    Occurrence(OccurrenceSummary),
    TimeSeries(TimeSeriesSummary),
}

/// Serializable read-out of any summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SummaryView {
    Numeric(NumericSnapshot),
    Occurrence {
        n: usize,
        mode: Option<String>,
        counts: BTreeMap<String, usize>,
    },
    TimeSeries {
        n: usize,
        last: Option<(u64, f64)>,
        values: NumericSnapshot,
    },
}

impl StatSummary {
    pub fn numeric() -> Self {
        Self::Numeric(NumericSummary::new())
    }

    pub fn occurrence() -> Self {
        Self::Occurrence(OccurrenceSummary::new())
    }

    pub fn time_series() -> Self {
        Self::TimeSeries(TimeSeriesSummary::new())
    }

    pub fn kind(&self) -> SummaryKind {
        match self {
            Self::Numeric(_) => SummaryKind::Numeric,
            Self::Occurrence(_) => SummaryKind::Occurrence,
            Self::TimeSeries(_) => SummaryKind::TimeSeries,
        }
    }

    /// Record one observation. The observation must suit the summary kind;
    /// a number is accepted by a time series only with an explicit tick.
    pub fn add(&mut self, observation: impl Into<Observation>) -> NtResult<()> {
        match (self, observation.into()) {
            (Self::Numeric(s), Observation::Number(x)) => s.add(x),
            (Self::Numeric(s), Observation::Timed { value, .. }) => s.add(value),
            (Self::Occurrence(s), Observation::Category(key)) => s.add(key),
            (Self::TimeSeries(s), Observation::Timed { tick, value }) => s.add(tick, value),
            (summary, obs) => {
                return Err(validation_error!(
                    "cannot add {:?} to a {:?} summary",
                    obs,
                    summary.kind()
                ))
            }
        }
        Ok(())
    }

    pub fn merge(&mut self, other: &StatSummary) -> NtResult<()> {
        match (self, other) {
            (Self::Numeric(a), Self::Numeric(b)) => a.merge(b),
            (Self::Occurrence(a), Self::Occurrence(b)) => a.merge(b),
            (Self::TimeSeries(a), Self::TimeSeries(b)) => a.merge(b),
            (a, b) => {
                return Err(validation_error!(
                    "cannot merge a {:?} summary into a {:?} summary",
                    b.kind(),
                    a.kind()
                ))
            }
        }
        Ok(())
    }

    pub fn n(&self) -> usize {
        match self {
            Self::Numeric(s) => s.n(),
            Self::Occurrence(s) => s.n(),
            Self::TimeSeries(s) => s.n(),
        }
    }

    pub fn summary(&self) -> SummaryView {
        match self {
            Self::Numeric(s) => SummaryView::Numeric(s.snapshot()),
            Self::Occurrence(s) => SummaryView::Occurrence {
                n: s.n(),
                mode: s.mode().map(|(key, _)| key.to_string()),
                counts: s.counts().clone(),
            },
            Self::TimeSeries(s) => SummaryView::TimeSeries {
                n: s.n(),
                last: s.last(),
                values: s.values().snapshot(),
            },
        }
    }

    pub fn as_numeric(&self) -> Option<&NumericSummary> {
        match self {
            Self::Numeric(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_occurrence(&self) -> Option<&OccurrenceSummary> {
        match self {
            Self::Occurrence(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_time_series(&self) -> Option<&TimeSeriesSummary> {
        match self {
            Self::TimeSeries(s) => Some(s),
            _ => None,
        }
    }
}
