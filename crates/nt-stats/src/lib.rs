//! Running statistics for the NTBEA tuner.
//!
//! Provides:
//! - Welford numeric summaries that merge exactly across threads
//! - Category counters for reporting which values won
//! - Tick-indexed series for convergence traces
//! - Normal quantiles for significance tests between noisy means

pub mod inference;
pub mod numeric;
pub mod occurrence;
pub mod summary;
pub mod timeseries;

pub use inference::{mean_diff_std_err, normal_quantile, standard_z_score};
pub use numeric::{NumericSnapshot, NumericSummary};
pub use occurrence::OccurrenceSummary;
pub use summary::{Observation, StatSummary, SummaryKind, SummaryView};
pub use timeseries::TimeSeriesSummary;
