//! The N-tuple landscape model.
//!
//! Every sampled point is projected onto a fixed set of dimension subsets
//! (tuples). Each distinct projection keeps a running summary of the
//! fitness values seen there. The mean estimate of a point is the average
//! of the tuple means it touches, and the exploration bonus shrinks as the
//! least-visited of those tuples fills up.

use nt_stats::{NumericSnapshot, NumericSummary};
use nt_types::{config_error, validation_error, NtResult, Point};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::info;

use crate::search::SearchSpace;

/// Added to visit counts in the generalised-mean bonus so unvisited
/// tuples stay finite.
const EPSILON: f64 = 0.1;

/// Which dimension subsets the model tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TupleConfig {
    pub one: bool,
    pub two: bool,
    pub three: bool,
    /// The single tuple spanning every dimension.
    pub n: bool,
    /// Additional arbitrary subsets.
    pub extra: Vec<Vec<usize>>,
}

impl Default for TupleConfig {
    fn default() -> Self {
        Self {
            one: true,
            two: false,
            three: false,
            n: true,
            extra: Vec::new(),
        }
    }
}

impl TupleConfig {
    /// Concrete tuples for an `n_dims` space: 1, 2, 3, N then extras,
    /// each dimension list sorted, duplicates dropped.
    pub fn build(&self, n_dims: usize) -> NtResult<Vec<Vec<usize>>> {
        let mut tuples: Vec<Vec<usize>> = Vec::new();
        if self.one {
            tuples.extend((0..n_dims).map(|i| vec![i]));
        }
        if self.two {
            for i in 0..n_dims {
                for j in i + 1..n_dims {
                    tuples.push(vec![i, j]);
                }
            }
        }
        if self.three {
            for i in 0..n_dims {
                for j in i + 1..n_dims {
                    for k in j + 1..n_dims {
                        tuples.push(vec![i, j, k]);
                    }
                }
            }
        }
        if self.n {
            tuples.push((0..n_dims).collect());
        }
        for extra in &self.extra {
            let mut dims = extra.clone();
            dims.sort_unstable();
            dims.dedup();
            if dims.is_empty() {
                return Err(config_error!("extra tuple must name at least one dimension"));
            }
            if let Some(&bad) = dims.iter().find(|&&d| d >= n_dims) {
                return Err(config_error!(
                    "extra tuple {:?} names dimension {} but the space has {}",
                    extra,
                    bad,
                    n_dims
                ));
            }
            tuples.push(dims);
        }

        let mut seen = HashSet::new();
        tuples.retain(|t| seen.insert(t.clone()));
        if tuples.is_empty() {
            return Err(config_error!("no tuples configured"));
        }
        Ok(tuples)
    }
}

/// How the exploration bonus combines the visit counts of a point's tuples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ExplorationRule {
    /// `k * sqrt(ln(total) / min_visits)`: driven by the least-visited tuple.
    WeakestLink,
    /// Generalised mean, with `exponent`, of a per-tuple bonus vector.
    GeneralisedMean { exponent: f64, simple_regret: bool },
}

impl Default for ExplorationRule {
    fn default() -> Self {
        Self::WeakestLink
    }
}

/// Mean estimate used for a point none of whose tuples has been seen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoInformation {
    Zero,
    GlobalMean,
    Value(f64),
}

impl Default for NoInformation {
    fn default() -> Self {
        Self::GlobalMean
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LandscapeConfig {
    pub tuples: TupleConfig,
    pub k_explore: f64,
    pub exploration: ExplorationRule,
    pub no_information: NoInformation,
    /// Tuples smaller than this are ignored by the mean estimate.
    pub min_tuple_size: usize,
}

impl Default for LandscapeConfig {
    fn default() -> Self {
        Self {
            tuples: TupleConfig::default(),
            k_explore: 1.0,
            exploration: ExplorationRule::default(),
            no_information: NoInformation::default(),
            min_tuple_size: 1,
        }
    }
}

/// One line of [`NTupleLandscape::tuple_report`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TupleStatRow {
    pub dims: Vec<usize>,
    pub values: Vec<usize>,
    pub count: usize,
    pub mean: f64,
    pub std_err: f64,
    pub exploration: f64,
}

#[derive(Debug, Clone)]
struct Tuple {
    dims: Vec<usize>,
    stats: HashMap<Vec<usize>, NumericSummary>,
}

impl Tuple {
    fn get(&self, point: &Point) -> Option<&NumericSummary> {
        self.stats.get(&point.project(&self.dims))
    }

    fn count(&self, point: &Point) -> usize {
        self.get(point).map_or(0, NumericSummary::n)
    }
}

#[derive(Debug, Clone)]
pub struct NTupleLandscape {
    space: Arc<dyn SearchSpace>,
    config: LandscapeConfig,
    tuples: Vec<Tuple>,
    /// Every fitness value added since the last reset.
    all: NumericSummary,
    sampled: Vec<Point>,
    sampled_set: HashSet<Point>,
    best: Option<(Point, f64)>,
}

impl NTupleLandscape {
    pub fn new(space: Arc<dyn SearchSpace>, config: LandscapeConfig) -> NtResult<Self> {
        space.validate()?;
        if !config.k_explore.is_finite() || config.k_explore < 0.0 {
            return Err(config_error!(
                "k_explore must be a non-negative number, got {}",
                config.k_explore
            ));
        }
        let tuples = config
            .tuples
            .build(space.n_dims())?
            .into_iter()
            .map(|dims| Tuple {
                dims,
                stats: HashMap::new(),
            })
            .collect();

        Ok(Self {
            space,
            config,
            tuples,
            all: NumericSummary::new(),
            sampled: Vec::new(),
            sampled_set: HashSet::new(),
            best: None,
        })
    }

    pub fn space(&self) -> &Arc<dyn SearchSpace> {
        &self.space
    }

    pub fn config(&self) -> &LandscapeConfig {
        &self.config
    }

    /// Dimension lists of the tracked tuples, in model order.
    pub fn tuple_dims(&self) -> Vec<Vec<usize>> {
        self.tuples.iter().map(|t| t.dims.clone()).collect()
    }

    pub fn reset(&mut self) {
        for tuple in &mut self.tuples {
            tuple.stats.clear();
        }
        self.all = NumericSummary::new();
        self.sampled.clear();
        self.sampled_set.clear();
        self.best = None;
    }

    pub fn add_sample(&mut self, point: &Point, fitness: f64) -> NtResult<()> {
        self.space.check_point(point)?;
        if !fitness.is_finite() {
            return Err(validation_error!("non-finite fitness {} for {}", fitness, point));
        }

        for tuple in &mut self.tuples {
            tuple
                .stats
                .entry(point.project(&tuple.dims))
                .or_default()
                .add(fitness);
        }
        self.all.add(fitness);
        if self.sampled_set.insert(point.clone()) {
            self.sampled.push(point.clone());
        }

        let estimate = self.mean_estimate(point);
        if self.best.as_ref().map_or(true, |(_, best)| estimate > *best) {
            self.best = Some((point.clone(), estimate));
        }
        Ok(())
    }

    fn counted_tuples(&self) -> impl Iterator<Item = &Tuple> {
        let min = self.config.min_tuple_size;
        self.tuples.iter().filter(move |t| t.dims.len() >= min)
    }

    pub fn mean_estimate(&self, point: &Point) -> f64 {
        let means = NumericSummary::from_iter(
            self.counted_tuples()
                .filter_map(|t| t.get(point))
                .filter(|s| s.n() > 0)
                .map(NumericSummary::mean),
        );

        if means.is_empty() {
            match self.config.no_information {
                NoInformation::Zero => 0.0,
                NoInformation::GlobalMean => self.all.mean(),
                NoInformation::Value(v) => v,
            }
        } else {
            means.mean()
        }
    }

    /// Exploration term for a tuple cell visited `n` times.
    fn tuple_exploration(&self, n: usize) -> f64 {
        let total = self.all.n();
        match self.config.exploration {
            ExplorationRule::WeakestLink => {
                let ln_total = (total.max(1) as f64).ln();
                self.config.k_explore * (ln_total / n.max(1) as f64).sqrt()
            }
            ExplorationRule::GeneralisedMean { simple_regret, .. } => {
                let big_n = 1.0 + total as f64;
                let raw = if simple_regret {
                    big_n.sqrt() / (EPSILON + n as f64)
                } else {
                    (big_n / (EPSILON + n as f64)).ln().max(0.0).sqrt()
                };
                self.config.k_explore * raw
            }
        }
    }

    pub fn exploration_bonus(&self, point: &Point) -> f64 {
        match self.config.exploration {
            ExplorationRule::WeakestLink => {
                let min_visits = self
                    .counted_tuples()
                    .map(|t| t.count(point))
                    .min()
                    .unwrap_or(0);
                self.tuple_exploration(min_visits)
            }
            ExplorationRule::GeneralisedMean { exponent, .. } => {
                let terms: Vec<f64> = self
                    .counted_tuples()
                    .map(|t| self.tuple_exploration(t.count(point)))
                    .collect();
                generalised_mean(&terms, exponent)
            }
        }
    }

    pub fn upper_bound(&self, point: &Point) -> f64 {
        self.mean_estimate(point) + self.exploration_bonus(point)
    }

    pub fn lower_bound(&self, point: &Point) -> f64 {
        self.mean_estimate(point) - self.exploration_bonus(point)
    }

    /// Point whose estimate was highest at the moment it was added.
    pub fn best_sampled(&self) -> Option<Point> {
        self.best.as_ref().map(|(p, _)| p.clone())
    }

    /// Sampled point with the highest estimate under the current model.
    pub fn best_of_sampled(&self) -> Option<Point> {
        let mut best: Option<(&Point, f64)> = None;
        for point in &self.sampled {
            let estimate = self.mean_estimate(point);
            if best.map_or(true, |(_, b)| estimate > b) {
                best = Some((point, estimate));
            }
        }
        best.map(|(p, _)| p.clone())
    }

    /// Total fitness values added since the last reset.
    pub fn n_samples(&self) -> usize {
        self.all.n()
    }

    /// Distinct sampled points in first-seen order.
    pub fn sampled_points(&self) -> &[Point] {
        &self.sampled
    }

    pub fn tuple_count(&self) -> usize {
        self.tuples.len()
    }

    /// Summary of the cell of tuple `dims` that `point` falls in.
    pub fn accumulator(&self, dims: &[usize], point: &Point) -> Option<NumericSnapshot> {
        self.tuples
            .iter()
            .find(|t| t.dims == dims)
            .and_then(|t| t.get(point))
            .map(NumericSummary::snapshot)
    }

    /// Number of distinct cells seen, indexed by tuple size minus one.
    pub fn tuples_explored_by_size(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.space.n_dims()];
        for tuple in &self.tuples {
            sizes[tuple.dims.len() - 1] += tuple.stats.len();
        }
        sizes
    }

    /// Every populated cell, ordered by tuple then by cell values.
    pub fn tuple_report(&self) -> Vec<TupleStatRow> {
        let mut rows = Vec::new();
        for tuple in &self.tuples {
            let mut cells: Vec<_> = tuple.stats.iter().collect();
            cells.sort_by(|a, b| a.0.cmp(b.0));
            for (values, stats) in cells {
                rows.push(TupleStatRow {
                    dims: tuple.dims.clone(),
                    values: values.clone(),
                    count: stats.n(),
                    mean: stats.mean(),
                    std_err: stats.std_err(),
                    exploration: self.tuple_exploration(stats.n()),
                });
            }
        }
        rows
    }

    pub fn log_results(&self) {
        let Some(best) = self.best_sampled() else {
            info!("No samples in the landscape model");
            return;
        };
        let n_dims = self.space.n_dims();
        info!(
            "Current best sampled point (using mean estimate): {}, {:.3}",
            best,
            self.mean_estimate(&best)
        );
        info!("Tuples explored by size: {:?}", self.tuples_explored_by_size());
        info!("Summary of 1-tuple statistics after {} samples:", self.n_samples());

        for tuple in self.tuples.iter().filter(|t| t.dims.len() == 1) {
            let dim = tuple.dims[0];
            let mut cells: Vec<_> = tuple.stats.iter().collect();
            cells.sort_by(|a, b| a.0.cmp(b.0));
            for (values, stats) in cells {
                info!(
                    "\t{:>20}\t{}\t{} trials\t mean {:.3} +/- {:.2}",
                    self.space.name(dim),
                    self.space.value(dim, values[0]),
                    stats.n(),
                    stats.mean(),
                    stats.std_err()
                );
            }
        }

        info!("Summary of 10 most tried full-tuple statistics:");
        for tuple in self.tuples.iter().filter(|t| t.dims.len() == n_dims) {
            let mut cells: Vec<_> = tuple.stats.iter().collect();
            cells.sort_by(|a, b| b.1.n().cmp(&a.1.n()).then_with(|| a.0.cmp(b.0)));
            for (values, stats) in cells.into_iter().take(10) {
                let point = Point::new(values.clone());
                info!(
                    "\t{}\t{} trials\t mean {:.3} +/- {:.2}\t(NTuple estimate: {:.3})",
                    point,
                    stats.n(),
                    stats.mean(),
                    stats.std_err(),
                    self.mean_estimate(&point)
                );
            }
        }
    }
}

/// `(mean(x^p))^(1/p)`, with `p == 0` taken as the geometric mean.
fn generalised_mean(xs: &[f64], p: f64) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let n = xs.len() as f64;
    if p == 0.0 {
        if xs.iter().any(|&x| x <= 0.0) {
            return 0.0;
        }
        (xs.iter().map(|x| x.ln()).sum::<f64>() / n).exp()
    } else if p.is_infinite() {
        let fold = if p > 0.0 { f64::max } else { f64::min };
        xs.iter().copied().reduce(fold).unwrap_or(0.0)
    } else {
        (xs.iter().map(|x| x.powf(p)).sum::<f64>() / n).powf(1.0 / p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::ParameterSpace;
    use nt_types::NtError;

    fn space(cards: &[usize]) -> Arc<dyn SearchSpace> {
        let mut space = ParameterSpace::new();
        for (d, &n) in cards.iter().enumerate() {
            space = space.add_int_range(format!("p{d}"), 0, n as i64 - 1, 1);
        }
        Arc::new(space)
    }

    fn model(cards: &[usize]) -> NTupleLandscape {
        NTupleLandscape::new(space(cards), LandscapeConfig::default()).unwrap()
    }

    fn p(indices: &[usize]) -> Point {
        Point::new(indices.to_vec())
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn builds_and_dedupes_tuples() {
        let config = TupleConfig {
            one: true,
            two: true,
            three: true,
            n: true,
            extra: vec![vec![2, 0], vec![1]],
        };
        let tuples = config.build(3).unwrap();
        assert_eq!(
            tuples,
            vec![
                vec![0],
                vec![1],
                vec![2],
                vec![0, 1],
                vec![0, 2],
                vec![1, 2],
                vec![0, 1, 2],
            ]
        );

        // One dimension: the 1-tuple and the N-tuple coincide.
        assert_eq!(TupleConfig::default().build(1).unwrap(), vec![vec![0]]);
    }

    #[test]
    fn rejects_bad_tuple_configs() {
        let none = TupleConfig {
            one: false,
            n: false,
            ..TupleConfig::default()
        };
        assert!(matches!(none.build(3), Err(NtError::Config(_))));

        let out_of_range = TupleConfig {
            extra: vec![vec![0, 5]],
            ..TupleConfig::default()
        };
        assert!(out_of_range.build(3).is_err());

        let empty = TupleConfig {
            extra: vec![vec![]],
            ..TupleConfig::default()
        };
        assert!(empty.build(3).is_err());

        let negative_k = LandscapeConfig {
            k_explore: -1.0,
            ..LandscapeConfig::default()
        };
        assert!(NTupleLandscape::new(space(&[2]), negative_k).is_err());
    }

    #[test]
    fn mean_estimate_averages_touched_tuples() {
        let mut m = model(&[2, 2]);
        m.add_sample(&p(&[0, 0]), 1.0).unwrap();
        m.add_sample(&p(&[0, 1]), 0.0).unwrap();

        // [0]: 0.5, [0] on dim 1: 1.0, full: 1.0
        assert!(close(m.mean_estimate(&p(&[0, 0])), (0.5 + 1.0 + 1.0) / 3.0));
        // only dim 1 = 1 has been seen
        assert!(close(m.mean_estimate(&p(&[1, 1])), 0.0));

        let full_only = NTupleLandscape::new(
            space(&[2, 2]),
            LandscapeConfig {
                min_tuple_size: 2,
                ..LandscapeConfig::default()
            },
        );
        let mut full_only = full_only.unwrap();
        full_only.add_sample(&p(&[0, 0]), 1.0).unwrap();
        full_only.add_sample(&p(&[0, 1]), 0.0).unwrap();
        assert!(close(full_only.mean_estimate(&p(&[0, 0])), 1.0));
    }

    #[test]
    fn no_information_defaults() {
        let mut global = model(&[2, 2]);
        assert_eq!(global.mean_estimate(&p(&[1, 1])), 0.0);
        global.add_sample(&p(&[0, 0]), 0.8).unwrap();
        global.add_sample(&p(&[0, 0]), 0.4).unwrap();
        assert!(close(global.mean_estimate(&p(&[1, 1])), 0.6));

        for (rule, expected) in [(NoInformation::Zero, 0.0), (NoInformation::Value(0.3), 0.3)] {
            let mut m = NTupleLandscape::new(
                space(&[2, 2]),
                LandscapeConfig {
                    no_information: rule,
                    ..LandscapeConfig::default()
                },
            )
            .unwrap();
            m.add_sample(&p(&[0, 0]), 0.8).unwrap();
            assert_eq!(m.mean_estimate(&p(&[1, 1])), expected);
        }
    }

    #[test]
    fn weakest_link_bonus() {
        let mut m = model(&[2, 2]);
        assert_eq!(m.exploration_bonus(&p(&[0, 0])), 0.0);

        m.add_sample(&p(&[0, 0]), 1.0).unwrap();
        // ln(1) = 0 after a single sample
        assert_eq!(m.exploration_bonus(&p(&[1, 1])), 0.0);

        m.add_sample(&p(&[0, 1]), 0.0).unwrap();
        let ln2 = 2f64.ln();
        // counts 2, 1, 1 -> weakest is 1
        assert!(close(m.exploration_bonus(&p(&[0, 0])), ln2.sqrt()));
        // unvisited cells floor at one visit
        assert!(close(m.exploration_bonus(&p(&[1, 0])), ln2.sqrt()));

        for _ in 0..6 {
            m.add_sample(&p(&[0, 0]), 1.0).unwrap();
        }
        // counts 8, 7, 7 over 8 samples
        let expected = (8f64.ln() / 7.0).sqrt();
        assert!(close(m.exploration_bonus(&p(&[0, 0])), expected));
        assert!(m.exploration_bonus(&p(&[1, 0])) > expected);

        let upper = m.upper_bound(&p(&[0, 0]));
        let lower = m.lower_bound(&p(&[0, 0]));
        assert!(close(upper - lower, 2.0 * expected));
    }

    #[test]
    fn k_explore_scales_bonus() {
        let mut m = NTupleLandscape::new(
            space(&[2, 2]),
            LandscapeConfig {
                k_explore: 2.0,
                ..LandscapeConfig::default()
            },
        )
        .unwrap();
        m.add_sample(&p(&[0, 0]), 1.0).unwrap();
        m.add_sample(&p(&[0, 1]), 0.0).unwrap();
        assert!(close(m.exploration_bonus(&p(&[0, 0])), 2.0 * 2f64.ln().sqrt()));
    }

    #[test]
    fn generalised_mean_bonus() {
        let mut m = NTupleLandscape::new(
            space(&[2, 2]),
            LandscapeConfig {
                exploration: ExplorationRule::GeneralisedMean {
                    exponent: 1.0,
                    simple_regret: false,
                },
                ..LandscapeConfig::default()
            },
        )
        .unwrap();
        m.add_sample(&p(&[0, 0]), 1.0).unwrap();
        m.add_sample(&p(&[0, 1]), 0.0).unwrap();

        let term = |n: f64| (3.0 / (0.1 + n)).ln().sqrt();
        let expected = (term(2.0) + term(1.0) + term(1.0)) / 3.0;
        assert!(close(m.exploration_bonus(&p(&[0, 0])), expected));

        let mut regret = NTupleLandscape::new(
            space(&[2, 2]),
            LandscapeConfig {
                exploration: ExplorationRule::GeneralisedMean {
                    exponent: 1.0,
                    simple_regret: true,
                },
                ..LandscapeConfig::default()
            },
        )
        .unwrap();
        regret.add_sample(&p(&[0, 0]), 1.0).unwrap();
        // every tuple has one visit out of one sample
        let expected = 2f64.sqrt() / 1.1;
        assert!(close(regret.exploration_bonus(&p(&[0, 0])), expected));
    }

    #[test]
    fn generalised_mean_limits() {
        let xs = [1.0, 4.0];
        assert!(close(generalised_mean(&xs, 1.0), 2.5));
        assert!(close(generalised_mean(&xs, 0.0), 2.0));
        assert!(close(generalised_mean(&xs, f64::NEG_INFINITY), 1.0));
        assert!(close(generalised_mean(&xs, f64::INFINITY), 4.0));
        assert_eq!(generalised_mean(&[], 2.0), 0.0);
    }

    #[test]
    fn best_sampled_is_recorded_at_insertion() {
        let mut m = model(&[2, 2]);
        assert_eq!(m.best_sampled(), None);
        assert_eq!(m.best_of_sampled(), None);

        m.add_sample(&p(&[0, 0]), 1.0).unwrap();
        m.add_sample(&p(&[0, 0]), 0.0).unwrap();
        m.add_sample(&p(&[1, 1]), 0.8).unwrap();

        // (0,0) scored 1.0 when first added; it now estimates 0.5
        assert_eq!(m.best_sampled(), Some(p(&[0, 0])));
        assert_eq!(m.best_of_sampled(), Some(p(&[1, 1])));
        assert_eq!(m.n_samples(), 3);
        assert_eq!(m.sampled_points(), &[p(&[0, 0]), p(&[1, 1])]);
    }

    #[test]
    fn ties_keep_the_earlier_point() {
        let mut m = model(&[2, 2]);
        m.add_sample(&p(&[0, 0]), 0.5).unwrap();
        m.add_sample(&p(&[1, 1]), 0.5).unwrap();
        assert_eq!(m.best_sampled(), Some(p(&[0, 0])));
        assert_eq!(m.best_of_sampled(), Some(p(&[0, 0])));
    }

    #[test]
    fn reset_discards_everything() {
        let mut m = model(&[3, 3]);
        m.add_sample(&p(&[1, 2]), 0.7).unwrap();
        assert_eq!(m.accumulator(&[0], &p(&[1, 0])).map(|s| s.n), Some(1));

        m.reset();
        assert!(m.accumulator(&[0], &p(&[1, 0])).is_none());
        assert_eq!(m.n_samples(), 0);
        assert!(m.sampled_points().is_empty());
        assert_eq!(m.best_sampled(), None);
        assert_eq!(m.tuples_explored_by_size(), vec![0, 0]);
        assert_eq!(m.tuple_count(), 3);
    }

    #[test]
    fn add_sample_validates() {
        let mut m = model(&[2, 2]);
        assert!(matches!(
            m.add_sample(&p(&[0, 2]), 1.0),
            Err(NtError::Point(_))
        ));
        assert!(matches!(
            m.add_sample(&p(&[0]), 1.0),
            Err(NtError::Point(_))
        ));
        assert!(matches!(
            m.add_sample(&p(&[0, 0]), f64::INFINITY),
            Err(NtError::Validation(_))
        ));
        assert_eq!(m.n_samples(), 0);
    }

    #[test]
    fn accumulators_follow_welford() {
        let mut m = model(&[3, 3]);
        for (q, f) in [([0usize, 1], 0.2), ([0, 2], 0.4), ([1, 1], 0.9), ([0, 1], 0.6)] {
            m.add_sample(&p(&q), f).unwrap();
        }
        let dim0 = m.accumulator(&[0], &p(&[0, 0])).unwrap();
        assert_eq!(dim0.n, 3);
        assert!(close(dim0.mean, 0.4));
        let cell = m.accumulator(&[0, 1], &p(&[0, 1])).unwrap();
        assert_eq!(cell.n, 2);
        assert!(close(cell.mean, 0.4));
        assert!(m.accumulator(&[1, 0], &p(&[0, 1])).is_none());

        // cells: dim0 {0,1}, dim1 {1,2}, full {01,02,11}
        assert_eq!(m.tuples_explored_by_size(), vec![4, 3]);

        let report = m.tuple_report();
        assert_eq!(report.len(), 7);
        assert_eq!(report[0].dims, vec![0]);
        assert_eq!(report[0].values, vec![0]);
        assert_eq!(report[0].count, 3);
        let full_01 = report
            .iter()
            .find(|r| r.dims == vec![0, 1] && r.values == vec![0, 1])
            .unwrap();
        assert_eq!(full_01.count, 2);
        assert!(close(full_01.exploration, (4f64.ln() / 2.0).sqrt()));
    }
}
