//! The bandit-guided evolutionary walk.
//!
//! Each iteration proposes every one-dimension mutation of the current
//! point (or a random subset of them), picks the one with the highest
//! upper confidence bound under the landscape model, evaluates it once,
//! and moves there whatever the outcome.

use nt_types::{config_error, NtResult, Point, PointError};
use rand::seq::index;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::evaluator::SolutionEvaluator;
use crate::landscape::NTupleLandscape;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BanditConfig {
    /// Maximum number of mutations scored per iteration.
    pub neighbourhood_size: usize,
    pub seed: u64,
}

impl Default for BanditConfig {
    fn default() -> Self {
        Self {
            neighbourhood_size: 50,
            seed: 0,
        }
    }
}

/// One evaluated point of the walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub point: Point,
    pub fitness: f64,
    /// Model estimate of the best sampled point after this step.
    pub best_estimate: f64,
}

#[derive(Debug, Clone)]
pub struct NTupleBanditEa {
    landscape: NTupleLandscape,
    config: BanditConfig,
    rng: ChaCha8Rng,
    elites: Vec<Point>,
    next_elite: usize,
    current: Option<Point>,
    history: Vec<Step>,
}

impl NTupleBanditEa {
    pub fn new(landscape: NTupleLandscape, config: BanditConfig) -> NtResult<Self> {
        if config.neighbourhood_size == 0 {
            return Err(config_error!("neighbourhood_size must be at least 1"));
        }
        Ok(Self {
            landscape,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            elites: Vec::new(),
            next_elite: 0,
            current: None,
            history: Vec::new(),
        })
    }

    /// Starting points used, in turn, each time the walk is (re)started.
    pub fn set_elites(&mut self, elites: Vec<Point>) -> NtResult<()> {
        for elite in &elites {
            self.landscape.space().check_point(elite)?;
        }
        self.elites = elites;
        self.next_elite = 0;
        Ok(())
    }

    /// Forget the model and the walk. The random stream continues.
    pub fn reset(&mut self) {
        self.landscape.reset();
        self.current = None;
        self.history.clear();
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Prepare for repeat number `repeat`: fresh model, fresh random stream,
    /// and the elite that repeat should start from.
    pub fn begin_repeat(&mut self, repeat: usize, seed: u64) {
        self.reseed(seed);
        self.reset();
        self.next_elite = repeat;
    }

    /// Run `iterations` evaluations, continuing from the current model.
    pub fn run_trial<E>(&mut self, evaluator: &mut E, iterations: usize) -> NtResult<()>
    where
        E: SolutionEvaluator + ?Sized,
    {
        if iterations == 0 {
            return Err(config_error!("iterations must be at least 1"));
        }
        let expected = self.landscape.space().n_dims();
        let actual = evaluator.search_space().n_dims();
        if expected != actual {
            return Err(PointError::DimensionMismatch { expected, actual }.into());
        }

        let mut current = match self.current.take() {
            Some(point) => point,
            None => self.start_point(),
        };

        for _ in 0..iterations {
            match self.step(evaluator, &current) {
                Ok(next) => current = next,
                Err(e) => {
                    // a later trial carries on from the last good point
                    self.current = Some(current);
                    return Err(e);
                }
            }
        }

        self.current = Some(current);
        Ok(())
    }

    /// Choose, evaluate and record one mutation of `current`.
    fn step<E>(&mut self, evaluator: &mut E, current: &Point) -> NtResult<Point>
    where
        E: SolutionEvaluator + ?Sized,
    {
        let candidates = self.neighbourhood(current);
        let chosen = self.select(candidates);
        let fitness = evaluator.evaluate(&chosen)?;
        self.landscape.add_sample(&chosen, fitness)?;

        let best_estimate = self
            .landscape
            .best_sampled()
            .map_or(fitness, |best| self.landscape.mean_estimate(&best));
        debug!(
            "Iteration {}: evaluated {} -> {:.4} (best estimate {:.4})",
            self.history.len() + 1,
            chosen,
            fitness,
            best_estimate
        );
        self.history.push(Step {
            point: chosen.clone(),
            fitness,
            best_estimate,
        });
        Ok(chosen)
    }

    fn start_point(&mut self) -> Point {
        if self.elites.is_empty() {
            return self.landscape.space().random_point(&mut self.rng);
        }
        let elite = self.elites[self.next_elite % self.elites.len()].clone();
        self.next_elite += 1;
        debug!("Starting from elite {}", elite);
        elite
    }

    /// All single-coordinate mutations of `current`, dimension-major, or a
    /// random subset of them when there are more than the cap.
    fn neighbourhood(&mut self, current: &Point) -> Vec<Point> {
        let space = self.landscape.space();
        let mut all = Vec::new();
        for dim in 0..space.n_dims() {
            for value in 0..space.n_values(dim) {
                if value != current.get(dim) {
                    all.push(current.with(dim, value));
                }
            }
        }

        if all.is_empty() {
            return vec![current.clone()];
        }
        if all.len() <= self.config.neighbourhood_size {
            return all;
        }
        index::sample(&mut self.rng, all.len(), self.config.neighbourhood_size)
            .into_iter()
            .map(|i| all[i].clone())
            .collect()
    }

    /// Highest upper bound; the first candidate wins ties.
    fn select(&self, mut candidates: Vec<Point>) -> Point {
        let mut best_score = f64::NEG_INFINITY;
        let mut best_index = 0;
        for (i, candidate) in candidates.iter().enumerate() {
            let score = self.landscape.upper_bound(candidate);
            if score > best_score {
                best_score = score;
                best_index = i;
            }
        }
        candidates.swap_remove(best_index)
    }

    pub fn best_sampled(&self) -> Option<Point> {
        self.landscape.best_sampled()
    }

    pub fn best_of_sampled(&self) -> Option<Point> {
        self.landscape.best_of_sampled()
    }

    pub fn log_results(&self) {
        self.landscape.log_results();
    }

    pub fn history(&self) -> &[Step] {
        &self.history
    }

    pub fn landscape(&self) -> &NTupleLandscape {
        &self.landscape
    }

    pub fn current(&self) -> Option<&Point> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{FnEvaluator, FunctionEvaluator};
    use crate::landscape::{LandscapeConfig, TupleConfig};
    use crate::search::{FunctionSpace, ParameterSpace, SearchSpace};
    use nt_types::{NtError, ParameterValue};
    use std::sync::Arc;

    fn bandit(space: Arc<dyn SearchSpace>, config: LandscapeConfig, seed: u64) -> NTupleBanditEa {
        let landscape = NTupleLandscape::new(space, config).unwrap();
        NTupleBanditEa::new(
            landscape,
            BanditConfig {
                neighbourhood_size: 50,
                seed,
            },
        )
        .unwrap()
    }

    fn branin_evaluator(noise: f64, seed: u64) -> FunctionEvaluator {
        let space = Arc::new(FunctionSpace::new("branin", None, 5).unwrap());
        FunctionEvaluator::new(space, noise, seed).unwrap()
    }

    fn visited(ea: &NTupleBanditEa) -> Vec<Point> {
        ea.history().iter().map(|s| s.point.clone()).collect()
    }

    #[test]
    fn same_seed_same_walk() {
        let run = |seed: u64| {
            let mut eval = branin_evaluator(0.05, 3);
            let mut ea = bandit(eval.search_space(), LandscapeConfig::default(), seed);
            ea.run_trial(&mut eval, 60).unwrap();
            (visited(&ea), ea.best_sampled())
        };
        let (walk_a, best_a) = run(11);
        let (walk_b, best_b) = run(11);
        assert_eq!(walk_a, walk_b);
        assert_eq!(best_a, best_b);
        assert_eq!(walk_a.len(), 60);
    }

    #[test]
    fn counts_every_evaluation_across_trials() {
        let mut eval = branin_evaluator(0.0, 0);
        let mut ea = bandit(eval.search_space(), LandscapeConfig::default(), 1);
        ea.run_trial(&mut eval, 7).unwrap();
        ea.run_trial(&mut eval, 5).unwrap();
        ea.run_trial(&mut eval, 1).unwrap();
        assert_eq!(eval.n_evals(), 13);
        assert_eq!(ea.landscape().n_samples(), 13);
        assert_eq!(ea.history().len(), 13);
    }

    #[test]
    fn every_step_is_a_single_mutation() {
        let mut eval = branin_evaluator(0.1, 5);
        let mut ea = bandit(eval.search_space(), LandscapeConfig::default(), 2);
        ea.run_trial(&mut eval, 40).unwrap();
        for pair in ea.history().windows(2) {
            assert_eq!(pair[0].point.hamming(&pair[1].point), 1);
        }
    }

    #[test]
    fn converges_on_discretised_branin() {
        let mut eval = branin_evaluator(0.0, 0);
        let (_, optimum) = eval.function_space().function().grid_optimum(2, 5);
        // The estimate only tracks the true value this closely with a small
        // k: with k = 1 the walk keeps visiting poor cells and the 1-tuple
        // means sit well below the optimum.
        let config = LandscapeConfig {
            k_explore: 0.1,
            tuples: TupleConfig::default(),
            ..LandscapeConfig::default()
        };
        let mut ea = bandit(eval.search_space(), config, 42);
        ea.run_trial(&mut eval, 200).unwrap();

        let best = ea.best_sampled().unwrap();
        let estimate = ea.landscape().mean_estimate(&best);
        assert!(
            optimum - estimate <= 0.05,
            "best {best} estimated at {estimate}, grid optimum {optimum}"
        );
    }

    #[test]
    fn parabola_lands_next_to_peak() {
        let space: Arc<dyn SearchSpace> =
            Arc::new(ParameterSpace::new().add_float_steps("x", 0.0, 1.0, 10));
        let run = || {
            let mut eval = FnEvaluator::new(space.clone(), |v: &[ParameterValue]| {
                let x = v[0].as_f64().unwrap_or(0.0);
                Ok(-(x - 0.7) * (x - 0.7))
            });
            let mut ea = bandit(space.clone(), LandscapeConfig::default(), 8);
            ea.run_trial(&mut eval, 50).unwrap();
            ea.best_sampled().unwrap()
        };
        let best = run();
        let x = space.value(0, best.get(0)).as_f64().unwrap();
        assert!(
            (x - 0.7).abs() <= 1.0 / 9.0,
            "best x = {x} is more than one step from 0.7"
        );
        assert_eq!(run(), best);
    }

    #[test]
    fn elite_start_is_mutated_once() {
        let mut eval = branin_evaluator(0.0, 0);
        let mut ea = bandit(eval.search_space(), LandscapeConfig::default(), 4);
        let elite = Point::new(vec![2, 3]);
        ea.set_elites(vec![elite.clone()]).unwrap();
        ea.run_trial(&mut eval, 1).unwrap();

        let first = &ea.history()[0].point;
        assert_eq!(first.hamming(&elite), 1);
        assert_eq!(eval.n_evals(), 1);
    }

    #[test]
    fn elites_are_used_round_robin() {
        let mut eval = branin_evaluator(0.0, 0);
        let mut ea = bandit(eval.search_space(), LandscapeConfig::default(), 4);
        let elites = vec![Point::new(vec![0, 0]), Point::new(vec![4, 4])];
        ea.set_elites(elites.clone()).unwrap();

        for repeat in 0..3 {
            ea.reset();
            ea.run_trial(&mut eval, 1).unwrap();
            let elite = &elites[repeat % 2];
            assert_eq!(ea.history()[0].point.hamming(elite), 1);
        }

        ea.begin_repeat(1, 9);
        ea.run_trial(&mut eval, 1).unwrap();
        assert_eq!(ea.history()[0].point.hamming(&elites[1]), 1);
    }

    #[test]
    fn invalid_elite_is_rejected() {
        let eval = branin_evaluator(0.0, 0);
        let mut ea = bandit(eval.search_space(), LandscapeConfig::default(), 4);
        assert!(matches!(
            ea.set_elites(vec![Point::new(vec![0, 5])]),
            Err(NtError::Point(_))
        ));
    }

    #[test]
    fn reset_isolates_runs() {
        let mut eval = branin_evaluator(0.0, 0);
        let mut ea = bandit(eval.search_space(), LandscapeConfig::default(), 4);
        ea.run_trial(&mut eval, 20).unwrap();
        let probe = ea.history()[0].point.clone();
        assert!(ea.landscape().accumulator(&[0], &probe).is_some());

        ea.reset();
        assert!(ea.landscape().accumulator(&[0], &probe).is_none());
        assert!(ea.history().is_empty());
        assert!(ea.current().is_none());
        assert_eq!(ea.best_sampled(), None);
    }

    #[test]
    fn begin_repeat_reproduces_a_fresh_walk() {
        let mut eval = branin_evaluator(0.0, 0);
        let mut ea = bandit(eval.search_space(), LandscapeConfig::default(), 100);
        ea.begin_repeat(0, 100);
        ea.run_trial(&mut eval, 30).unwrap();
        let first = visited(&ea);

        ea.run_trial(&mut eval, 10).unwrap();
        ea.begin_repeat(0, 100);
        ea.run_trial(&mut eval, 30).unwrap();
        assert_eq!(visited(&ea), first);
    }

    #[test]
    fn small_neighbourhood_samples_distinct_mutations() {
        let space: Arc<dyn SearchSpace> = Arc::new(
            ParameterSpace::new()
                .add_int_range("a", 0, 9, 1)
                .add_int_range("b", 0, 9, 1),
        );
        let landscape = NTupleLandscape::new(space, LandscapeConfig::default()).unwrap();
        let mut ea = NTupleBanditEa::new(
            landscape,
            BanditConfig {
                neighbourhood_size: 5,
                seed: 3,
            },
        )
        .unwrap();
        let current = Point::new(vec![4, 4]);
        let hood = ea.neighbourhood(&current);
        assert_eq!(hood.len(), 5);
        let mut distinct = hood.clone();
        distinct.sort();
        distinct.dedup();
        assert_eq!(distinct.len(), 5);
        assert!(hood.iter().all(|p| p.hamming(&current) == 1));
    }

    #[test]
    fn full_neighbourhood_is_dimension_major() {
        let space: Arc<dyn SearchSpace> = Arc::new(
            ParameterSpace::new()
                .add_int_range("a", 0, 2, 1)
                .add_int_range("b", 0, 1, 1),
        );
        let mut ea = bandit(space, LandscapeConfig::default(), 0);
        let hood = ea.neighbourhood(&Point::new(vec![1, 0]));
        assert_eq!(
            hood,
            vec![
                Point::new(vec![0, 0]),
                Point::new(vec![2, 0]),
                Point::new(vec![1, 1]),
            ]
        );
    }

    #[test]
    fn single_point_space_re_evaluates_current() {
        let space: Arc<dyn SearchSpace> =
            Arc::new(ParameterSpace::new().add_choice("only", ["x"]));
        let mut eval = FnEvaluator::new(space.clone(), |_: &[ParameterValue]| Ok(0.5));
        let mut ea = bandit(space, LandscapeConfig::default(), 0);
        ea.run_trial(&mut eval, 3).unwrap();
        assert!(visited(&ea).iter().all(|p| p == &Point::new(vec![0])));
        assert_eq!(eval.n_evals(), 3);
    }

    #[test]
    fn rejects_zero_iterations_and_mismatched_spaces() {
        let mut eval = branin_evaluator(0.0, 0);
        let mut ea = bandit(eval.search_space(), LandscapeConfig::default(), 0);
        assert!(matches!(ea.run_trial(&mut eval, 0), Err(NtError::Config(_))));

        let other = Arc::new(FunctionSpace::new("hartmann3", None, 5).unwrap());
        let mut wrong = FunctionEvaluator::new(other, 0.0, 0).unwrap();
        assert!(matches!(
            ea.run_trial(&mut wrong, 5),
            Err(NtError::Point(PointError::DimensionMismatch { expected: 2, actual: 3 }))
        ));
        assert_eq!(wrong.n_evals(), 0);
    }

    #[test]
    fn evaluator_errors_propagate_unchanged() {
        let space: Arc<dyn SearchSpace> =
            Arc::new(ParameterSpace::new().add_int_range("a", 0, 3, 1));
        let mut calls = 0;
        let mut eval = FnEvaluator::new(space.clone(), move |_: &[ParameterValue]| {
            calls += 1;
            if calls == 3 {
                Err(NtError::Evaluation("game crashed".into()))
            } else {
                Ok(0.0)
            }
        });
        let mut ea = bandit(space, LandscapeConfig::default(), 0);
        match ea.run_trial(&mut eval, 10) {
            Err(NtError::Evaluation(msg)) => assert_eq!(msg, "game crashed"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(ea.history().len(), 2);
        let last_good = ea.history()[1].point.clone();
        assert_eq!(ea.current(), Some(&last_good));

        ea.run_trial(&mut eval, 2).unwrap();
        assert_eq!(ea.history().len(), 4);
        assert_eq!(ea.history()[2].point.hamming(&last_good), 1);
    }

    #[test]
    fn zero_neighbourhood_is_a_config_error() {
        let landscape =
            NTupleLandscape::new(branin_evaluator(0.0, 0).search_space(), LandscapeConfig::default())
                .unwrap();
        assert!(NTupleBanditEa::new(
            landscape,
            BanditConfig {
                neighbourhood_size: 0,
                seed: 0
            }
        )
        .is_err());
    }
}
