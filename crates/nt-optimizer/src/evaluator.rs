//! The evaluation contract between the optimizer and whatever produces
//! fitness values (a game tournament, a benchmark function, a test stub).

use nt_types::{config_error, evaluation_error, NtResult, ParameterValue, Point};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::fmt;
use std::sync::Arc;

use crate::search::{FunctionSpace, SearchSpace};

/// Produces one noisy fitness sample per call. Higher is better.
pub trait SolutionEvaluator {
    /// Evaluate `point` once. Counts as exactly one evaluation whether or
    /// not it succeeds.
    fn evaluate(&mut self, point: &Point) -> NtResult<f64>;

    /// Zero the evaluation counter.
    fn reset(&mut self);

    fn n_evals(&self) -> usize;

    fn search_space(&self) -> Arc<dyn SearchSpace>;

    /// Restart any internal random stream. Called by the driver at the
    /// start of each repeat so that repeats are reproducible in isolation.
    fn reseed(&mut self, _seed: u64) {}
}

fn check_finite(point: &Point, fitness: f64) -> NtResult<f64> {
    if fitness.is_finite() {
        Ok(fitness)
    } else {
        Err(evaluation_error!("non-finite fitness {} at {}", fitness, point))
    }
}

// ---- Benchmark function evaluator ----

/// Scores points of a [`FunctionSpace`] with its test function, optionally
/// adding Gaussian noise.
#[derive(Debug, Clone)]
pub struct FunctionEvaluator {
    space: Arc<FunctionSpace>,
    noise: Option<Normal<f64>>,
    rng: ChaCha8Rng,
    n_evals: usize,
}

impl FunctionEvaluator {
    /// `noise` is the standard deviation of the added Gaussian noise; zero
    /// disables it.
    pub fn new(space: Arc<FunctionSpace>, noise: f64, seed: u64) -> NtResult<Self> {
        let noise = if noise == 0.0 {
            None
        } else {
            Some(Normal::new(0.0, noise).map_err(|e| config_error!("noise {}: {}", noise, e))?)
        };
        Ok(Self {
            space,
            noise,
            rng: ChaCha8Rng::seed_from_u64(seed),
            n_evals: 0,
        })
    }

    /// Noise-free value of `point`.
    pub fn true_value(&self, point: &Point) -> f64 {
        self.space.function().evaluate(&self.space.coordinates(point))
    }

    pub fn function_space(&self) -> &Arc<FunctionSpace> {
        &self.space
    }
}

impl SolutionEvaluator for FunctionEvaluator {
    fn evaluate(&mut self, point: &Point) -> NtResult<f64> {
        self.n_evals += 1;
        self.space.check_point(point)?;
        let mut fitness = self.true_value(point);
        if let Some(noise) = &self.noise {
            fitness += noise.sample(&mut self.rng);
        }
        check_finite(point, fitness)
    }

    fn reset(&mut self) {
        self.n_evals = 0;
    }

    fn n_evals(&self) -> usize {
        self.n_evals
    }

    fn search_space(&self) -> Arc<dyn SearchSpace> {
        self.space.clone()
    }

    fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }
}

// ---- Closure evaluator ----

/// Adapts a closure over a point's decoded values.
pub struct FnEvaluator<F> {
    space: Arc<dyn SearchSpace>,
    f: F,
    n_evals: usize,
}

impl<F> FnEvaluator<F>
where
    F: FnMut(&[ParameterValue]) -> NtResult<f64>,
{
    pub fn new(space: Arc<dyn SearchSpace>, f: F) -> Self {
        Self {
            space,
            f,
            n_evals: 0,
        }
    }
}

impl<F> fmt::Debug for FnEvaluator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnEvaluator")
            .field("space", &self.space)
            .field("n_evals", &self.n_evals)
            .finish()
    }
}

impl<F> SolutionEvaluator for FnEvaluator<F>
where
    F: FnMut(&[ParameterValue]) -> NtResult<f64>,
{
    fn evaluate(&mut self, point: &Point) -> NtResult<f64> {
        self.n_evals += 1;
        self.space.check_point(point)?;
        let values = self.space.values(point);
        let fitness = (self.f)(&values)?;
        check_finite(point, fitness)
    }

    fn reset(&mut self) {
        self.n_evals = 0;
    }

    fn n_evals(&self) -> usize {
        self.n_evals
    }

    fn search_space(&self) -> Arc<dyn SearchSpace> {
        self.space.clone()
    }
}
