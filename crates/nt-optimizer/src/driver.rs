//! Repeats the bandit search, scores each repeat's winner and keeps the best.

use nt_stats::{NumericSummary, StatSummary, TimeSeriesSummary};
use nt_types::{validation_error, NtResult, Point, PointError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::bandit::NTupleBanditEa;
use crate::config::NtbeaConfig;
use crate::evaluator::SolutionEvaluator;
use crate::landscape::NTupleLandscape;
use crate::osd::{OneStepDeviations, OsdConfig, OsdResult};
use crate::report::NtbeaReport;
use crate::search::SearchSpace;

/// Result of one repeat of the search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub repeat: usize,
    pub seed: u64,
    pub winner: Point,
    /// Score used to rank repeats: mean of the fresh evaluations, or the
    /// model estimate when no fresh evaluations were requested.
    pub estimate: f64,
    pub std_err: f64,
    /// Landscape estimate of the winner at the end of the repeat.
    pub model_estimate: f64,
    pub eval_games: usize,
    /// Evaluations used by this repeat, scoring included.
    pub n_evals: usize,
    /// Best-sampled estimate after each iteration.
    pub trace: TimeSeriesSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NtbeaOutcome {
    pub runs: Vec<RunResult>,
    /// Index into `runs` of the highest-scoring repeat.
    pub best: usize,
    /// Per dimension, how often each value was a repeat's winner.
    pub winner_values: Vec<StatSummary>,
    pub osd: Option<OsdResult>,
}

impl NtbeaOutcome {
    pub fn best_run(&self) -> &RunResult {
        &self.runs[self.best]
    }

    /// The recommended point: the OSD choice if that stage ran, otherwise
    /// the best repeat's winner.
    pub fn best_point(&self) -> &Point {
        match &self.osd {
            Some(osd) => &osd.selected,
            None => &self.best_run().winner,
        }
    }
}

/// Top-level NTBEA search.
#[derive(Debug, Clone)]
pub struct Ntbea {
    space: Arc<dyn SearchSpace>,
    config: NtbeaConfig,
    elites: Vec<Point>,
}

impl Ntbea {
    pub fn new(space: Arc<dyn SearchSpace>, config: NtbeaConfig) -> NtResult<Self> {
        config.validate()?;
        // Surfaces space and tuple errors before any evaluation.
        NTupleLandscape::new(space.clone(), config.landscape_config())?;
        Ok(Self {
            space,
            config,
            elites: Vec::new(),
        })
    }

    /// Start repeats from these points instead of random ones.
    pub fn with_elites(mut self, elites: Vec<Point>) -> NtResult<Self> {
        for elite in &elites {
            self.space.check_point(elite)?;
        }
        self.elites = elites;
        Ok(self)
    }

    pub fn config(&self) -> &NtbeaConfig {
        &self.config
    }

    pub fn space(&self) -> &Arc<dyn SearchSpace> {
        &self.space
    }

    fn search_loop(&self) -> NtResult<NTupleBanditEa> {
        let landscape = NTupleLandscape::new(self.space.clone(), self.config.landscape_config())?;
        let mut ea = NTupleBanditEa::new(landscape, self.config.bandit_config())?;
        ea.set_elites(self.elites.clone())?;
        Ok(ea)
    }

    fn check_evaluator<E: SolutionEvaluator + ?Sized>(&self, evaluator: &E) -> NtResult<()> {
        let expected = self.space.n_dims();
        let actual = evaluator.search_space().n_dims();
        if expected != actual {
            return Err(PointError::DimensionMismatch { expected, actual }.into());
        }
        Ok(())
    }

    /// Run every repeat in turn with one evaluator.
    pub fn run<E>(&self, evaluator: &mut E) -> NtResult<NtbeaOutcome>
    where
        E: SolutionEvaluator + ?Sized,
    {
        self.check_evaluator(evaluator)?;
        self.log_start();
        if self.config.parallel {
            warn!("parallel is set but a single evaluator was supplied; running sequentially");
        }

        let mut ea = self.search_loop()?;
        let runs = (0..self.config.repeats)
            .map(|repeat| self.run_repeat(&mut ea, evaluator, repeat))
            .collect::<NtResult<Vec<_>>>()?;

        let osd = match &self.config.osd {
            Some(osd_config) => {
                let winner = best_index(&runs);
                Some(self.polish(evaluator, &runs[winner].winner, osd_config)?)
            }
            None => None,
        };
        self.finish(runs, osd)
    }

    /// Run the repeats concurrently, each with its own search loop and an
    /// evaluator built by `make_evaluator(repeat)`. Gives the same result
    /// as [`Ntbea::run`] for evaluators whose only state is their seed.
    pub fn run_parallel<E, F>(&self, make_evaluator: F) -> NtResult<NtbeaOutcome>
    where
        E: SolutionEvaluator,
        F: Fn(usize) -> NtResult<E> + Sync,
    {
        self.log_start();
        let runs = (0..self.config.repeats)
            .into_par_iter()
            .map(|repeat| {
                let mut evaluator = make_evaluator(repeat)?;
                self.check_evaluator(&evaluator)?;
                let mut ea = self.search_loop()?;
                self.run_repeat(&mut ea, &mut evaluator, repeat)
            })
            .collect::<NtResult<Vec<_>>>()?;

        let osd = match &self.config.osd {
            Some(osd_config) => {
                let winner = best_index(&runs);
                let mut evaluator = make_evaluator(self.config.repeats)?;
                Some(self.polish(&mut evaluator, &runs[winner].winner, osd_config)?)
            }
            None => None,
        };
        self.finish(runs, osd)
    }

    fn log_start(&self) {
        info!(
            "NTBEA: {} repeats of {} iterations over {} dimensions",
            self.config.repeats,
            self.config.iterations_per_run,
            self.space.n_dims()
        );
        debug!("Search space:\n{}", self.space.describe());
    }

    fn run_repeat<E>(
        &self,
        ea: &mut NTupleBanditEa,
        evaluator: &mut E,
        repeat: usize,
    ) -> NtResult<RunResult>
    where
        E: SolutionEvaluator + ?Sized,
    {
        let seed = self.config.repeat_seed(repeat);
        info!(
            "Starting repeat {} of {} (seed {})",
            repeat + 1,
            self.config.repeats,
            seed
        );
        ea.begin_repeat(repeat, seed);
        evaluator.reset();
        evaluator.reseed(seed);

        ea.run_trial(evaluator, self.config.iterations_per_run)?;
        if self.config.verbose {
            ea.log_results();
        }

        let winner = if self.config.rescore_winner {
            ea.best_of_sampled()
        } else {
            ea.best_sampled()
        }
        .ok_or_else(|| validation_error!("repeat {} sampled no points", repeat))?;
        let model_estimate = ea.landscape().mean_estimate(&winner);

        let eval_games = self.config.eval_games();
        let (estimate, std_err) = if eval_games == 0 {
            (model_estimate, 0.0)
        } else {
            let mut scores = NumericSummary::new();
            for _ in 0..eval_games {
                scores.add(evaluator.evaluate(&winner)?);
            }
            (scores.mean(), scores.std_err())
        };

        let mut trace = TimeSeriesSummary::new();
        for (i, step) in ea.history().iter().enumerate() {
            trace.add(i as u64 + 1, step.best_estimate);
        }

        info!(
            "Repeat {} winner {} {:?}: {:.4} +/- {:.4} (model {:.4})",
            repeat + 1,
            winner,
            self.space.decode(&winner),
            estimate,
            std_err,
            model_estimate
        );

        Ok(RunResult {
            repeat,
            seed,
            winner,
            estimate,
            std_err,
            model_estimate,
            eval_games,
            n_evals: evaluator.n_evals(),
            trace,
        })
    }

    fn polish<E>(
        &self,
        evaluator: &mut E,
        winner: &Point,
        osd_config: &OsdConfig,
    ) -> NtResult<OsdResult>
    where
        E: SolutionEvaluator + ?Sized,
    {
        evaluator.reset();
        evaluator.reseed(self.config.repeat_seed(self.config.repeats));
        OneStepDeviations::new(osd_config.clone())?.run(evaluator, winner)
    }

    fn finish(&self, runs: Vec<RunResult>, osd: Option<OsdResult>) -> NtResult<NtbeaOutcome> {
        let best = best_index(&runs);

        let mut winner_values = Vec::with_capacity(self.space.n_dims());
        for dim in 0..self.space.n_dims() {
            let mut counts = StatSummary::occurrence();
            for run in &runs {
                counts.add(self.space.value(dim, run.winner.get(dim)).to_string())?;
            }
            if let Some((value, count)) = counts.as_occurrence().and_then(|o| o.mode()) {
                let share = counts.as_occurrence().map_or(0.0, |o| o.proportion(value));
                info!(
                    "{}: {} won {} of {} repeats ({:.0}%)",
                    self.space.name(dim),
                    value,
                    count,
                    runs.len(),
                    100.0 * share
                );
            }
            winner_values.push(counts);
        }

        let outcome = NtbeaOutcome {
            runs,
            best,
            winner_values,
            osd,
        };
        let best_run = outcome.best_run();
        info!(
            "Best repeat {} of {}: {} {:?} with {:.4} +/- {:.4}",
            best_run.repeat + 1,
            outcome.runs.len(),
            outcome.best_point(),
            self.space.decode(outcome.best_point()),
            best_run.estimate,
            best_run.std_err
        );

        if self.config.settings_file.is_some() || self.config.log_file.is_some() {
            let report = NtbeaReport::new(&outcome, self.space.as_ref(), &self.config)?;
            if let Some(path) = &self.config.settings_file {
                report.write_settings_json(path)?;
                info!("Wrote settings to {}", path.display());
            }
            if let Some(path) = &self.config.log_file {
                report.append_log(path)?;
            }
        }
        Ok(outcome)
    }
}

/// Highest estimate; the earliest repeat wins ties.
fn best_index(runs: &[RunResult]) -> usize {
    let mut best = 0;
    for (i, run) in runs.iter().enumerate() {
        if run.estimate > runs[best].estimate {
            best = i;
        }
    }
    best
}
