//! One-step deviations: a statistical polish of a finished search.
//!
//! Starting from a base point, every single-coordinate change is played in
//! rounds. Changes that are clearly worse than the round's leader are
//! dropped, changes that clearly beat the base are combined with each other
//! when they touch different dimensions, and at the end the candidate with
//! the best lower confidence bound over the base is returned (or the base
//! itself if nothing is significantly better).

use nt_stats::{mean_diff_std_err, standard_z_score, NumericSnapshot, NumericSummary};
use nt_types::{config_error, NtResult, Point};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::evaluator::SolutionEvaluator;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OsdConfig {
    /// Evaluations of every surviving candidate per round.
    pub games_per_round: usize,
    pub rounds: usize,
    /// Stop early once this few candidates (base included) survive.
    pub min_survivors: usize,
    /// Significance for discarding a candidate as worse than the leader.
    pub prune_alpha: f64,
    /// Significance for recording a candidate as better than the base.
    pub improve_alpha: f64,
    /// Significance for the final choice.
    pub select_alpha: f64,
}

impl Default for OsdConfig {
    fn default() -> Self {
        Self {
            games_per_round: 50,
            rounds: 3,
            min_survivors: 2,
            prune_alpha: 0.01,
            improve_alpha: 0.10,
            select_alpha: 0.05,
        }
    }
}

impl OsdConfig {
    pub fn validate(&self) -> NtResult<()> {
        if self.games_per_round == 0 {
            return Err(config_error!("osd games_per_round must be at least 1"));
        }
        if self.rounds == 0 {
            return Err(config_error!("osd rounds must be at least 1"));
        }
        for (name, alpha) in [
            ("prune_alpha", self.prune_alpha),
            ("improve_alpha", self.improve_alpha),
            ("select_alpha", self.select_alpha),
        ] {
            if !(alpha > 0.0 && alpha < 1.0) {
                return Err(config_error!("osd {} must be in (0, 1), got {}", name, alpha));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsdCandidate {
    pub point: Point,
    pub stats: NumericSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsdResult {
    pub base: Point,
    pub selected: Point,
    /// Whether `selected` is significantly better than `base`.
    pub improved: bool,
    pub rounds: usize,
    pub base_score: f64,
    pub selected_score: f64,
    pub selected_std_err: f64,
    /// Candidates still alive at the end, base first.
    pub survivors: Vec<OsdCandidate>,
}

struct Candidate {
    point: Point,
    stats: NumericSummary,
}

#[derive(Debug, Clone)]
pub struct OneStepDeviations {
    config: OsdConfig,
}

impl OneStepDeviations {
    pub fn new(config: OsdConfig) -> NtResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn run<E>(&self, evaluator: &mut E, base: &Point) -> NtResult<OsdResult>
    where
        E: SolutionEvaluator + ?Sized,
    {
        let space = evaluator.search_space();
        space.check_point(base)?;

        let mut candidates = vec![Candidate {
            point: base.clone(),
            stats: NumericSummary::new(),
        }];
        for dim in 0..space.n_dims() {
            for value in 0..space.n_values(dim) {
                if value != base.get(dim) {
                    candidates.push(Candidate {
                        point: base.with(dim, value),
                        stats: NumericSummary::new(),
                    });
                }
            }
        }
        let mut seen: HashSet<Point> = candidates.iter().map(|c| c.point.clone()).collect();
        let mut alive: Vec<usize> = (0..candidates.len()).collect();
        let mut improved: Vec<usize> = Vec::new();
        let mut rounds = 0;

        loop {
            rounds += 1;
            info!("OSD round {} with {} candidates", rounds, alive.len());
            for &i in &alive {
                for _ in 0..self.config.games_per_round {
                    let fitness = evaluator.evaluate(&candidates[i].point)?;
                    candidates[i].stats.add(fitness);
                }
            }

            let leader = best_mean(&candidates, &alive);
            let leader_mean = candidates[leader].stats.mean();
            let base_mean = candidates[0].stats.mean();
            let comparisons = alive.len().saturating_sub(1);
            let prune_z = standard_z_score(self.config.prune_alpha, comparisons);
            let better_z = standard_z_score(self.config.improve_alpha, comparisons);
            debug!(
                "Leader {} at {:.3}, base at {:.3}",
                candidates[leader].point, leader_mean, base_mean
            );

            let mut next = Vec::with_capacity(alive.len());
            for &i in &alive {
                if i == 0 {
                    next.push(i);
                    continue;
                }
                let c = &candidates[i];
                let to_leader = mean_diff_std_err(&candidates[leader].stats, &c.stats);
                if c.stats.mean() < leader_mean - prune_z * to_leader {
                    debug!(
                        "Discarding {} at {:.3} ({:.3} +/- {:.3} behind leader)",
                        c.point,
                        c.stats.mean(),
                        leader_mean - c.stats.mean(),
                        to_leader
                    );
                    continue;
                }
                next.push(i);
                if !improved.contains(&i) {
                    let to_base = mean_diff_std_err(&candidates[0].stats, &c.stats);
                    if c.stats.mean() > base_mean + better_z * to_base {
                        info!(
                            "{} beats the base by {:.3} +/- {:.3}",
                            c.point,
                            c.stats.mean() - base_mean,
                            to_base
                        );
                        improved.push(i);
                    }
                }
            }

            // Combine pairs of improving deviations that change disjoint dimensions.
            for a in 0..improved.len() {
                for b in a + 1..improved.len() {
                    let Some(combined) = combine(
                        base,
                        &candidates[improved[a]].point,
                        &candidates[improved[b]].point,
                    ) else {
                        continue;
                    };
                    if seen.insert(combined.clone()) {
                        info!("Adding combined candidate {}", combined);
                        candidates.push(Candidate {
                            point: combined,
                            stats: NumericSummary::new(),
                        });
                        next.push(candidates.len() - 1);
                    }
                }
            }

            alive = next;
            if rounds >= self.config.rounds || alive.len() <= self.config.min_survivors {
                break;
            }
        }

        let base_mean = candidates[0].stats.mean();
        let z = standard_z_score(self.config.select_alpha, alive.len().saturating_sub(1));
        let mut best_lower = base_mean;
        let mut selected = 0;
        for &i in alive.iter().filter(|&&i| i != 0) {
            let c = &candidates[i];
            if c.stats.is_empty() {
                continue;
            }
            let se = mean_diff_std_err(&candidates[0].stats, &c.stats);
            let score = c.stats.mean();
            if score > base_mean + z * se && score - z * se > best_lower {
                best_lower = score - z * se;
                selected = i;
            }
        }

        if selected == 0 {
            info!("No significant improvement over {}", base);
        } else {
            info!(
                "Selected {} with score {:.3} (base {:.3})",
                candidates[selected].point,
                candidates[selected].stats.mean(),
                base_mean
            );
        }

        Ok(OsdResult {
            base: base.clone(),
            selected: candidates[selected].point.clone(),
            improved: selected != 0,
            rounds,
            base_score: base_mean,
            selected_score: candidates[selected].stats.mean(),
            selected_std_err: candidates[selected].stats.std_err(),
            survivors: alive
                .iter()
                .map(|&i| OsdCandidate {
                    point: candidates[i].point.clone(),
                    stats: candidates[i].stats.snapshot(),
                })
                .collect(),
        })
    }
}

/// Index of the highest mean among evaluated candidates; earliest wins ties.
fn best_mean(candidates: &[Candidate], alive: &[usize]) -> usize {
    let mut best = alive[0];
    let mut best_mean = f64::NEG_INFINITY;
    for &i in alive {
        let stats = &candidates[i].stats;
        if !stats.is_empty() && stats.mean() > best_mean {
            best_mean = stats.mean();
            best = i;
        }
    }
    best
}

/// Base with the changes of both `a` and `b`, if they change different dimensions.
fn combine(base: &Point, a: &Point, b: &Point) -> Option<Point> {
    let mut combined = a.clone();
    for dim in 0..base.dims() {
        let changed_a = a.get(dim) != base.get(dim);
        let changed_b = b.get(dim) != base.get(dim);
        if changed_a && changed_b {
            return None;
        }
        if changed_b {
            combined = combined.with(dim, b.get(dim));
        }
    }
    Some(combined)
}
