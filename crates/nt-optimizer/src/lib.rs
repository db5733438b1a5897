//! # nt-optimizer
//!
//! N-Tuple Bandit Evolutionary Algorithm (NTBEA) for tuning parameters
//! against a noisy, expensive evaluation function.
//!
//! Provides discrete search spaces, the evaluator contract, a registry of
//! benchmark functions, the N-tuple landscape model, the bandit search
//! loop, a multi-repeat driver (sequential or rayon-parallel), one-step
//! deviation refinement and run reports.

mod bandit;
mod config;
mod driver;
mod evaluator;
pub mod functions;
mod landscape;
mod osd;
mod report;
mod search;

pub use bandit::{BanditConfig, NTupleBanditEa, Step};
pub use config::NtbeaConfig;
pub use driver::{Ntbea, NtbeaOutcome, RunResult};
pub use evaluator::{FnEvaluator, FunctionEvaluator, SolutionEvaluator};
pub use functions::TestFunction;
pub use landscape::{
    ExplorationRule, LandscapeConfig, NTupleLandscape, NoInformation, TupleConfig, TupleStatRow,
};
pub use osd::{OneStepDeviations, OsdCandidate, OsdConfig, OsdResult};
pub use report::{NtbeaReport, RunSummary};
pub use search::{Dimension, FunctionSpace, ParameterSpace, SearchSpace};
