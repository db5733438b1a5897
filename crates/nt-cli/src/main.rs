//! `ntbea`: run the N-Tuple Bandit EA against one of the benchmark
//! functions described by a JSON config file, then print the report.

use anyhow::Context;
use clap::Parser;
use nt_optimizer::{
    functions, FunctionEvaluator, FunctionSpace, Ntbea, NtbeaConfig, NtbeaReport, SearchSpace,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ntbea")]
#[command(about = "Tune a discretised benchmark function with NTBEA")]
struct Cli {
    /// JSON run configuration
    config: PathBuf,
    /// Print the full report instead of the winning settings
    #[arg(long)]
    report: bool,
}

fn default_discretisation() -> usize {
    10
}

/// Driver settings plus the function to search over.
#[derive(Debug, Deserialize)]
struct RunFile {
    function: String,
    #[serde(default = "default_discretisation")]
    discretisation: usize,
    #[serde(default)]
    noise: f64,
    #[serde(default)]
    dims: Option<usize>,
    #[serde(flatten)]
    ntbea: NtbeaConfig,
}

impl RunFile {
    fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let run: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        run.ntbea.validate()?;
        Ok(run)
    }
}

fn execute(run: &RunFile) -> anyhow::Result<NtbeaReport> {
    let space = Arc::new(
        FunctionSpace::new(&run.function, run.dims, run.discretisation).with_context(|| {
            format!("known functions: {}", functions::names().join(", "))
        })?,
    );
    info!(
        "Searching {} over {} dimensions with {} values each",
        space.function().name,
        space.n_dims(),
        run.discretisation
    );

    let ntbea = Ntbea::new(space.clone(), run.ntbea.clone())?;
    let outcome = if run.ntbea.parallel {
        ntbea.run_parallel(|_| FunctionEvaluator::new(space.clone(), run.noise, run.ntbea.seed))?
    } else {
        let mut evaluator = FunctionEvaluator::new(space.clone(), run.noise, run.ntbea.seed)?;
        ntbea.run(&mut evaluator)?
    };

    let report = NtbeaReport::new(&outcome, space.as_ref(), &run.ntbea)?;
    let truth = FunctionEvaluator::new(space.clone(), 0.0, 0)?.true_value(&report.winner);
    info!(
        "Winner {} at {:?} scores {:.4} noise-free",
        report.winner,
        space.coordinates(&report.winner),
        truth
    );
    Ok(report)
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let run = RunFile::load(&cli.config)?;
    let report = execute(&run)?;

    if cli.report {
        println!("{}", report.to_json()?);
    } else {
        println!("{}", serde_json::to_string_pretty(&report.parameters)?);
    }
    Ok(())
}
