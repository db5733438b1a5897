//! Final reports: a serde record of the search plus the two files written
//! at the end of a run (flat settings JSON and a tab-separated log line).

use chrono::{DateTime, Utc};
use nt_types::{NtResult, ParameterValue, Point};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use uuid::Uuid;

use crate::config::NtbeaConfig;
use crate::driver::NtbeaOutcome;
use crate::search::SearchSpace;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub repeat: usize,
    pub seed: u64,
    pub winner: Point,
    pub estimate: f64,
    pub std_err: f64,
    pub model_estimate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NtbeaReport {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub estimated_value: f64,
    pub std_err: f64,
    pub winner: Point,
    /// Searched dimension names in order.
    pub names: Vec<String>,
    /// Display form of the winner's value in each searched dimension.
    pub values: Vec<String>,
    /// Name to value for the winner, fixed settings included.
    pub parameters: Map<String, Value>,
    pub settings: NtbeaConfig,
    pub runs: Vec<RunSummary>,
}

impl NtbeaReport {
    pub fn new(
        outcome: &NtbeaOutcome,
        space: &dyn SearchSpace,
        config: &NtbeaConfig,
    ) -> NtResult<Self> {
        let winner = outcome.best_point().clone();
        space.check_point(&winner)?;

        let (estimated_value, std_err) = match &outcome.osd {
            Some(osd) if osd.improved => (osd.selected_score, osd.selected_std_err),
            _ => (outcome.best_run().estimate, outcome.best_run().std_err),
        };

        Ok(Self {
            run_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            estimated_value,
            std_err,
            names: (0..space.n_dims()).map(|d| space.name(d).to_string()).collect(),
            values: space
                .values(&winner)
                .iter()
                .map(ParameterValue::to_string)
                .collect(),
            parameters: space.decode(&winner),
            winner,
            settings: config.clone(),
            runs: outcome
                .runs
                .iter()
                .map(|r| RunSummary {
                    repeat: r.repeat,
                    seed: r.seed,
                    winner: r.winner.clone(),
                    estimate: r.estimate,
                    std_err: r.std_err,
                    model_estimate: r.model_estimate,
                })
                .collect(),
        })
    }

    pub fn to_json(&self) -> NtResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the winner as a flat `{"name": value}` object.
    pub fn write_settings_json(&self, path: impl AsRef<Path>) -> NtResult<()> {
        let text = serde_json::to_string_pretty(&self.parameters)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn log_header(&self) -> String {
        let mut columns = vec!["estimated_value".to_string(), "std_err".to_string()];
        columns.extend(self.names.iter().cloned());
        columns.join("\t")
    }

    pub fn log_line(&self) -> String {
        let mut columns = vec![
            format!("{:.4}", self.estimated_value),
            format!("{:.4}", self.std_err),
        ];
        columns.extend(self.values.iter().cloned());
        columns.join("\t")
    }

    /// Append this result to a tab-separated log, starting a new file with
    /// a header row.
    pub fn append_log(&self, path: impl AsRef<Path>) -> NtResult<()> {
        let path = path.as_ref();
        let is_new = std::fs::metadata(path).map_or(true, |m| m.len() == 0);
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        if is_new {
            writeln!(file, "{}", self.log_header())?;
        }
        writeln!(file, "{}", self.log_line())?;
        Ok(())
    }
}
