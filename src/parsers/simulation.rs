//! Simulation output (`*.OUT`) parser
//!
//! A simulation output repeats one block per treatment:
//!
//! ```text
//! *GROWTH ASPECTS OUTPUT FILE
//!  EXPERIMENT     : UFGA8201 MZ NITROGEN X IRRIGATION
//!  TREATMENT  1   : RAINFED LOW NITROGEN       MZCER048
//! @YEAR DOY   DAS   DAP   LAID   CWAD
//!  1982 057     0     0   0.00      0
//!  1982 058     1     1   0.00      0
//! ```
//!
//! Lines are folded through a [`SimulationState`] that tracks the current
//! header list and the run receiving data rows.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use super::fields::{
    column_index, header_columns, is_blank, is_header_line, is_metadata_line, is_title_line,
    tokens,
};
use crate::constants::{
    AXIS_COLUMNS, DOY_COLUMN, EXPERIMENT_CODE_OFFSET, EXPERIMENT_KEYWORD, TREATMENT_KEYWORD,
    YEAR_COLUMN,
};
use crate::date_codec::year_doy_from_tokens;
use crate::error::{Result, SimObsError};
use crate::models::{AxisPoint, Reading, VariableSeries};

/// Simulated series of one treatment
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRun {
    /// Treatment description from the TREATMENT line
    pub run: String,
    pub experiment: String,
    pub treatment_number: String,
    pub series: BTreeMap<String, VariableSeries>,
}

impl SimulationRun {
    fn new(run: String, experiment: String, treatment_number: String) -> Self {
        Self {
            run,
            experiment,
            treatment_number,
            series: BTreeMap::new(),
        }
    }
}

/// Parser for simulation output files
#[derive(Debug, Default, Clone)]
pub struct SimulationOutputParser;

impl SimulationOutputParser {
    pub fn new() -> Self {
        Self
    }

    /// Read and parse a simulation output file
    pub async fn parse_file(&self, path: &Path) -> Result<Vec<SimulationRun>> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SimObsError::unreadable(path, e))?;

        let runs = self.parse_str(&content);
        info!(
            "Parsed {} simulated runs from {}",
            runs.len(),
            path.display()
        );
        Ok(runs)
    }

    /// Parse simulation output text
    pub fn parse_str(&self, content: &str) -> Vec<SimulationRun> {
        content
            .lines()
            .fold(SimulationState::default(), SimulationState::consume)
            .finish()
    }
}

/// Accumulating run plus the number of data rows it has received
#[derive(Debug)]
struct RunAccumulator {
    run: SimulationRun,
    rows: usize,
}

/// Parser state threaded through the fold over lines
#[derive(Debug, Default)]
struct SimulationState {
    experiment: String,
    headers: Vec<String>,
    year_column: Option<usize>,
    doy_column: Option<usize>,
    current: Option<usize>,
    runs: Vec<RunAccumulator>,
}

impl SimulationState {
    fn consume(mut self, line: &str) -> Self {
        self.step(line);
        self
    }

    fn step(&mut self, line: &str) {
        if is_blank(line) || is_title_line(line) {
            return;
        }

        let trimmed = line.trim_start();
        if trimmed.starts_with(EXPERIMENT_KEYWORD) {
            self.experiment = parse_experiment_code(line);
            return;
        }

        if trimmed.starts_with(TREATMENT_KEYWORD) {
            self.start_treatment(trimmed);
            return;
        }

        if is_header_line(line) {
            self.set_headers(header_columns(line));
            return;
        }

        if line.starts_with(' ') && !is_metadata_line(line) {
            self.push_row(line);
        }
    }

    fn start_treatment(&mut self, line: &str) {
        let (number_part, description) = line.split_once(':').unwrap_or((line, ""));
        let treatment_number = number_part
            .trim_start_matches(TREATMENT_KEYWORD)
            .trim()
            .to_string();
        let description = description.trim().to_string();

        // Repeated descriptions collapse into the first run that used them
        let existing = self.runs.iter().position(|acc| {
            if description.is_empty() {
                acc.run.run.is_empty() && acc.run.treatment_number == treatment_number
            } else {
                acc.run.run == description
            }
        });

        match existing {
            Some(index) => {
                debug!(
                    "Treatment {} reuses description '{}', appending to first run",
                    treatment_number, description
                );
                self.current = Some(index);
            }
            None => {
                self.runs.push(RunAccumulator {
                    run: SimulationRun::new(
                        description,
                        self.experiment.clone(),
                        treatment_number,
                    ),
                    rows: 0,
                });
                self.current = Some(self.runs.len() - 1);
            }
        }
    }

    fn set_headers(&mut self, headers: Vec<String>) {
        self.year_column = column_index(&headers, YEAR_COLUMN);
        self.doy_column = column_index(&headers, DOY_COLUMN);
        self.headers = headers;
    }

    fn push_row(&mut self, line: &str) {
        let Some(current) = self.current else {
            debug!("Data row before any TREATMENT line skipped: {}", line.trim());
            return;
        };
        if self.headers.is_empty() {
            debug!("Data row before any header line skipped: {}", line.trim());
            return;
        }

        let values = tokens(line);
        if values.len() < self.headers.len() {
            debug!(
                "Short data row: {} values for {} columns",
                values.len(),
                self.headers.len()
            );
        }

        let accumulator = &mut self.runs[current];
        let date = match (self.year_column, self.doy_column) {
            (Some(year), Some(doy)) => match (values.get(year), values.get(doy)) {
                (Some(year), Some(doy)) => year_doy_from_tokens(year, doy),
                _ => None,
            },
            _ => None,
        };
        let axis = date
            .map(AxisPoint::Date)
            .unwrap_or(AxisPoint::Position(accumulator.rows));

        for (header, token) in self.headers.iter().zip(values.iter()) {
            if AXIS_COLUMNS.contains(&header.as_str()) {
                continue;
            }
            accumulator
                .run
                .series
                .entry(header.clone())
                .or_default()
                .push(axis, Reading::parse(token));
        }
        accumulator.rows += 1;
    }

    fn finish(self) -> Vec<SimulationRun> {
        self.runs.into_iter().map(|acc| acc.run).collect()
    }
}

/// Experiment code from an EXPERIMENT line.
///
/// The code is the first token after the label, which in the standard layout
/// starts at [`EXPERIMENT_CODE_OFFSET`] right after the `:` separator.
fn parse_experiment_code(line: &str) -> String {
    let rest = match line.split_once(':') {
        Some((_, rest)) => rest,
        None => line.get(EXPERIMENT_CODE_OFFSET..).unwrap_or_default(),
    };
    rest.split_whitespace().next().unwrap_or_default().to_string()
}
