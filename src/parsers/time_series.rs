//! Daily observation (T-file) parser
//!
//! ```text
//! *EXP. DATA (T): UFGA8201MZ NITROGEN X IRRIGATION
//! @TRNO DATE  LAID  CWAD
//!     1 82166  0.35   -99
//!     1 82180  1.20   896
//! ```
//!
//! Rows are keyed by treatment number and a packed `YYDDD` date. Sentinel
//! values are dropped and every series is returned in date order.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tokio::task;
use tracing::{debug, info};

use super::fields::{
    column_index, header_columns, is_blank, is_comment_line, is_header_line, is_title_line, tokens,
};
use super::run_label::{LabelContext, run_label};
use crate::collaborators::TreatmentMetadata;
use crate::constants::{DATE_COLUMN, TRNO_COLUMN};
use crate::date_codec::{packed_from_token, year_of_packed_token};
use crate::error::{Result, SimObsError};
use crate::merger::identity::normalize_treatment;
use crate::models::{AxisPoint, Crop, Reading, VariableSeries};

static EXPERIMENT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\*EXP\.?\s*DATA\s*\(T\):\s*(.*)$").expect("valid experiment line pattern")
});

/// Observed daily series of one treatment
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesRun {
    pub run: String,
    pub treatment_number: String,
    /// Experiment descriptor from the file header
    pub experiment: String,
    pub series: BTreeMap<String, VariableSeries>,
}

/// Parser for daily observation files
#[derive(Debug, Clone)]
pub struct TimeSeriesObservationParser {
    metadata: Arc<dyn TreatmentMetadata>,
}

impl TimeSeriesObservationParser {
    pub fn new(metadata: Arc<dyn TreatmentMetadata>) -> Self {
        Self { metadata }
    }

    /// Read and parse a T-file of `crop`, resolving treatment names from its experiment file
    pub async fn parse_file(
        &self,
        base_path: &Path,
        crop: &Crop,
        path: &Path,
    ) -> Result<Vec<TimeSeriesRun>> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SimObsError::unreadable(path, e))?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let names = self.treatment_names(base_path, crop, &file_name).await;

        let runs = self.parse_str(&content, &file_name, &names);
        info!(
            "Parsed {} observed treatments from {}",
            runs.len(),
            path.display()
        );
        Ok(runs)
    }

    /// Parse T-file text; `names` maps normalized treatment numbers to descriptive names
    pub fn parse_str(
        &self,
        content: &str,
        file_name: &str,
        names: &HashMap<String, String>,
    ) -> Vec<TimeSeriesRun> {
        content
            .lines()
            .fold(
                TimeSeriesState::new(file_name, names),
                TimeSeriesState::consume,
            )
            .finish()
    }

    /// Treatment names from the experiment file next to the T-file; empty on any failure
    async fn treatment_names(
        &self,
        base_path: &Path,
        crop: &Crop,
        file_name: &str,
    ) -> HashMap<String, String> {
        let stem = file_name.split('.').next().unwrap_or_default();
        let experiment_file = format!("{}{}", stem, crop.experiment_extension());

        let metadata = Arc::clone(&self.metadata);
        let crop = crop.clone();
        let base_path = base_path.to_path_buf();
        let lookup_file = experiment_file.clone();
        let lookup =
            task::spawn_blocking(move || metadata.treatments(&crop, &base_path, &lookup_file))
                .await;

        match lookup {
            Ok(Ok(treatments)) => treatments
                .into_iter()
                .map(|t| (normalize_treatment(&t.treatment_number), t.descriptive_name))
                .collect(),
            Ok(Err(e)) => {
                debug!(
                    "No treatment names for {}, synthesizing labels: {}",
                    experiment_file, e
                );
                HashMap::new()
            }
            Err(e) => {
                debug!("Treatment name lookup for {} failed: {}", experiment_file, e);
                HashMap::new()
            }
        }
    }
}

/// Parser state threaded through the fold over lines
struct TimeSeriesState<'a> {
    file_name: &'a str,
    names: &'a HashMap<String, String>,
    experiment: String,
    headers: Vec<String>,
    trno_column: Option<usize>,
    date_column: Option<usize>,
    year_from_dates: Option<i32>,
    runs: Vec<TimeSeriesRun>,
    run_index: HashMap<String, usize>,
}

impl<'a> TimeSeriesState<'a> {
    fn new(file_name: &'a str, names: &'a HashMap<String, String>) -> Self {
        Self {
            file_name,
            names,
            experiment: "Unknown".to_string(),
            headers: Vec::new(),
            trno_column: None,
            date_column: None,
            year_from_dates: None,
            runs: Vec::new(),
            run_index: HashMap::new(),
        }
    }

    fn consume(mut self, line: &str) -> Self {
        self.step(line);
        self
    }

    fn step(&mut self, line: &str) {
        let trimmed = line.trim();
        if let Some(captures) = EXPERIMENT_LINE.captures(trimmed) {
            self.experiment = captures
                .get(1)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default();
            return;
        }

        if is_blank(line) || is_title_line(line) || is_comment_line(line) {
            return;
        }

        if is_header_line(line) {
            let headers = header_columns(line);
            self.trno_column = column_index(&headers, TRNO_COLUMN);
            self.date_column = column_index(&headers, DATE_COLUMN);
            self.headers = headers;
            return;
        }

        if !self.headers.is_empty() {
            self.push_row(trimmed);
        }
    }

    fn push_row(&mut self, line: &str) {
        let values = tokens(line);
        let Some(trno) = self.trno_column.and_then(|i| values.get(i)).copied() else {
            debug!("Observation row without treatment number skipped: {}", line);
            return;
        };

        let date_token = self.date_column.and_then(|i| values.get(i)).copied();
        let date = date_token.and_then(packed_from_token);
        if self.year_from_dates.is_none() {
            self.year_from_dates = date_token.and_then(year_of_packed_token);
        }

        let run_index = self.run_for(trno);
        let Some(date) = date else {
            debug!(
                "Observation row of treatment {} has no valid date: {:?}",
                trno, date_token
            );
            return;
        };

        let run = &mut self.runs[run_index];
        for (index, header) in self.headers.iter().enumerate() {
            if Some(index) == self.trno_column || Some(index) == self.date_column {
                continue;
            }
            let Some(token) = values.get(index) else {
                continue;
            };
            if let Reading::Present(value) = Reading::parse(token) {
                run.series
                    .entry(header.clone())
                    .or_default()
                    .push(AxisPoint::Date(date), Reading::Present(value));
            }
        }
    }

    /// Index of the run for `trno`, creating and labelling it on first sight
    fn run_for(&mut self, trno: &str) -> usize {
        if let Some(index) = self.run_index.get(trno) {
            return *index;
        }

        let name = self.names.get(&normalize_treatment(trno)).map(String::as_str);
        let label = run_label(
            trno,
            name,
            LabelContext {
                experiment: &self.experiment,
                file_name: self.file_name,
                year_from_dates: self.year_from_dates,
            },
        );

        self.runs.push(TimeSeriesRun {
            run: label,
            treatment_number: trno.to_string(),
            experiment: self.experiment.clone(),
            series: BTreeMap::new(),
        });
        let index = self.runs.len() - 1;
        self.run_index.insert(trno.to_string(), index);
        index
    }

    fn finish(mut self) -> Vec<TimeSeriesRun> {
        // Source files are not guaranteed to be chronological
        for run in &mut self.runs {
            for series in run.series.values_mut() {
                series.sort_by_date();
            }
        }
        self.runs
    }
}
