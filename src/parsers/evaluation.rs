//! Evaluation output (`Evaluate.OUT`) parser
//!
//! The evaluation file pairs measured and simulated end-of-season values:
//!
//! ```text
//! @RUN EXCODE       TRNO RN CR   ADATS  ADATM   HWAMS   HWAMM
//!    1 UFGA8201MZ      1  0 MZ   82171  82170    7895    8200
//! ```
//!
//! Columns ending in `S` are simulated, columns ending in `M` measured. Each
//! data row becomes one [`EvaluationRecord`] holding a combined value per
//! variable base name.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use tokio::task;
use tracing::{debug, info, warn};

use super::fields::{
    header_columns, is_blank, is_comment_line, is_header_line, is_metadata_line, is_title_line,
    tokens,
};
use crate::collaborators::{CodeDictionary, CodeEntry};
use crate::constants::{
    DAP_COLUMN, DAS_COLUMN, DATE_COLUMN, DOY_COLUMN, EXCODE_COLUMN, TRNO_COLUMN, YEAR_COLUMN,
};
use crate::models::Reading;

/// Time and identity columns retained from an evaluation header
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum KeyColumn {
    #[serde(rename = "DATE")]
    Date,
    #[serde(rename = "DAP")]
    DaysAfterPlanting,
    #[serde(rename = "DAS")]
    DaysAfterStart,
    #[serde(rename = "YEAR")]
    Year,
    #[serde(rename = "DOY")]
    DayOfYear,
    #[serde(rename = "TRNO")]
    TreatmentNumber,
    #[serde(rename = "EXCODE")]
    ExperimentCode,
}

impl KeyColumn {
    const ALL: [KeyColumn; 7] = [
        KeyColumn::Date,
        KeyColumn::DaysAfterPlanting,
        KeyColumn::DaysAfterStart,
        KeyColumn::Year,
        KeyColumn::DayOfYear,
        KeyColumn::TreatmentNumber,
        KeyColumn::ExperimentCode,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            KeyColumn::Date => DATE_COLUMN,
            KeyColumn::DaysAfterPlanting => DAP_COLUMN,
            KeyColumn::DaysAfterStart => DAS_COLUMN,
            KeyColumn::Year => YEAR_COLUMN,
            KeyColumn::DayOfYear => DOY_COLUMN,
            KeyColumn::TreatmentNumber => TRNO_COLUMN,
            KeyColumn::ExperimentCode => EXCODE_COLUMN,
        }
    }

    pub fn from_header(header: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|key| key.name().eq_ignore_ascii_case(header))
    }

    /// Key columns that describe the time axis rather than identity
    pub fn is_time(&self) -> bool {
        !matches!(self, KeyColumn::TreatmentNumber | KeyColumn::ExperimentCode)
    }
}

/// Role of a retained evaluation column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRole {
    Measured(String),
    Simulated(String),
    Key(KeyColumn),
}

impl ColumnRole {
    /// Classify a header token; `None` means the column is dropped
    pub fn classify(header: &str) -> Option<Self> {
        if let Some(key) = KeyColumn::from_header(header) {
            return Some(ColumnRole::Key(key));
        }
        if header.len() < 2 {
            return None;
        }

        if let Some(base) = header.strip_suffix('M') {
            Some(ColumnRole::Measured(base.to_string()))
        } else {
            header
                .strip_suffix('S')
                .map(|base| ColumnRole::Simulated(base.to_string()))
        }
    }
}

/// Marker serialized as `"type": "combined"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ValueKind {
    #[default]
    #[serde(rename = "combined")]
    Combined,
}

/// Measured and simulated value of one variable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedValue {
    pub cde: String,
    pub label: String,
    pub description: String,
    pub simulated: Reading,
    /// Measured value, or the simulated one when nothing was measured
    pub measured: Reading,
    /// Measured column as read, without the simulated fallback
    #[serde(skip)]
    pub observed: Reading,
    #[serde(rename = "type")]
    pub kind: ValueKind,
}

/// One evaluation row
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRecord {
    pub keys: BTreeMap<KeyColumn, String>,
    pub variables: BTreeMap<String, CombinedValue>,
}

impl EvaluationRecord {
    pub fn treatment_number(&self) -> Option<&str> {
        self.keys
            .get(&KeyColumn::TreatmentNumber)
            .map(String::as_str)
    }

    pub fn experiment(&self) -> Option<&str> {
        self.keys.get(&KeyColumn::ExperimentCode).map(String::as_str)
    }
}

/// Parsed evaluation file
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationOutput {
    pub records: Vec<EvaluationRecord>,
    /// First retained time column of the header, `TRNO` when there is none
    pub time_field: Option<KeyColumn>,
}

/// Parser for evaluation output files
#[derive(Debug, Clone)]
pub struct EvaluationOutputParser {
    codes: Arc<dyn CodeDictionary>,
}

impl EvaluationOutputParser {
    pub fn new(codes: Arc<dyn CodeDictionary>) -> Self {
        Self { codes }
    }

    /// Read and parse an evaluation file; an unreadable file yields an empty result
    pub async fn parse_file(&self, path: &Path) -> EvaluationOutput {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                let labels = self.load_labels().await;
                let output = Self::parse_with_labels(&content, &labels);
                info!(
                    "Parsed {} evaluation records from {}",
                    output.records.len(),
                    path.display()
                );
                output
            }
            Err(e) => {
                warn!("Could not read evaluation file {}: {}", path.display(), e);
                EvaluationOutput::default()
            }
        }
    }

    /// Label index from the code dictionary, loaded off the async workers
    async fn load_labels(&self) -> HashMap<String, CodeEntry> {
        let codes = Arc::clone(&self.codes);
        match task::spawn_blocking(move || codes.index()).await {
            Ok(labels) => labels,
            Err(e) => {
                warn!("Code dictionary lookup failed, using raw codes: {}", e);
                HashMap::new()
            }
        }
    }

    /// Parse evaluation text, loading labels on the calling thread
    pub fn parse_str(&self, content: &str) -> EvaluationOutput {
        Self::parse_with_labels(content, &self.codes.index())
    }

    /// Parse evaluation text against an already loaded label index
    pub fn parse_with_labels(
        content: &str,
        labels: &HashMap<String, CodeEntry>,
    ) -> EvaluationOutput {
        let state = content
            .lines()
            .fold(EvaluationState::new(labels), EvaluationState::consume);

        EvaluationOutput {
            records: state.records,
            time_field: state.time_field,
        }
    }
}

/// Parser state threaded through the fold over lines
struct EvaluationState<'a> {
    labels: &'a HashMap<String, CodeEntry>,
    /// Roles aligned with the original, unfiltered header positions
    columns: Vec<Option<ColumnRole>>,
    time_field: Option<KeyColumn>,
    records: Vec<EvaluationRecord>,
}

impl<'a> EvaluationState<'a> {
    fn new(labels: &'a HashMap<String, CodeEntry>) -> Self {
        Self {
            labels,
            columns: Vec::new(),
            time_field: None,
            records: Vec::new(),
        }
    }

    fn consume(mut self, line: &str) -> Self {
        self.step(line);
        self
    }

    fn step(&mut self, line: &str) {
        if is_blank(line) || is_title_line(line) || is_comment_line(line) {
            return;
        }

        if is_header_line(line) {
            self.set_header(&header_columns(line));
            return;
        }

        if is_metadata_line(line) {
            return;
        }

        if self.columns.iter().all(Option::is_none) {
            debug!("Evaluation row without usable header skipped");
            return;
        }

        let values = tokens(line);
        if !values.is_empty() {
            let record = self.build_record(&values);
            self.records.push(record);
        }
    }

    fn set_header(&mut self, headers: &[String]) {
        self.columns = headers.iter().map(|h| ColumnRole::classify(h)).collect();
        self.time_field = self
            .columns
            .iter()
            .flatten()
            .find_map(|role| match role {
                ColumnRole::Key(key) if key.is_time() || *key == KeyColumn::TreatmentNumber => {
                    Some(*key)
                }
                _ => None,
            })
            .or(Some(KeyColumn::TreatmentNumber));
    }

    fn build_record(&self, values: &[&str]) -> EvaluationRecord {
        let mut record = EvaluationRecord::default();
        let mut groups: BTreeMap<String, (Option<Reading>, Option<Reading>)> = BTreeMap::new();

        if values.len() < self.columns.len() {
            debug!(
                "Short evaluation row: {} values for {} columns",
                values.len(),
                self.columns.len()
            );
        }

        for (index, role) in self.columns.iter().enumerate() {
            let Some(role) = role else {
                continue;
            };
            let token = values.get(index).copied();

            match role {
                ColumnRole::Key(key) => {
                    if let Some(token) = token {
                        record.keys.insert(*key, token.to_string());
                    }
                }
                ColumnRole::Simulated(base) => {
                    let reading = token.map(Reading::parse).unwrap_or_default();
                    groups.entry(base.clone()).or_default().0 = Some(reading);
                }
                ColumnRole::Measured(base) => {
                    let reading = token.map(Reading::parse).unwrap_or_default();
                    groups.entry(base.clone()).or_default().1 = Some(reading);
                }
            }
        }

        for (base, (simulated, measured)) in groups {
            let simulated = simulated.unwrap_or_default();
            let observed = measured.unwrap_or_default();
            let entry = self.labels.get(&base.to_uppercase());

            record.variables.insert(
                base.clone(),
                CombinedValue {
                    label: entry.map_or_else(|| base.clone(), |e| e.label.clone()),
                    description: entry.map_or_else(|| base.clone(), |e| e.description.clone()),
                    cde: base,
                    simulated,
                    measured: observed.or(simulated),
                    observed,
                    kind: ValueKind::Combined,
                },
            );
        }

        record
    }
}
