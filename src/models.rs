//! Core data structures and types for sim-vs-obs reconciliation.
//!
//! Defines the crop table, the explicit absence type for numeric readings,
//! series with calendar or positional axes, and the unified treatment record.

use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

use crate::constants::MISSING_VALUE;
use crate::error::{Result, SimObsError};

/// Crops supported by the model, with their conventional two-letter codes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Crop {
    Alfalfa,
    Aroid,
    Barley,
    DryBean,
    BroadLeafWeeds,
    Cotton,
    Cassava,
    Fallow,
    GrassWeeds,
    Millet,
    Maize,
    Peanut,
    Potato,
    Rice,
    Soybean,
    SugarCane,
    Sorghum,
    Shrubs,
    Wheat,
    /// Any crop folder without a known code; uses the generic extensions
    Other(String),
}

/// Known crops in folder-name form
const KNOWN_CROPS: &[(&str, Crop)] = &[
    ("Alfalfa", Crop::Alfalfa),
    ("Aroid", Crop::Aroid),
    ("Barley", Crop::Barley),
    ("Dry bean", Crop::DryBean),
    ("Broad leaf weeds", Crop::BroadLeafWeeds),
    ("Cotton", Crop::Cotton),
    ("Cassava", Crop::Cassava),
    ("Fallow", Crop::Fallow),
    ("Grass-weeds", Crop::GrassWeeds),
    ("Millet", Crop::Millet),
    ("Maize", Crop::Maize),
    ("Peanut", Crop::Peanut),
    ("Potato", Crop::Potato),
    ("Rice", Crop::Rice),
    ("Soybean", Crop::Soybean),
    ("Sugar cane", Crop::SugarCane),
    ("Sorghum", Crop::Sorghum),
    ("Shrubs", Crop::Shrubs),
    ("Wheat", Crop::Wheat),
];

impl Crop {
    /// Resolve a crop folder name; unknown names become [`Crop::Other`]
    pub fn from_folder_name(name: &str) -> Self {
        let trimmed = name.trim();
        KNOWN_CROPS
            .iter()
            .find(|(folder, _)| folder.eq_ignore_ascii_case(trimmed))
            .map(|(_, crop)| crop.clone())
            .unwrap_or_else(|| Crop::Other(trimmed.to_string()))
    }

    /// Crop named by a user; rejects names that cannot be a single folder
    pub fn parse(name: &str) -> Result<Self> {
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed.contains(['/', '\\']) || trimmed == ".." {
            return Err(SimObsError::InvalidCrop {
                name: name.to_string(),
            });
        }
        Ok(Self::from_folder_name(trimmed))
    }

    /// Folder name under the model's base directory
    pub fn folder_name(&self) -> &str {
        match self {
            Crop::Other(name) => name,
            known => KNOWN_CROPS
                .iter()
                .find(|(_, crop)| crop == known)
                .map(|(folder, _)| *folder)
                .unwrap_or_default(),
        }
    }

    /// Two-letter crop code, `None` for unknown crops
    pub fn code(&self) -> Option<&'static str> {
        let code = match self {
            Crop::Alfalfa => "AL",
            Crop::Aroid => "AR",
            Crop::Barley => "BA",
            Crop::DryBean => "BN",
            Crop::BroadLeafWeeds => "BW",
            Crop::Cotton => "CO",
            Crop::Cassava => "CS",
            Crop::Fallow => "FA",
            Crop::GrassWeeds => "GW",
            Crop::Millet => "ML",
            Crop::Maize => "MZ",
            Crop::Peanut => "PN",
            Crop::Potato => "PT",
            Crop::Rice => "RI",
            Crop::Soybean => "SB",
            Crop::SugarCane => "SC",
            Crop::Sorghum => "SG",
            Crop::Shrubs => "ST",
            Crop::Wheat => "WH",
            Crop::Other(_) => return None,
        };
        Some(code)
    }

    /// Extension of the daily observation (T) file, e.g. `.mzt`
    pub fn time_series_extension(&self) -> String {
        match self.code() {
            Some(code) => format!(".{}t", code.to_lowercase()),
            None => ".T".to_string(),
        }
    }

    /// Extension of the final-value observation (A) file, e.g. `.mza`
    pub fn summary_extension(&self) -> String {
        match self.code() {
            Some(code) => format!(".{}a", code.to_lowercase()),
            None => ".A".to_string(),
        }
    }

    /// Extension of the experiment (X) file, e.g. `.MZX`
    pub fn experiment_extension(&self) -> String {
        match self.code() {
            Some(code) => format!(".{}X", code),
            None => ".X".to_string(),
        }
    }
}

impl std::fmt::Display for Crop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.folder_name())
    }
}

/// A numeric cell that is either a finite number or explicitly absent
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Reading {
    Present(f64),
    #[default]
    Absent,
}

impl Reading {
    /// Parse a raw token; the sentinel, non-numeric and non-finite tokens are absent
    pub fn parse(token: &str) -> Self {
        let token = token.trim();
        if token.is_empty() || token == MISSING_VALUE {
            return Reading::Absent;
        }

        match token.parse::<f64>() {
            Ok(value) if value.is_finite() => Reading::Present(value),
            _ => Reading::Absent,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Reading::Present(value) => Some(*value),
            Reading::Absent => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Reading::Present(_))
    }

    /// This reading, or `fallback` when absent
    pub fn or(self, fallback: Reading) -> Reading {
        match self {
            Reading::Present(_) => self,
            Reading::Absent => fallback,
        }
    }
}

impl Serialize for Reading {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Reading::Present(value) => serializer.serialize_f64(*value),
            Reading::Absent => serializer.serialize_none(),
        }
    }
}

/// Position of a series point on the x axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AxisPoint {
    /// Calendar date derived from the file's date columns
    Date(NaiveDate),
    /// Row index within the run when no date could be derived
    Position(usize),
}

impl AxisPoint {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            AxisPoint::Date(date) => Some(*date),
            AxisPoint::Position(_) => None,
        }
    }
}

/// Ordered values with a parallel axis of equal length
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VariableSeries {
    pub values: Vec<Reading>,
    pub axis: Vec<AxisPoint>,
}

impl VariableSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Series holding a single value without a time axis
    pub fn scalar(value: Reading) -> Self {
        Self {
            values: vec![value],
            axis: vec![AxisPoint::Position(0)],
        }
    }

    pub fn push(&mut self, axis: AxisPoint, value: Reading) {
        self.axis.push(axis);
        self.values.push(value);
    }

    /// Append every point of `other`
    pub fn extend_from(&mut self, other: &VariableSeries) {
        self.axis.extend_from_slice(&other.axis);
        self.values.extend_from_slice(&other.values);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Dates of the axis, `None` for positional points
    pub fn dates(&self) -> Vec<Option<NaiveDate>> {
        self.axis.iter().map(AxisPoint::date).collect()
    }

    /// Stable sort of the points by ascending date; positional points keep their order first
    pub fn sort_by_date(&mut self) {
        let mut points: Vec<(AxisPoint, Reading)> = self
            .axis
            .iter()
            .copied()
            .zip(self.values.iter().copied())
            .collect();
        points.sort_by_key(|(axis, _)| axis.date());

        let (axis, values) = points.into_iter().unzip();
        self.axis = axis;
        self.values = values;
    }
}

/// Final measured scalar in the uniform `{value}` shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeasuredValue {
    pub value: Reading,
    /// False when the value stands in for a missing measurement
    #[serde(skip)]
    pub observed: bool,
}

impl MeasuredValue {
    pub fn new(value: Reading) -> Self {
        Self {
            value,
            observed: value.is_present(),
        }
    }

    /// Simulated value filling in for a measurement nobody took
    pub fn stand_in(value: Reading) -> Self {
        Self {
            value,
            observed: false,
        }
    }
}

/// Files that contribute to a merged treatment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceKind {
    Simulation,
    Evaluation,
    TimeSeries,
    Summary,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SourceKind::Simulation => "simulation output",
            SourceKind::Evaluation => "evaluation output",
            SourceKind::TimeSeries => "time-series observations",
            SourceKind::Summary => "summary observations",
        };
        f.write_str(name)
    }
}

/// Marker for records produced by the merge stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FileType {
    #[default]
    #[serde(rename = "MERGED")]
    Merged,
}

/// Unified simulated vs. observed record for one treatment
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentRun {
    pub run: String,
    pub experiment: String,
    pub treatment_number: String,
    pub file_type: FileType,
    pub simulated: BTreeMap<String, VariableSeries>,
    pub measured_final: BTreeMap<String, MeasuredValue>,
    pub measured_time_series: BTreeMap<String, VariableSeries>,
    /// Treatment key exactly as each source spelled it
    pub source_keys: BTreeMap<SourceKind, String>,
}

impl TreatmentRun {
    pub fn new(
        run: impl Into<String>,
        experiment: impl Into<String>,
        treatment_number: impl Into<String>,
    ) -> Self {
        Self {
            run: run.into(),
            experiment: experiment.into(),
            treatment_number: treatment_number.into(),
            file_type: FileType::Merged,
            simulated: BTreeMap::new(),
            measured_final: BTreeMap::new(),
            measured_time_series: BTreeMap::new(),
            source_keys: BTreeMap::new(),
        }
    }
}
