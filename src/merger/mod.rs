//! Simulated vs. observed merge for one simulation output
//!
//! ## Sources
//!
//! 1. Simulation output (`*.OUT`), required: seeds one record per treatment
//! 2. Evaluation output (`Evaluate.OUT`): end-of-season simulated and measured values
//! 3. Daily observations (`<experiment>.<cc>t`): measured time series
//! 4. Final observations (`<experiment>.<cc>a`): measured end-of-season values
//!
//! Sources 2-4 are read concurrently once the simulation output has been
//! parsed and are applied in the order above, so the result does not depend
//! on which read finishes first. Only missing simulation data fails a merge.

pub mod identity;

#[cfg(test)]
pub mod tests;

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::collaborators::{CodeDictionary, TreatmentMetadata};
use crate::config::SimObsConfig;
use crate::discovery::{crop_folder, find_in_folder};
use crate::error::{Result, SimObsError};
use crate::models::{Crop, MeasuredValue, Reading, SourceKind, TreatmentRun, VariableSeries};
use crate::parsers::{
    EvaluationOutput, EvaluationOutputParser, SimulationOutputParser, SimulationRun,
    SummaryObservationParser, SummaryObservations, TimeSeriesObservationParser, TimeSeriesRun,
};

pub use identity::{IdentityMismatch, TreatmentIndex, TreatmentKey, experiments_match};

/// Merged records plus the treatments that could not be matched to the simulation output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeOutcome {
    pub records: Vec<TreatmentRun>,
    pub mismatches: Vec<IdentityMismatch>,
}

/// Merges a simulation output with the observations of its experiment
#[derive(Debug, Clone)]
pub struct SimVsObsMerger {
    config: SimObsConfig,
    simulation: SimulationOutputParser,
    evaluation: EvaluationOutputParser,
    time_series: TimeSeriesObservationParser,
    summary: SummaryObservationParser,
}

impl SimVsObsMerger {
    pub fn new(
        config: SimObsConfig,
        codes: Arc<dyn CodeDictionary>,
        metadata: Arc<dyn TreatmentMetadata>,
    ) -> Self {
        Self {
            config,
            simulation: SimulationOutputParser::new(),
            evaluation: EvaluationOutputParser::new(codes),
            time_series: TimeSeriesObservationParser::new(metadata),
            summary: SummaryObservationParser::new(),
        }
    }

    /// Merger wired to the collaborators the configuration selects
    pub fn from_config(config: SimObsConfig) -> Self {
        let codes = config.code_dictionary();
        let metadata = config.treatment_metadata_source();
        Self::new(config, codes, metadata)
    }

    pub fn config(&self) -> &SimObsConfig {
        &self.config
    }

    /// Merge simulation output `out_file` of `crop` with every observation source found
    pub async fn merge(&self, crop: &Crop, out_file: &str) -> Result<MergeOutcome> {
        let folder = crop_folder(&self.config.base_path, crop);
        let primary_path = find_in_folder(&folder, out_file)
            .await
            .unwrap_or_else(|| folder.join(out_file));

        let runs = self
            .simulation
            .parse_file(&primary_path)
            .await
            .map_err(|e| SimObsError::missing_primary(&primary_path, e.to_string()))?;
        if runs.is_empty() {
            return Err(SimObsError::missing_primary(
                &primary_path,
                "no treatment runs found",
            ));
        }

        let experiment = runs[0].experiment.clone();
        let mut index = seed_index(runs);
        info!(
            "Merging {} treatments of experiment '{}' from {}",
            index.len(),
            experiment,
            primary_path.display()
        );

        let (evaluation, time_series, summary) = tokio::join!(
            self.read_evaluation(&folder),
            self.read_time_series(crop, &folder, &experiment),
            self.read_summary(crop, &folder, &experiment),
        );

        if let Some(evaluation) = evaluation {
            apply_evaluation(&mut index, &evaluation, &experiment, crop);
        }
        if let Some(runs) = time_series {
            apply_time_series(&mut index, runs, &experiment);
        }
        if let Some(observations) = summary {
            apply_summary(&mut index, observations, &experiment);
        }

        let (records, mismatches) = index.finish();
        for mismatch in &mismatches {
            warn!(
                "Treatment '{}' of {} has no match in {} (experiment '{}')",
                mismatch.raw_treatment, mismatch.source, out_file, mismatch.experiment
            );
        }
        info!(
            "Merged {} records ({} unmatched treatments)",
            records.len(),
            mismatches.len()
        );

        Ok(MergeOutcome {
            records,
            mismatches,
        })
    }

    async fn read_evaluation(&self, folder: &Path) -> Option<EvaluationOutput> {
        let name = &self.config.evaluate_file_name;
        let Some(path) = find_in_folder(folder, name).await else {
            info!("No evaluation file {} in {}", name, folder.display());
            return None;
        };
        Some(self.evaluation.parse_file(&path).await)
    }

    async fn read_time_series(
        &self,
        crop: &Crop,
        folder: &Path,
        experiment: &str,
    ) -> Option<Vec<TimeSeriesRun>> {
        let name = observation_file_name(experiment, &crop.time_series_extension())?;
        let Some(path) = find_in_folder(folder, &name).await else {
            info!("No time-series observations {} in {}", name, folder.display());
            return None;
        };

        match self
            .time_series
            .parse_file(&self.config.base_path, crop, &path)
            .await
        {
            Ok(runs) => Some(runs),
            Err(e) => {
                warn!("Skipping time-series observations: {}", e);
                None
            }
        }
    }

    async fn read_summary(
        &self,
        crop: &Crop,
        folder: &Path,
        experiment: &str,
    ) -> Option<SummaryObservations> {
        let name = observation_file_name(experiment, &crop.summary_extension())?;
        let Some(path) = find_in_folder(folder, &name).await else {
            info!("No summary observations {} in {}", name, folder.display());
            return None;
        };

        match self.summary.parse_file(&path).await {
            Ok(observations) => Some(observations),
            Err(e) => {
                warn!("Skipping summary observations: {}", e);
                None
            }
        }
    }
}

fn observation_file_name(experiment: &str, extension: &str) -> Option<String> {
    let experiment = experiment.trim();
    if experiment.is_empty() {
        debug!("Simulation output names no experiment, skipping {} lookup", extension);
        return None;
    }
    Some(format!("{}{}", experiment, extension))
}

/// One record per simulated treatment, in file order
pub fn seed_index(runs: Vec<SimulationRun>) -> TreatmentIndex {
    let mut index = TreatmentIndex::default();
    for run in runs {
        let key = TreatmentKey::new(&run.experiment, &run.treatment_number);
        let mut record = TreatmentRun::new(run.run, run.experiment, run.treatment_number.clone());
        record.simulated = run.series;
        record
            .source_keys
            .insert(SourceKind::Simulation, run.treatment_number);

        if !index.seed(key, record) {
            debug!("Duplicate simulated treatment ignored");
        }
    }
    index
}

/// Evaluation rows of `experiment`: simulated end-of-season values fill gaps, measured ones replace
pub fn apply_evaluation(
    index: &mut TreatmentIndex,
    evaluation: &EvaluationOutput,
    experiment: &str,
    crop: &Crop,
) {
    for record in &evaluation.records {
        let Some(code) = record.experiment() else {
            debug!("Evaluation row without EXCODE skipped");
            continue;
        };
        if !experiments_match(experiment, code, crop) {
            continue;
        }
        let Some(trno) = record.treatment_number() else {
            debug!("Evaluation row of {} without TRNO skipped", code);
            continue;
        };

        let entry = index.resolve(SourceKind::Evaluation, experiment, trno, None);
        for (variable, value) in &record.variables {
            entry
                .simulated
                .entry(variable.clone())
                .or_insert_with(|| VariableSeries::scalar(value.simulated));
            let measured = if value.observed.is_present() {
                MeasuredValue::new(value.measured)
            } else {
                MeasuredValue::stand_in(value.measured)
            };
            entry.measured_final.insert(variable.clone(), measured);
        }
    }
}

/// Daily observations extend any series already present, then are re-sorted by date
pub fn apply_time_series(index: &mut TreatmentIndex, runs: Vec<TimeSeriesRun>, experiment: &str) {
    for run in runs {
        let entry = index.resolve(
            SourceKind::TimeSeries,
            experiment,
            &run.treatment_number,
            Some(&run.run),
        );
        for (variable, series) in run.series {
            let target = entry.measured_time_series.entry(variable).or_default();
            target.extend_from(&series);
            target.sort_by_date();
        }
    }
}

/// Final observations replace measured end-of-season values
pub fn apply_summary(index: &mut TreatmentIndex, observations: SummaryObservations, experiment: &str) {
    for (trno, values) in observations {
        let entry = index.resolve(SourceKind::Summary, experiment, &trno, None);
        for (variable, value) in values {
            entry
                .measured_final
                .insert(variable, MeasuredValue::new(Reading::Present(value)));
        }
    }
}
