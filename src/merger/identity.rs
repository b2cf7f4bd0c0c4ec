//! Treatment identity across sources
//!
//! Every source spells treatments slightly differently (`01` vs `1`, lower-case
//! experiment codes). Records are matched on a [`TreatmentKey`]; treatments an
//! optional source knows but the simulation output does not still get an entry,
//! and are reported as an [`IdentityMismatch`].

use serde::Serialize;
use std::collections::HashMap;

use crate::models::{Crop, SourceKind, TreatmentRun};

/// Canonical treatment number: trimmed, integers without leading zeros, otherwise upper-cased
pub fn normalize_treatment(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.parse::<u64>() {
        Ok(number) => number.to_string(),
        Err(_) => trimmed.to_uppercase(),
    }
}

/// Whether `candidate` names the same experiment as `primary`
///
/// Evaluation outputs append the two-letter crop code (`UFGA8201MZ` for
/// `UFGA8201`), so the crop-suffixed form matches too.
pub fn experiments_match(primary: &str, candidate: &str, crop: &Crop) -> bool {
    let primary = primary.trim();
    let candidate = candidate.trim();
    if primary.is_empty() {
        return false;
    }
    if primary.eq_ignore_ascii_case(candidate) {
        return true;
    }

    let (Some(head), Some(tail)) = (
        candidate.get(..primary.len()),
        candidate.get(primary.len()..),
    ) else {
        return false;
    };
    head.eq_ignore_ascii_case(primary)
        && crop
            .code()
            .is_some_and(|code| tail.eq_ignore_ascii_case(code))
}

/// Experiment and treatment a record belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TreatmentKey {
    pub experiment: String,
    pub treatment: String,
}

impl TreatmentKey {
    pub fn new(experiment: &str, treatment: &str) -> Self {
        Self {
            experiment: experiment.trim().to_uppercase(),
            treatment: normalize_treatment(treatment),
        }
    }
}

/// Optional-source treatment with no counterpart in the simulation output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityMismatch {
    pub source: SourceKind,
    pub experiment: String,
    pub raw_treatment: String,
}

/// Merged records in output order plus a key lookup
#[derive(Debug, Default)]
pub struct TreatmentIndex {
    records: Vec<TreatmentRun>,
    positions: HashMap<TreatmentKey, usize>,
    primary_count: usize,
    mismatches: Vec<IdentityMismatch>,
}

impl TreatmentIndex {
    /// Seed the index with a record from the primary source
    ///
    /// A treatment seen twice keeps its first record.
    pub fn seed(&mut self, key: TreatmentKey, record: TreatmentRun) -> bool {
        if self.positions.contains_key(&key) {
            return false;
        }
        self.positions.insert(key, self.records.len());
        self.records.push(record);
        self.primary_count = self.records.len();
        true
    }

    /// Record for `raw_treatment` as spelled by `source`, created on first sight
    ///
    /// `label` names a newly created entry; it defaults to `Treatment_<n>`.
    pub fn resolve(
        &mut self,
        source: SourceKind,
        experiment: &str,
        raw_treatment: &str,
        label: Option<&str>,
    ) -> &mut TreatmentRun {
        let key = TreatmentKey::new(experiment, raw_treatment);
        let position = match self.positions.get(&key) {
            Some(position) => *position,
            None => {
                let run = label
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Treatment_{}", key.treatment));
                self.records
                    .push(TreatmentRun::new(run, experiment, key.treatment.clone()));
                self.positions.insert(key, self.records.len() - 1);
                self.records.len() - 1
            }
        };

        let record = &mut self.records[position];
        if position >= self.primary_count && !record.source_keys.contains_key(&source) {
            self.mismatches.push(IdentityMismatch {
                source,
                experiment: experiment.to_string(),
                raw_treatment: raw_treatment.to_string(),
            });
        }
        record
            .source_keys
            .entry(source)
            .or_insert_with(|| raw_treatment.to_string());
        record
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in primary order, then synthetic entries in encounter order
    pub fn finish(self) -> (Vec<TreatmentRun>, Vec<IdentityMismatch>) {
        (self.records, self.mismatches)
    }
}
