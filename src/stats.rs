//! Agreement statistics between observed and simulated values
//!
//! Per variable: means, population standard deviations, r², mean and mean
//! absolute difference, RMSE and Willmott's index of agreement (d). Pairs
//! missing either side are counted in `total_number` but not used.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::models::{Reading, TreatmentRun};
use crate::parsers::EvaluationRecord;

/// An observation and the simulated value it is compared with
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sample {
    pub observed: Reading,
    pub simulated: Reading,
}

impl Sample {
    pub fn new(observed: Reading, simulated: Reading) -> Self {
        Self {
            observed,
            simulated,
        }
    }

    fn pair(&self) -> Option<(f64, f64)> {
        Some((self.observed.value()?, self.simulated.value()?))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgreementStatistics {
    pub mean_observed: f64,
    pub mean_simulated: f64,
    /// Simulated over observed mean; `None` when the observed mean is zero
    pub mean_ratio: Option<f64>,
    pub std_dev_observed: f64,
    pub std_dev_simulated: f64,
    /// Squared Pearson correlation; `None` when either side is constant
    pub r_square: Option<f64>,
    /// Mean of simulated minus observed
    pub mean_diff: f64,
    pub mean_abs_diff: f64,
    pub rmse: f64,
    /// Willmott's d; `None` when every value equals the observed mean
    pub d_stat: Option<f64>,
    pub used_observations: usize,
    pub total_number: usize,
}

/// Statistics over the complete pairs of `samples`, `None` when there are none
pub fn calculate(samples: &[Sample]) -> Option<AgreementStatistics> {
    let pairs: Vec<(f64, f64)> = samples.iter().filter_map(Sample::pair).collect();
    if pairs.is_empty() {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_observed = pairs.iter().map(|(o, _)| o).sum::<f64>() / n;
    let mean_simulated = pairs.iter().map(|(_, s)| s).sum::<f64>() / n;

    let variance_observed = pairs
        .iter()
        .map(|(o, _)| (o - mean_observed).powi(2))
        .sum::<f64>()
        / n;
    let variance_simulated = pairs
        .iter()
        .map(|(_, s)| (s - mean_simulated).powi(2))
        .sum::<f64>()
        / n;
    let covariance = pairs
        .iter()
        .map(|(o, s)| (o - mean_observed) * (s - mean_simulated))
        .sum::<f64>()
        / n;

    let squared_error: f64 = pairs.iter().map(|(o, s)| (s - o).powi(2)).sum();
    let potential_error: f64 = pairs
        .iter()
        .map(|(o, s)| ((s - mean_observed).abs() + (o - mean_observed).abs()).powi(2))
        .sum();

    Some(AgreementStatistics {
        mean_observed,
        mean_simulated,
        mean_ratio: (mean_observed != 0.0).then(|| mean_simulated / mean_observed),
        std_dev_observed: variance_observed.sqrt(),
        std_dev_simulated: variance_simulated.sqrt(),
        r_square: (variance_observed > 0.0 && variance_simulated > 0.0)
            .then(|| covariance.powi(2) / (variance_observed * variance_simulated)),
        mean_diff: pairs.iter().map(|(o, s)| s - o).sum::<f64>() / n,
        mean_abs_diff: pairs.iter().map(|(o, s)| (s - o).abs()).sum::<f64>() / n,
        rmse: (squared_error / n).sqrt(),
        d_stat: (potential_error > 0.0).then(|| 1.0 - squared_error / potential_error),
        used_observations: pairs.len(),
        total_number: samples.len(),
    })
}

/// Samples per variable from evaluation rows, without the simulated stand-ins
pub fn evaluation_samples(records: &[EvaluationRecord]) -> BTreeMap<String, Vec<Sample>> {
    let mut samples: BTreeMap<String, Vec<Sample>> = BTreeMap::new();
    for record in records {
        for (variable, value) in &record.variables {
            samples
                .entry(variable.clone())
                .or_default()
                .push(Sample::new(value.observed, value.simulated));
        }
    }
    samples
}

/// Samples per variable from merged records
///
/// Each final measurement is compared with the last simulated value of the
/// same variable, i.e. the end-of-season value.
pub fn merged_samples(records: &[TreatmentRun]) -> BTreeMap<String, Vec<Sample>> {
    let mut samples: BTreeMap<String, Vec<Sample>> = BTreeMap::new();
    for record in records {
        for (variable, measured) in &record.measured_final {
            let observed = if measured.observed {
                measured.value
            } else {
                Reading::Absent
            };
            let simulated = record
                .simulated
                .get(variable)
                .and_then(|series| series.values.iter().rev().find(|r| r.is_present()))
                .copied()
                .unwrap_or_default();

            samples
                .entry(variable.clone())
                .or_default()
                .push(Sample::new(observed, simulated));
        }
    }
    samples
}

/// Statistics per variable; variables without a complete pair are left out
pub fn summarize(
    samples: &BTreeMap<String, Vec<Sample>>,
) -> BTreeMap<String, AgreementStatistics> {
    samples
        .iter()
        .filter_map(|(variable, samples)| match calculate(samples) {
            Some(statistics) => Some((variable.clone(), statistics)),
            None => {
                debug!("No complete observed/simulated pairs for {}", variable);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::EmptyCodeDictionary;
    use crate::models::{AxisPoint, MeasuredValue, VariableSeries};
    use crate::parsers::EvaluationOutputParser;
    use std::sync::Arc;

    fn samples(pairs: &[(f64, f64)]) -> Vec<Sample> {
        pairs
            .iter()
            .map(|(o, s)| Sample::new(Reading::Present(*o), Reading::Present(*s)))
            .collect()
    }

    fn close(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() < 1e-9
    }

    #[test]
    fn test_calculate_hand_computed() {
        let stats = calculate(&samples(&[(2.0, 3.0), (4.0, 5.0), (6.0, 4.0)])).unwrap();

        assert!(close(stats.mean_observed, 4.0));
        assert!(close(stats.mean_simulated, 4.0));
        assert!(close(stats.mean_ratio.unwrap(), 1.0));
        assert!(close(stats.std_dev_observed, (8.0f64 / 3.0).sqrt()));
        assert!(close(stats.std_dev_simulated, (2.0f64 / 3.0).sqrt()));
        assert!(close(stats.r_square.unwrap(), 0.25));
        assert!(close(stats.mean_diff, 0.0));
        assert!(close(stats.mean_abs_diff, 4.0 / 3.0));
        assert!(close(stats.rmse, 2.0f64.sqrt()));
        assert!(close(stats.d_stat.unwrap(), 1.0 - 6.0 / 14.0));
        assert_eq!(stats.used_observations, 3);
        assert_eq!(stats.total_number, 3);
    }

    #[test]
    fn test_perfect_agreement() {
        let stats = calculate(&samples(&[(1.0, 1.0), (2.0, 2.0), (4.0, 4.0)])).unwrap();

        assert!(close(stats.rmse, 0.0));
        assert!(close(stats.r_square.unwrap(), 1.0));
        assert!(close(stats.d_stat.unwrap(), 1.0));
    }

    #[test]
    fn test_incomplete_pairs_are_counted_not_used() {
        let mut input = samples(&[(2.0, 3.0), (4.0, 5.0)]);
        input.push(Sample::new(Reading::Absent, Reading::Present(7.0)));
        input.push(Sample::new(Reading::Present(7.0), Reading::Absent));

        let stats = calculate(&input).unwrap();
        assert_eq!(stats.used_observations, 2);
        assert_eq!(stats.total_number, 4);
        assert!(close(stats.mean_observed, 3.0));
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(calculate(&[]), None);
        assert_eq!(
            calculate(&[Sample::new(Reading::Absent, Reading::Present(1.0))]),
            None
        );

        // Constant observations: no correlation, zero observed mean
        let stats = calculate(&samples(&[(0.0, 1.0), (0.0, 2.0)])).unwrap();
        assert_eq!(stats.r_square, None);
        assert_eq!(stats.mean_ratio, None);
        assert!(close(stats.std_dev_observed, 0.0));
    }

    #[test]
    fn test_merged_samples_skip_stand_ins() {
        let mut run = TreatmentRun::new("Rainfed", "UFGA8201", "1");
        let mut laid = VariableSeries::new();
        laid.push(AxisPoint::Position(0), Reading::Present(1.0));
        laid.push(AxisPoint::Position(1), Reading::Present(3.1));
        laid.push(AxisPoint::Position(2), Reading::Absent);
        run.simulated.insert("LAID".to_string(), laid);
        run.simulated
            .insert("HWAM".to_string(), VariableSeries::scalar(Reading::Present(7895.0)));
        run.measured_final
            .insert("LAID".to_string(), MeasuredValue::new(Reading::Present(3.3)));
        run.measured_final
            .insert("HWAM".to_string(), MeasuredValue::stand_in(Reading::Present(7895.0)));

        let samples = merged_samples(&[run]);
        assert_eq!(
            samples["LAID"],
            vec![Sample::new(Reading::Present(3.3), Reading::Present(3.1))]
        );
        assert_eq!(
            samples["HWAM"],
            vec![Sample::new(Reading::Absent, Reading::Present(7895.0))]
        );

        let summary = summarize(&samples);
        assert!(summary.contains_key("LAID"));
        assert!(!summary.contains_key("HWAM"));
    }

    #[test]
    fn test_evaluation_samples_use_recorded_measurements() {
        let evaluation = EvaluationOutputParser::new(Arc::new(EmptyCodeDictionary)).parse_str(
            "@EXCODE TRNO HWAMS HWAMM LAIXS LAIXM\n UFGA8201 1 7895 8200 3.12 -99\n UFGA8201 2 9012 9441 3.55 3.70\n",
        );
        let samples = evaluation_samples(&evaluation.records);

        assert_eq!(samples["HWAM"].len(), 2);
        assert_eq!(samples["LAIX"][0].observed, Reading::Absent);

        let summary = summarize(&samples);
        assert_eq!(summary["HWAM"].used_observations, 2);
        assert_eq!(summary["LAIX"].used_observations, 1);
        assert_eq!(summary["LAIX"].total_number, 2);
        assert!(close(summary["LAIX"].mean_diff, 3.55 - 3.70));
    }

    #[test]
    fn test_statistics_serialization() {
        let stats = calculate(&samples(&[(0.0, 1.0), (0.0, 2.0)])).unwrap();
        let json = serde_json::to_value(&stats).unwrap();

        assert_eq!(json["usedObservations"], 2);
        assert!(json["rSquare"].is_null());
        assert_eq!(json["meanSimulated"], 1.5);
    }
}
