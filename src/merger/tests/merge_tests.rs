//! End-to-end merges over a temporary crop folder

use super::{A_FILE, EVALUATE, PLANT_GRO, T_FILE, crop_folder_with};
use crate::collaborators::{EmptyCodeDictionary, NoTreatmentMetadata};
use crate::config::SimObsConfig;
use crate::date_codec::from_packed_yyddd;
use crate::error::SimObsError;
use crate::merger::SimVsObsMerger;
use crate::models::{AxisPoint, Crop, FileType, Reading, SourceKind};
use std::path::Path;
use std::sync::Arc;

fn merger(base_path: &Path) -> SimVsObsMerger {
    SimVsObsMerger::new(
        SimObsConfig::default().with_base_path(base_path),
        Arc::new(EmptyCodeDictionary),
        Arc::new(NoTreatmentMetadata),
    )
}

#[tokio::test]
async fn test_merge_all_sources() {
    let (temp_dir, _) = crop_folder_with(&[
        ("PlantGro.OUT", PLANT_GRO),
        ("Evaluate.OUT", EVALUATE),
        ("UFGA8201.MZT", T_FILE),
        ("UFGA8201.MZA", A_FILE),
    ]);

    let outcome = merger(temp_dir.path())
        .merge(&Crop::Maize, "PlantGro.OUT")
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 3);
    let first = &outcome.records[0];
    assert_eq!(first.treatment_number, "1");
    assert_eq!(first.experiment, "UFGA8201");
    assert_eq!(first.file_type, FileType::Merged);
    assert_eq!(first.simulated["LAID"].len(), 2);
    assert_eq!(first.simulated["HWAM"].values, vec![Reading::Present(7895.0)]);

    // A-file replaces the evaluation value
    assert_eq!(first.measured_final["HWAM"].value, Reading::Present(8250.0));
    assert_eq!(first.measured_final["LAIX"].value, Reading::Present(3.12));
    assert_eq!(first.measured_final["MDAT"].value, Reading::Present(82227.0));

    let laid = &first.measured_time_series["LAID"];
    assert_eq!(
        laid.axis,
        vec![
            AxisPoint::Date(from_packed_yyddd(82166).unwrap()),
            AxisPoint::Date(from_packed_yyddd(82180).unwrap())
        ]
    );
    assert_eq!(
        first.source_keys.keys().copied().collect::<Vec<_>>(),
        vec![
            SourceKind::Simulation,
            SourceKind::Evaluation,
            SourceKind::TimeSeries,
            SourceKind::Summary
        ]
    );

    // Sentinel in the A-file leaves the evaluation value alone
    let second = &outcome.records[1];
    assert_eq!(second.measured_final["HWAM"].value, Reading::Present(9441.0));
}

#[tokio::test]
async fn test_unmatched_treatment_is_reported() {
    let (temp_dir, _) = crop_folder_with(&[
        ("PlantGro.OUT", PLANT_GRO),
        ("Evaluate.OUT", EVALUATE),
    ]);

    let outcome = merger(temp_dir.path())
        .merge(&Crop::Maize, "PlantGro.OUT")
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 3);
    let synthetic = &outcome.records[2];
    assert_eq!(synthetic.run, "Treatment_3");
    assert_eq!(synthetic.simulated["HWAM"].values, vec![Reading::Present(6000.0)]);

    assert_eq!(outcome.mismatches.len(), 1);
    assert_eq!(outcome.mismatches[0].source, SourceKind::Evaluation);
    assert_eq!(outcome.mismatches[0].raw_treatment, "3");
}

#[tokio::test]
async fn test_other_experiments_ignored() {
    let (temp_dir, _) = crop_folder_with(&[
        ("PlantGro.OUT", PLANT_GRO),
        ("Evaluate.OUT", EVALUATE),
    ]);

    let outcome = merger(temp_dir.path())
        .merge(&Crop::Maize, "PlantGro.OUT")
        .await
        .unwrap();

    // KSAS8101WH treatment 1 must not touch UFGA8201 treatment 1
    let first = &outcome.records[0];
    assert_eq!(first.measured_final["HWAM"].value, Reading::Present(8200.0));
}

#[tokio::test]
async fn test_maize_without_time_series() {
    let (temp_dir, _) = crop_folder_with(&[("PlantGro.OUT", PLANT_GRO)]);

    let outcome = merger(temp_dir.path())
        .merge(&Crop::Maize, "PlantGro.OUT")
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 2);
    assert!(outcome.mismatches.is_empty());
    for record in &outcome.records {
        assert!(record.measured_time_series.is_empty());
        assert!(record.measured_final.is_empty());
    }

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["records"][0]["fileType"], "MERGED");
    assert!(json["records"][0]["measuredTimeSeries"].as_object().unwrap().is_empty());
}

#[tokio::test]
async fn test_configured_evaluation_file_name() {
    let (temp_dir, _) = crop_folder_with(&[
        ("PlantGro.OUT", PLANT_GRO),
        ("EvaluateMZ.OUT", EVALUATE),
    ]);

    let merger = SimVsObsMerger::new(
        SimObsConfig::default()
            .with_base_path(temp_dir.path())
            .with_evaluate_file_name("evaluatemz.out"),
        Arc::new(EmptyCodeDictionary),
        Arc::new(NoTreatmentMetadata),
    );
    let outcome = merger.merge(&Crop::Maize, "plantgro.out").await.unwrap();

    assert!(outcome.records[0].measured_final.contains_key("HWAM"));
}

#[tokio::test]
async fn test_missing_primary_is_fatal() {
    let (temp_dir, _) = crop_folder_with(&[("Evaluate.OUT", EVALUATE)]);

    let result = merger(temp_dir.path())
        .merge(&Crop::Maize, "PlantGro.OUT")
        .await;
    assert!(matches!(result, Err(SimObsError::MissingPrimaryData { .. })));
}

#[tokio::test]
async fn test_primary_without_runs_is_fatal() {
    let (temp_dir, _) = crop_folder_with(&[("PlantGro.OUT", "*DSSAT Cropping System Model\n")]);

    let result = merger(temp_dir.path())
        .merge(&Crop::Maize, "PlantGro.OUT")
        .await;
    assert!(matches!(result, Err(SimObsError::MissingPrimaryData { .. })));
}
