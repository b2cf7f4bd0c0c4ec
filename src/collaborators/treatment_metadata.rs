//! Treatment names from experiment (X) files
//!
//! The `*TREATMENTS` section of an experiment file carries a fixed-width
//! `TNAME` field aligned under its header:
//!
//! ```text
//! *TREATMENTS                        -------------FACTOR LEVELS------------
//! @N R O C TNAME.................... CU FL SA IC MP MI MF MR MC MT ME MH SM
//!  1 1 0 0 RAINFED LOW NITROGEN       1  1  0  1  1  0  1  0  0  0  0  0  1
//! ```

use serde::Serialize;
use std::path::Path;
use tracing::debug;

use crate::constants::TREATMENT_NAME_WIDTH;
use crate::error::{Result, SimObsError};
use crate::models::Crop;
use crate::parsers::fields::{is_blank, is_comment_line, is_header_line, is_title_line};

/// Descriptive name of one treatment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentName {
    pub treatment_number: String,
    pub descriptive_name: String,
}

/// Source of treatment names for an experiment
pub trait TreatmentMetadata: Send + Sync + std::fmt::Debug {
    fn treatments(
        &self,
        crop: &Crop,
        base_path: &Path,
        experiment_file: &str,
    ) -> Result<Vec<TreatmentName>>;
}

/// Metadata source that knows no treatments
#[derive(Debug, Default, Clone)]
pub struct NoTreatmentMetadata;

impl TreatmentMetadata for NoTreatmentMetadata {
    fn treatments(&self, _crop: &Crop, _base: &Path, _file: &str) -> Result<Vec<TreatmentName>> {
        Ok(Vec::new())
    }
}

/// Reads treatment names from `<base>/<crop>/<experiment_file>`
#[derive(Debug, Default, Clone)]
pub struct XFileTreatments;

impl TreatmentMetadata for XFileTreatments {
    fn treatments(
        &self,
        crop: &Crop,
        base_path: &Path,
        experiment_file: &str,
    ) -> Result<Vec<TreatmentName>> {
        let folder = base_path.join(crop.folder_name());
        let path = crate::discovery::resolve_in_folder(&folder, experiment_file)
            .ok_or_else(|| SimObsError::metadata_unavailable(folder.join(experiment_file), "file not found"))?;

        let content =
            std::fs::read_to_string(&path).map_err(|e| SimObsError::unreadable(&path, e))?;
        let names = parse_treatment_section(&content);
        debug!("Read {} treatment names from {}", names.len(), path.display());
        Ok(names)
    }
}

/// Names from the `*TREATMENTS` section of experiment file text
pub fn parse_treatment_section(content: &str) -> Vec<TreatmentName> {
    let mut names = Vec::new();
    let mut in_section = false;
    let mut name_offset = None;

    for line in content.lines() {
        if is_title_line(line) {
            in_section = line
                .trim_start()
                .to_uppercase()
                .starts_with("*TREATMENTS");
            name_offset = None;
            continue;
        }
        if !in_section || is_blank(line) || is_comment_line(line) {
            continue;
        }

        if is_header_line(line) {
            name_offset = line.find("TNAME");
            continue;
        }

        let Some(offset) = name_offset else {
            continue;
        };
        let Some(number) = line.split_whitespace().next() else {
            continue;
        };

        let name: String = line
            .chars()
            .skip(offset)
            .take(TREATMENT_NAME_WIDTH)
            .collect();
        let name = name.trim();
        if !name.is_empty() {
            names.push(TreatmentName {
                treatment_number: number.to_string(),
                descriptive_name: name.to_string(),
            });
        }
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const X_FILE: &str = "\
*EXP.DETAILS: UFGA8201MZ NITROGEN X IRRIGATION

*TREATMENTS                        -------------FACTOR LEVELS------------
@N R O C TNAME.................... CU FL SA IC MP MI MF MR MC MT ME MH SM
 1 1 0 0 RAINFED LOW NITROGEN       1  1  0  1  1  0  1  0  0  0  0  0  1
 2 1 0 0 Irrigated high N           1  1  0  1  1  1  2  0  0  0  0  0  1

*CULTIVARS
@C CR INGENO CNAME
 1 MZ IB0035 McCurdy 84aa
";

    #[test]
    fn test_parse_treatment_section() {
        let names = parse_treatment_section(X_FILE);
        assert_eq!(names.len(), 2);
        assert_eq!(names[0].treatment_number, "1");
        assert_eq!(names[0].descriptive_name, "RAINFED LOW NITROGEN");
        assert_eq!(names[1].descriptive_name, "Irrigated high N");
    }

    #[test]
    fn test_x_file_lookup() {
        let temp_dir = TempDir::new().unwrap();
        let crop_dir = temp_dir.path().join("Maize");
        fs::create_dir_all(&crop_dir).unwrap();
        fs::write(crop_dir.join("UFGA8201.MZX"), X_FILE).unwrap();

        let names = XFileTreatments
            .treatments(&Crop::Maize, temp_dir.path(), "UFGA8201.MZX")
            .unwrap();
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_missing_x_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = XFileTreatments.treatments(&Crop::Maize, temp_dir.path(), "NONE.MZX");
        assert!(matches!(
            result,
            Err(SimObsError::MetadataUnavailable { .. })
        ));
    }
}
