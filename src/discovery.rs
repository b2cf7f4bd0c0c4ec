//! File discovery inside a crop folder
//!
//! Crop folders live directly under the model's base directory:
//! ```text
//! base/
//!   Maize/
//!     UFGA8201.MZX     experiment
//!     UFGA8201.MZT     daily observations
//!     UFGA8201.MZA     final observations
//!     PlantGro.OUT     simulation output
//!     Evaluate.OUT     measured vs simulated
//! ```
//! File names differ in case between installations, so lookups fall back
//! to a case-insensitive match.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::constants::{EVALUATE_FILE_MARKER, OUTPUT_FILE_EXT};
use crate::error::{Result, SimObsError};
use crate::models::Crop;

/// Simulation and evaluation outputs found in a crop folder
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CropOutputs {
    pub output_files: Vec<String>,
    pub evaluation_files: Vec<String>,
}

/// Folder holding all files of a crop
pub fn crop_folder(base_path: &Path, crop: &Crop) -> PathBuf {
    base_path.join(crop.folder_name())
}

/// All `.OUT` files of a crop folder, sorted by name
pub async fn list_output_files(base_path: &Path, crop: &Crop) -> Result<Vec<String>> {
    let folder = crop_folder(base_path, crop);
    let mut dir = fs::read_dir(&folder)
        .await
        .map_err(|e| SimObsError::unreadable(&folder, e))?;

    let mut files = Vec::new();
    while let Some(entry) = dir.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if is_output_file(&name) {
            files.push(name);
        }
    }

    files.sort();
    debug!("Found {} output files in {}", files.len(), folder.display());
    Ok(files)
}

/// Output files of a crop folder plus the evaluation outputs among them
pub async fn list_crop_outputs(base_path: &Path, crop: &Crop) -> Result<CropOutputs> {
    let output_files = list_output_files(base_path, crop).await?;
    let evaluation_files = output_files
        .iter()
        .filter(|name| is_evaluation_file(name))
        .cloned()
        .collect();

    Ok(CropOutputs {
        output_files,
        evaluation_files,
    })
}

/// Exact match first, then a case-insensitive match within `folder`
pub fn resolve_in_folder(folder: &Path, file_name: &str) -> Option<PathBuf> {
    let exact = folder.join(file_name);
    if exact.is_file() {
        return Some(exact);
    }

    std::fs::read_dir(folder)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .find(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.eq_ignore_ascii_case(file_name))
        })
}

/// Async variant of [`resolve_in_folder`]
pub async fn find_in_folder(folder: &Path, file_name: &str) -> Option<PathBuf> {
    let exact = folder.join(file_name);
    if fs::metadata(&exact).await.is_ok_and(|meta| meta.is_file()) {
        return Some(exact);
    }

    let mut dir = fs::read_dir(folder).await.ok()?;
    while let Ok(Some(entry)) = dir.next_entry().await {
        let matches = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.eq_ignore_ascii_case(file_name));
        if matches && entry.file_type().await.is_ok_and(|kind| kind.is_file()) {
            return Some(entry.path());
        }
    }
    None
}

fn is_output_file(name: &str) -> bool {
    name.to_uppercase().ends_with(OUTPUT_FILE_EXT)
}

fn is_evaluation_file(name: &str) -> bool {
    is_output_file(name) && name.to_lowercase().contains(EVALUATE_FILE_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;
    use tempfile::TempDir;

    fn crop_dir_with(files: &[&str]) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let crop_dir = temp_dir.path().join("Maize");
        std_fs::create_dir_all(&crop_dir).unwrap();
        for name in files {
            std_fs::write(crop_dir.join(name), "").unwrap();
        }
        temp_dir
    }

    #[tokio::test]
    async fn test_list_output_files() {
        let temp_dir = crop_dir_with(&["PlantGro.OUT", "Evaluate.OUT", "UFGA8201.MZT", "Summary.out"]);

        let files = list_output_files(temp_dir.path(), &Crop::Maize).await.unwrap();
        assert_eq!(files, vec!["Evaluate.OUT", "PlantGro.OUT", "Summary.out"]);

        let outputs = list_crop_outputs(temp_dir.path(), &Crop::Maize).await.unwrap();
        assert_eq!(outputs.evaluation_files, vec!["Evaluate.OUT"]);
    }

    #[tokio::test]
    async fn test_missing_crop_folder() {
        let temp_dir = TempDir::new().unwrap();
        let result = list_output_files(temp_dir.path(), &Crop::Wheat).await;
        assert!(matches!(result, Err(SimObsError::SourceUnreadable { .. })));
    }

    #[tokio::test]
    async fn test_case_insensitive_resolution() {
        let temp_dir = crop_dir_with(&["UFGA8201.MZT"]);
        let folder = temp_dir.path().join("Maize");

        let found = find_in_folder(&folder, "UFGA8201.mzt").await.unwrap();
        assert_eq!(found, folder.join("UFGA8201.MZT"));
        assert_eq!(
            resolve_in_folder(&folder, "ufga8201.mzt"),
            Some(folder.join("UFGA8201.MZT"))
        );
        assert!(find_in_folder(&folder, "UFGA8201.MZA").await.is_none());
    }
}
