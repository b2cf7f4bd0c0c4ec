//! Configuration management and validation.
//!
//! Settings are layered: built-in defaults, then a TOML file, then
//! environment variables, then command-line overrides applied by the caller.
//!
//! ```toml
//! base_path = "/opt/dssat"
//! evaluate_file_name = "Evaluate.OUT"
//! code_dictionary_path = "/opt/dssat/DATA.CDE"
//! treatment_metadata = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::collaborators::{
    CdeFileDictionary, CodeDictionary, EmptyCodeDictionary, NoTreatmentMetadata,
    TreatmentMetadata, XFileTreatments,
};
use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_BASE_PATH, DEFAULT_EVALUATE_FILE, ENV_BASE_PATH,
    ENV_CDE_PATH, ENV_EVALUATE_FILE,
};
use crate::error::{Result, SimObsError};

/// Settings for locating and merging crop model files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimObsConfig {
    /// Installation folder holding one sub-folder per crop
    pub base_path: PathBuf,

    /// Evaluation output looked up in the crop folder during a merge
    pub evaluate_file_name: String,

    /// Variable code dictionary (`DATA.CDE`); labels fall back to raw codes without it
    pub code_dictionary_path: Option<PathBuf>,

    /// Read treatment names from experiment files when labelling observations
    pub treatment_metadata: bool,
}

impl Default for SimObsConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from(DEFAULT_BASE_PATH),
            evaluate_file_name: DEFAULT_EVALUATE_FILE.to_string(),
            code_dictionary_path: None,
            treatment_metadata: true,
        }
    }
}

impl SimObsConfig {
    pub fn with_base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn with_evaluate_file_name(mut self, name: impl Into<String>) -> Self {
        self.evaluate_file_name = name.into();
        self
    }

    pub fn with_code_dictionary(mut self, path: impl Into<PathBuf>) -> Self {
        self.code_dictionary_path = Some(path.into());
        self
    }

    /// Always synthesize observation labels
    pub fn without_treatment_metadata(mut self) -> Self {
        self.treatment_metadata = false;
        self
    }

    /// `<config dir>/dssat-simobs/config.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Read a TOML config file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SimObsError::unreadable(path, e))?;
        toml::from_str(&content).map_err(|e| {
            SimObsError::configuration(format!("Invalid config file {}: {}", path.display(), e))
        })
    }

    /// Defaults, then `config_file` (or the default location when it exists), then environment
    pub fn load_layered(config_file: Option<&Path>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_config_path().filter(|path| path.exists()) {
                Some(path) => {
                    debug!("Using config file {}", path.display());
                    Self::from_file(&path)?
                }
                None => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override settings from environment variables looked up through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(base_path) = lookup(ENV_BASE_PATH) {
            self.base_path = PathBuf::from(base_path);
        }
        if let Some(name) = lookup(ENV_EVALUATE_FILE) {
            self.evaluate_file_name = name;
        }
        if let Some(path) = lookup(ENV_CDE_PATH) {
            self.code_dictionary_path = Some(PathBuf::from(path));
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_path.as_os_str().is_empty() {
            return Err(SimObsError::configuration("base_path must not be empty"));
        }

        let name = self.evaluate_file_name.trim();
        if name.is_empty() {
            return Err(SimObsError::configuration(
                "evaluate_file_name must not be empty",
            ));
        }
        if name.contains(['/', '\\']) {
            return Err(SimObsError::configuration(format!(
                "evaluate_file_name must be a file name inside the crop folder, got '{}'",
                name
            )));
        }

        Ok(())
    }

    /// Code dictionary selected by this configuration
    pub fn code_dictionary(&self) -> Arc<dyn CodeDictionary> {
        match &self.code_dictionary_path {
            Some(path) => Arc::new(CdeFileDictionary::new(path)),
            None => Arc::new(EmptyCodeDictionary),
        }
    }

    /// Treatment name source selected by this configuration
    pub fn treatment_metadata_source(&self) -> Arc<dyn TreatmentMetadata> {
        if self.treatment_metadata {
            Arc::new(XFileTreatments)
        } else {
            Arc::new(NoTreatmentMetadata)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = SimObsConfig::default();
        assert_eq!(config.evaluate_file_name, "Evaluate.OUT");
        assert!(config.treatment_metadata);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "base_path = \"/data/dssat\"\n").unwrap();

        let config = SimObsConfig::from_file(&path).unwrap();
        assert_eq!(config.base_path, PathBuf::from("/data/dssat"));
        assert_eq!(config.evaluate_file_name, "Evaluate.OUT");
        assert_eq!(config.code_dictionary_path, None);
    }

    #[test]
    fn test_invalid_file_is_configuration_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "base_path = [").unwrap();

        assert!(matches!(
            SimObsConfig::from_file(&path),
            Err(SimObsError::Configuration { .. })
        ));
    }

    #[test]
    fn test_environment_overrides_file() {
        let env = HashMap::from([
            (ENV_BASE_PATH, "/env/dssat"),
            (ENV_CDE_PATH, "/env/DATA.CDE"),
            (ENV_EVALUATE_FILE, "  "),
        ]);
        let mut config = SimObsConfig::default().with_evaluate_file_name("EvalMz.OUT");
        config.apply_env(|key| env.get(key).map(|value| value.to_string()));

        assert_eq!(config.base_path, PathBuf::from("/env/dssat"));
        assert_eq!(
            config.code_dictionary_path,
            Some(PathBuf::from("/env/DATA.CDE"))
        );
        // Blank values do not override
        assert_eq!(config.evaluate_file_name, "EvalMz.OUT");
    }

    #[test]
    fn test_validate_rejects_bad_evaluate_name() {
        let config = SimObsConfig::default().with_evaluate_file_name("");
        assert!(config.validate().is_err());

        let config = SimObsConfig::default().with_evaluate_file_name("../Evaluate.OUT");
        assert!(config.validate().is_err());

        let config = SimObsConfig::default().with_base_path("");
        assert!(config.validate().is_err());
    }
}
