//! Pipeline configuration
//!
//! Every setting has a default, a TOML file only needs to name what it changes:
//!
//! ```toml
//! data_dir = "/opt/working_data/data"
//! model_key = "model.sav"
//!
//! [fit]
//! max_clusters = 12
//! selection = "elbow"
//! ```
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clusterflow::ParamGuard;
use clusterflow_clustering::KMeansInit;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Which of the fitted models is committed by the fitting stage
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSelection {
    /// The model with the largest cluster count of the range
    Largest,
    /// The model at the elbow of the dispersion curve, or the largest one if there is no elbow
    Elbow,
}

impl Default for ModelSelection {
    fn default() -> Self {
        ModelSelection::Largest
    }
}

impl FromStr for ModelSelection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "largest" => Ok(ModelSelection::Largest),
            "elbow" => Ok(ModelSelection::Elbow),
            other => Err(format!(
                "unknown model selection {:?}, expected \"largest\" or \"elbow\"",
                other
            )),
        }
    }
}

impl fmt::Display for ModelSelection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ModelSelection::Largest => write!(f, "largest"),
            ModelSelection::Elbow => write!(f, "elbow"),
        }
    }
}

/// Checked settings of the model fitting stage
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FitValidSettings {
    max_clusters: usize,
    n_runs: usize,
    max_n_iterations: u64,
    tolerance: f64,
    seed: u64,
    init: KMeansInit,
    selection: ModelSelection,
}

impl Default for FitValidSettings {
    fn default() -> Self {
        FitValidSettings {
            max_clusters: 49,
            n_runs: 10,
            max_n_iterations: 300,
            tolerance: 1e-4,
            seed: 42,
            init: KMeansInit::Random,
            selection: ModelSelection::Largest,
        }
    }
}

impl FitValidSettings {
    /// Models are fitted for every cluster count in `1..=max_clusters`
    pub fn max_clusters(&self) -> usize {
        self.max_clusters
    }

    pub fn n_runs(&self) -> usize {
        self.n_runs
    }

    pub fn max_n_iterations(&self) -> u64 {
        self.max_n_iterations
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Every cluster count starts from a generator seeded with this value
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn init(&self) -> KMeansInit {
        self.init
    }

    pub fn selection(&self) -> ModelSelection {
        self.selection
    }
}

/// Settings of the model fitting stage, checked before the first model is fitted
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FitSettings(FitValidSettings);

impl FitSettings {
    /// Defaults of the other settings:
    /// * `n_runs = 10`
    /// * `max_n_iterations = 300`
    /// * `tolerance = 1e-4`
    /// * `seed = 42`
    /// * `init = Random`
    /// * `selection = Largest`
    pub fn new(max_clusters: usize) -> Self {
        FitSettings(FitValidSettings {
            max_clusters,
            ..FitValidSettings::default()
        })
    }

    pub fn max_clusters(mut self, max_clusters: usize) -> Self {
        self.0.max_clusters = max_clusters;
        self
    }

    pub fn n_runs(mut self, n_runs: usize) -> Self {
        self.0.n_runs = n_runs;
        self
    }

    pub fn max_n_iterations(mut self, max_n_iterations: u64) -> Self {
        self.0.max_n_iterations = max_n_iterations;
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.0.tolerance = tolerance;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.0.seed = seed;
        self
    }

    pub fn init(mut self, init: KMeansInit) -> Self {
        self.0.init = init;
        self
    }

    pub fn selection(mut self, selection: ModelSelection) -> Self {
        self.0.selection = selection;
        self
    }
}

impl ParamGuard for FitSettings {
    type Checked = FitValidSettings;
    type Error = PipelineError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        let invalid = |msg: &str| PipelineError::InvalidSettings(msg.to_string());

        if self.0.max_clusters == 0 {
            Err(invalid("max_clusters must be at least 1"))
        } else if self.0.n_runs == 0 {
            Err(invalid("n_runs must be at least 1"))
        } else if self.0.max_n_iterations == 0 {
            Err(invalid("max_n_iterations must be at least 1"))
        } else if !(self.0.tolerance.is_finite() && self.0.tolerance > 0.) {
            Err(invalid("tolerance must be positive"))
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

/// Locations of the pipeline's files and the fitting settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Directory of the training and test files
    pub data_dir: PathBuf,
    /// Root of the file system artifact store
    pub model_dir: PathBuf,
    pub train_file: String,
    pub test_file: String,
    pub model_key: String,
    pub scaler_key: String,
    pub fit: FitSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            data_dir: PathBuf::from("working_data/data"),
            model_dir: PathBuf::from("working_data/model"),
            train_file: "file.csv".to_string(),
            test_file: "test.csv".to_string(),
            model_key: "model.sav".to_string(),
            scaler_key: "scaler.json".to_string(),
            fit: FitSettings::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|err| PipelineError::InvalidSettings(err.to_string()))
    }

    /// Read the configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => PipelineError::MissingInput(path.to_path_buf()),
            _ => PipelineError::Io(err),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn train_path(&self) -> PathBuf {
        self.data_dir.join(&self.train_file)
    }

    pub fn test_path(&self) -> PathBuf {
        self.data_dir.join(&self.test_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_reference_pipeline() {
        let config = PipelineConfig::default();
        assert_eq!(config.train_path(), Path::new("working_data/data/file.csv"));
        assert_eq!(config.test_path(), Path::new("working_data/data/test.csv"));
        assert_eq!(config.model_key, "model.sav");

        let fit = config.fit.check().unwrap();
        assert_eq!(fit.max_clusters(), 49);
        assert_eq!(fit.n_runs(), 10);
        assert_eq!(fit.max_n_iterations(), 300);
        assert_eq!(fit.seed(), 42);
        assert_eq!(fit.init(), KMeansInit::Random);
        assert_eq!(fit.selection(), ModelSelection::Largest);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
            data_dir = "/data"
            scaler_key = "minmax.json"

            [fit]
            max_clusters = 12
            selection = "elbow"
            init = "KMeansPlusPlus"
            "#,
        )
        .unwrap();

        assert_eq!(config.train_path(), Path::new("/data/file.csv"));
        assert_eq!(config.scaler_key, "minmax.json");
        assert_eq!(config.model_dir, PathBuf::from("working_data/model"));

        let fit = config.fit.check_ref().unwrap();
        assert_eq!(fit.max_clusters(), 12);
        assert_eq!(fit.selection(), ModelSelection::Elbow);
        assert_eq!(fit.init(), KMeansInit::KMeansPlusPlus);
        assert_eq!(fit.n_runs(), 10);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let res = PipelineConfig::from_toml_str("max_cluster = 3");
        assert!(matches!(res, Err(PipelineError::InvalidSettings(_))));
    }

    #[test]
    fn settings_are_checked() {
        assert!(FitSettings::new(0).check().is_err());
        assert!(FitSettings::new(3).n_runs(0).check().is_err());
        assert!(FitSettings::new(3).max_n_iterations(0).check().is_err());
        assert!(FitSettings::new(3).tolerance(0.).check().is_err());
        assert!(FitSettings::new(3).tolerance(f64::NAN).check().is_err());
        assert!(FitSettings::new(3).seed(7).check().is_ok());
    }

    #[test]
    fn selection_from_str() {
        assert_eq!("elbow".parse(), Ok(ModelSelection::Elbow));
        assert_eq!("largest".parse(), Ok(ModelSelection::Largest));
        assert!("best".parse::<ModelSelection>().is_err());
        assert_eq!(ModelSelection::Elbow.to_string(), "elbow");
    }
}
