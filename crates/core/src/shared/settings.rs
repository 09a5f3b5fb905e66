use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{
    DEFAULT_REGIONS, INPUT_TOPIC, NODE_NAME, OUTPUT_QUEUE_SIZE, OUTPUT_TOPIC,
};
use crate::shared::region::Region;
use crate::vision::domain::blob_detector::DetectorConfig;
use crate::vision::domain::thresholder::Thresholder;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid settings: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewSettings {
    pub draw_regions: bool,
    pub draw_guide_lines: bool,
}

/// Node configuration, read from JSON. Missing fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub node_name: String,
    pub input_topic: String,
    pub output_topic: String,
    /// Depth of the output topic.
    pub queue_size: usize,
    pub threshold: Thresholder,
    pub regions: Vec<Region>,
    pub detector: DetectorConfig,
    pub preview: PreviewSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            node_name: NODE_NAME.to_string(),
            input_topic: INPUT_TOPIC.to_string(),
            output_topic: OUTPUT_TOPIC.to_string(),
            queue_size: OUTPUT_QUEUE_SIZE,
            threshold: Thresholder::default(),
            regions: DEFAULT_REGIONS.to_vec(),
            detector: DetectorConfig::default(),
            preview: PreviewSettings::default(),
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("laser-points").join("settings.json"))
    }

    /// Settings from the user config directory, or defaults when the file is
    /// absent or unusable.
    pub fn load() -> Self {
        let Some(path) = Self::config_path().filter(|p| p.exists()) else {
            return Self::default();
        };
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{e}; using default settings");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let io_error = |source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(io_error)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.regions.is_empty() {
            return Err(SettingsError::Invalid("at least one region is required".into()));
        }
        for region in &self.regions {
            region
                .validate()
                .map_err(|e| SettingsError::Invalid(e.to_string()))?;
        }
        if self.queue_size == 0 {
            return Err(SettingsError::Invalid("queue_size must be positive".into()));
        }

        let detector = &self.detector;
        if detector.threshold_step <= 0.0 {
            return Err(SettingsError::Invalid(format!(
                "threshold_step must be positive, got {}",
                detector.threshold_step
            )));
        }
        if detector.min_threshold >= detector.max_threshold {
            return Err(SettingsError::Invalid(format!(
                "min_threshold {} must be below max_threshold {}",
                detector.min_threshold, detector.max_threshold
            )));
        }
        if detector.min_repeatability == 0 {
            return Err(SettingsError::Invalid("min_repeatability must be at least 1".into()));
        }
        Ok(())
    }
}
