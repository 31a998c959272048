use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Knobs for the editor and analyser.
///
/// Every field has a default, so a JSON config only needs to name what it overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Name of the worksheet holding the trust table (matched case-insensitively).
    pub sheet_name: String,
    /// Differences with `|d| <= diff_tolerance` are colored as passing.
    pub diff_tolerance: f64,
    pub histogram: HistogramConfig,
    /// Directory (inside the input directory) receiving per-workbook histogram folders.
    pub stats_dir: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sheet_name: "Trust".to_string(),
            diff_tolerance: 0.5,
            histogram: HistogramConfig::default(),
            stats_dir: "stats".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistogramConfig {
    pub min: f64,
    pub max: f64,
    pub bins: usize,
    /// Image size in pixels.
    pub width: u32,
    pub height: u32,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            min: -2.0,
            max: 2.0,
            bins: 8,
            width: 1000,
            height: 400,
        }
    }
}

impl HistogramConfig {
    pub fn bin_width(&self) -> f64 {
        (self.max - self.min) / self.bins as f64
    }
}

impl AnalysisConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sheet_name.trim().is_empty() {
            return Err(ConfigError::Invalid("sheet_name must not be empty".into()));
        }
        if self.stats_dir.trim().is_empty() {
            return Err(ConfigError::Invalid("stats_dir must not be empty".into()));
        }
        if !self.diff_tolerance.is_finite() || self.diff_tolerance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "diff_tolerance must be a non-negative number, got {}",
                self.diff_tolerance
            )));
        }
        let h = &self.histogram;
        if !(h.min.is_finite() && h.max.is_finite() && h.min < h.max) {
            return Err(ConfigError::Invalid(format!(
                "histogram range [{}, {}] is empty",
                h.min, h.max
            )));
        }
        if h.bins == 0 {
            return Err(ConfigError::Invalid("histogram.bins must be at least 1".into()));
        }
        if h.width == 0 || h.height == 0 {
            return Err(ConfigError::Invalid("histogram image size must be non-zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{ "diff_tolerance": 0.25, "histogram": { "bins": 4 } }"#)
                .unwrap();
        assert_eq!(config.diff_tolerance, 0.25);
        assert_eq!(config.histogram.bins, 4);
        assert_eq!(config.histogram.min, -2.0);
        assert_eq!(config.sheet_name, "Trust");
        config.validate().unwrap();
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<AnalysisConfig>(r#"{ "tolerance": 1 }"#).is_err());
    }

    #[test]
    fn invalid_ranges_fail_validation() {
        let mut config = AnalysisConfig::default();
        config.histogram.max = config.histogram.min;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AnalysisConfig::default();
        config.diff_tolerance = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_bins_are_half_wide() {
        assert_eq!(HistogramConfig::default().bin_width(), 0.5);
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "sheet_name": "trust" }"#).unwrap();
        assert_eq!(AnalysisConfig::from_json_file(&path).unwrap().sheet_name, "trust");

        let missing = dir.path().join("nope.json");
        assert!(matches!(
            AnalysisConfig::from_json_file(missing),
            Err(ConfigError::Io { .. })
        ));
    }
}
