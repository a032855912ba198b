//! Configuration file support for calfbook.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/calfbook/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub herd: HerdConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

/// Defaults and limits applied when recording animals
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HerdConfig {
    /// Vaccines offered in the session's vaccine list
    #[serde(default = "default_vaccines")]
    pub vaccines: Vec<String>,

    #[serde(default = "default_birth_weight")]
    pub default_birth_weight: f64,

    /// Ear tags on the farm are short; longer input is a typo
    #[serde(default = "default_mother_tag_max_len")]
    pub mother_tag_max_len: usize,

    /// Days after birth before a calf without an official id is overdue
    #[serde(default = "default_registration_threshold_days")]
    pub registration_threshold_days: i64,
}

impl Default for HerdConfig {
    fn default() -> Self {
        Self {
            vaccines: default_vaccines(),
            default_birth_weight: default_birth_weight(),
            mother_tag_max_len: default_mother_tag_max_len(),
            registration_threshold_days: default_registration_threshold_days(),
        }
    }
}

/// Logging configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Report output configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Directory for relative report paths
    #[serde(default = "default_report_dir")]
    pub dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            dir: default_report_dir(),
        }
    }
}

// Default value functions
fn default_vaccines() -> Vec<String> {
    vec![
        "rota/corona".into(),
        "IBR".into(),
        "FMD".into(),
        "BVD".into(),
        "vitamin ADE".into(),
    ]
}

fn default_birth_weight() -> f64 {
    25.0
}

fn default_mother_tag_max_len() -> usize {
    4
}

fn default_registration_threshold_days() -> i64 {
    30
}

fn default_log_level() -> String {
    "warn".into()
}

fn default_report_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|base| base.join("calfbook").join("reports"))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        match Self::default_config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            path => {
                tracing::info!("No config file found at {:?}, using defaults", path);
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path, if the platform has a config dir
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|base| base.join("calfbook").join("config.toml"))
    }

    /// Reject values no herd could use
    pub fn validate(&self) -> Result<()> {
        if self.herd.mother_tag_max_len == 0 {
            return Err(Error::Config("mother_tag_max_len must be at least 1".into()));
        }
        if self.herd.registration_threshold_days < 0 {
            return Err(Error::Config(
                "registration_threshold_days must not be negative".into(),
            ));
        }
        let weight = self.herd.default_birth_weight;
        if !weight.is_finite() || weight < 0.0 {
            return Err(Error::Config(format!(
                "default_birth_weight must be a non-negative number, got {}",
                weight
            )));
        }
        Ok(())
    }

    /// Resolve a report path against the configured report directory
    pub fn report_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.report.dir.join(path)
        }
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.herd.vaccines.len(), 5);
        assert_eq!(config.herd.default_birth_weight, 25.0);
        assert_eq!(config.herd.mother_tag_max_len, 4);
        assert_eq!(config.herd.registration_threshold_days, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[herd]
registration_threshold_days = 45

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.herd.registration_threshold_days, 45);
        assert_eq!(config.herd.mother_tag_max_len, 4); // default
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_save_and_load_from() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.herd.vaccines.push("clostridial".into());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.herd.vaccines.last().unwrap(), "clostridial");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[herd]\nmother_tag_max_len = 0\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_report_path_resolution() {
        let mut config = Config::default();
        config.report.dir = PathBuf::from("/srv/farm/reports");

        assert_eq!(
            config.report_path(Path::new("herd.csv")),
            PathBuf::from("/srv/farm/reports/herd.csv")
        );
        assert_eq!(
            config.report_path(Path::new("/tmp/herd.csv")),
            PathBuf::from("/tmp/herd.csv")
        );
    }
}
