//! Generator configuration.
//!
//! Defines the run parameters: which years to generate, in which zone, and
//! where the partition files go.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result, Zone, DEFAULT_VALUE_STEP};

/// Configuration for a generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// First calendar year to generate.
    /// Default: 2023
    pub start_year: i32,

    /// Number of whole years to generate (at least 1).
    /// Default: 1
    pub span_years: u32,

    /// IANA zone name, `UTC`, or `None` for host local time.
    /// Default: America/Los_Angeles
    pub timezone: Option<String>,

    /// Directory receiving the partition files.
    /// Default: current directory
    pub output_dir: PathBuf,

    /// Increment of the measured value per tick.
    /// Default: 100
    pub value_step: f64,

    /// Extra attempts for a failed row before it is dropped.
    /// Default: 0 (no retry)
    pub insert_retries: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            start_year: 2023,
            span_years: 1,
            timezone: Some("America/Los_Angeles".to_string()),
            output_dir: PathBuf::from("."),
            value_step: DEFAULT_VALUE_STEP,
            insert_retries: 0,
        }
    }
}

impl GeneratorConfig {
    /// Load a config from a JSON file; missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(|err| {
            Error::InvalidConfig(format!("{}: {err}", path.display()))
        })
    }

    /// Resolve the configured zone.
    pub fn zone(&self) -> Result<Zone> {
        Zone::parse(self.timezone.as_deref())
    }

    /// Check parameter ranges and that the zone is known.
    pub fn validate(&self) -> Result<()> {
        if self.span_years == 0 {
            return Err(Error::InvalidConfig(
                "span_years must be at least 1".to_string(),
            ));
        }
        if !self.value_step.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "value_step must be finite, got {}",
                self.value_step
            )));
        }
        if !(0..=9999).contains(&self.start_year) {
            return Err(Error::InvalidConfig(format!(
                "start_year {} out of range",
                self.start_year
            )));
        }
        // Partition names carry a four-digit year.
        if i64::from(self.start_year) + i64::from(self.span_years) > 10_000 {
            return Err(Error::InvalidConfig(format!(
                "{} years from {} run past year 9999",
                self.span_years, self.start_year
            )));
        }
        self.zone()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generator_config_default() {
        let config = GeneratorConfig::default();
        assert_eq!(config.start_year, 2023);
        assert_eq!(config.span_years, 1);
        assert_eq!(config.timezone.as_deref(), Some("America/Los_Angeles"));
        assert_eq!(config.value_step, 100.0);
        assert_eq!(config.insert_retries, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: GeneratorConfig =
            serde_json::from_str(r#"{"start_year": 2020, "timezone": "Europe/Budapest"}"#).unwrap();
        assert_eq!(config.start_year, 2020);
        assert_eq!(config.span_years, 1);
        assert_eq!(config.zone().unwrap(), Zone::Named(chrono_tz::Europe::Budapest));
    }

    #[test]
    fn test_null_timezone_is_local() {
        let config: GeneratorConfig = serde_json::from_str(r#"{"timezone": null}"#).unwrap();
        assert_eq!(config.zone().unwrap(), Zone::Local);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = GeneratorConfig::default();
        config.span_years = 0;
        assert!(config.validate().is_err());

        let mut config = GeneratorConfig::default();
        config.value_step = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = GeneratorConfig::default();
        config.timezone = Some("Nowhere/Special".to_string());
        assert!(matches!(config.validate(), Err(Error::Calendar(_))));
    }

    #[test]
    fn test_validate_rejects_span_past_year_9999() {
        let mut config = GeneratorConfig::default();
        config.start_year = 9998;
        config.span_years = 3;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        config.span_years = 2;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gen.json");
        std::fs::write(&path, r#"{"span_years": 2, "output_dir": "/tmp/parts"}"#).unwrap();

        let config = GeneratorConfig::load(&path).unwrap();
        assert_eq!(config.span_years, 2);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/parts"));

        std::fs::write(&path, b"{ not json").unwrap();
        assert!(matches!(
            GeneratorConfig::load(&path),
            Err(Error::InvalidConfig(_))
        ));
    }
}
