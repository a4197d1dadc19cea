//! Run configuration, loaded from a TOML file.
//!
//! ```toml
//! archive_base = "https://example.org/aqi/output"
//! output_dir = "prediction"
//! locations = ["Colaba_Mumbai_-_MPCB", "Kurla_Mumbai_-_MPCB"]
//! # reference = "2025-01-06T04:00:00Z"   # optional, defaults to now
//!
//! [archive]
//! timeout_secs = 10
//! retries = 1
//!
//! [forecast]
//! variation = "seeded"
//! seed = 42
//! ```

use crate::archive::reader::HttpArchive;
use crate::error::ForecastError;
use crate::forecast::aggregator::{DEFAULT_HISTORY_DAYS, DEFAULT_REPRESENTATIVE_WINDOW};
use crate::forecast::engine::{
    ForecastSettings, DEFAULT_HORIZON_DAYS, DEFAULT_UTC_OFFSET_MINUTES,
    DEFAULT_VARIATION_START_DAY,
};
use crate::forecast::runner::DEFAULT_CONCURRENCY;
use crate::forecast::variation::{VariationMode, DEFAULT_VARIATION_FRACTION};
use crate::types::representative::RepresentativePolicy;
use crate::types::slot::SlotTable;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForecastConfig {
    /// Root URL of the hourly archive.
    pub archive_base: String,
    pub locations: Vec<String>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Fixed reference instant (RFC 3339, quoted); the wall clock when absent.
    #[serde(default)]
    pub reference: Option<DateTime<Utc>>,
    #[serde(default)]
    pub archive: ArchiveSection,
    #[serde(default)]
    pub forecast: ForecastSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveSection {
    pub timeout_secs: u64,
    pub retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for ArchiveSection {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            retries: 0,
            retry_backoff_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariationKind {
    #[default]
    Random,
    Seeded,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastSection {
    pub horizon_days: u32,
    pub variation_start_day: u32,
    pub history_days: u32,
    pub representative_window: usize,
    pub variation_fraction: f64,
    pub utc_offset_minutes: i32,
    pub representative: RepresentativePolicy,
    pub variation: VariationKind,
    pub seed: Option<u64>,
    pub concurrency: usize,
    /// `[start, end]` hour pairs; the standard eight slots when absent.
    pub slots: Option<Vec<[u32; 2]>>,
}

impl Default for ForecastSection {
    fn default() -> Self {
        Self {
            horizon_days: DEFAULT_HORIZON_DAYS,
            variation_start_day: DEFAULT_VARIATION_START_DAY,
            history_days: DEFAULT_HISTORY_DAYS,
            representative_window: DEFAULT_REPRESENTATIVE_WINDOW,
            variation_fraction: DEFAULT_VARIATION_FRACTION,
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
            representative: RepresentativePolicy::default(),
            variation: VariationKind::default(),
            seed: None,
            concurrency: DEFAULT_CONCURRENCY,
            slots: None,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("prediction")
}

impl ForecastConfig {
    /// Reads and validates the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ForecastError> {
        let path = path.as_ref();
        let toml = fs::read_to_string(path)
            .map_err(|e| ForecastError::ConfigRead(path.to_path_buf(), e))?;
        let config: ForecastConfig = toml::from_str(&toml)
            .map_err(|e| ForecastError::ConfigParse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks everything that can be checked without touching the network.
    pub fn validate(&self) -> Result<(), ForecastError> {
        if self.archive_base.trim().is_empty() {
            return Err(invalid("archive_base", "must not be empty"));
        }
        if self.locations.is_empty() {
            return Err(invalid("locations", "at least one location is required"));
        }
        if self.forecast.concurrency == 0 {
            return Err(invalid("concurrency", "must be at least 1"));
        }
        if self.archive.timeout_secs == 0 {
            return Err(invalid("timeout_secs", "must be at least 1"));
        }
        let mut seen = HashSet::new();
        if let Some(duplicate) = self.locations.iter().find(|l| !seen.insert(l.as_str())) {
            return Err(ForecastError::InvalidSettings {
                field: "locations",
                message: format!("'{}' is listed more than once", duplicate),
            });
        }
        self.settings()?.validate()
    }

    pub fn variation_mode(&self) -> Result<VariationMode, ForecastError> {
        match (self.forecast.variation, self.forecast.seed) {
            (VariationKind::Random, _) => Ok(VariationMode::Random),
            (VariationKind::Disabled, _) => Ok(VariationMode::Disabled),
            (VariationKind::Seeded, Some(seed)) => Ok(VariationMode::Seeded(seed)),
            (VariationKind::Seeded, None) => {
                Err(invalid("seed", "required when variation = \"seeded\""))
            }
        }
    }

    pub fn settings(&self) -> Result<ForecastSettings, ForecastError> {
        let forecast = &self.forecast;
        let slots = match &forecast.slots {
            Some(pairs) => SlotTable::from_pairs(pairs)?,
            None => SlotTable::default(),
        };
        Ok(ForecastSettings::builder()
            .horizon_days(forecast.horizon_days)
            .variation_start_day(forecast.variation_start_day)
            .history_days(forecast.history_days)
            .representative_window(forecast.representative_window)
            .variation_fraction(forecast.variation_fraction)
            .utc_offset_minutes(forecast.utc_offset_minutes)
            .representative(forecast.representative)
            .variation(self.variation_mode()?)
            .slots(slots)
            .build())
    }

    pub fn http_archive(&self) -> Result<HttpArchive, ForecastError> {
        Ok(HttpArchive::builder()
            .base_url(self.archive_base.clone())
            .timeout(Duration::from_secs(self.archive.timeout_secs))
            .retries(self.archive.retries)
            .retry_backoff(Duration::from_millis(self.archive.retry_backoff_ms))
            .build()?)
    }
}

fn invalid(field: &'static str, message: &str) -> ForecastError {
    ForecastError::InvalidSettings {
        field,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::slot::SlotTableError;
    use chrono::TimeZone;

    const MINIMAL: &str = r#"
        archive_base = "https://archive.test/output"
        locations = ["Colaba_Mumbai_-_MPCB"]
    "#;

    fn parse(toml: &str) -> ForecastConfig {
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse(MINIMAL);
        config.validate().unwrap();

        assert_eq!(config.output_dir, PathBuf::from("prediction"));
        assert_eq!(config.reference, None);
        assert_eq!(config.archive, ArchiveSection::default());
        assert_eq!(config.forecast, ForecastSection::default());
        assert_eq!(config.settings().unwrap(), ForecastSettings::default());
    }

    #[test]
    fn test_full_config() {
        let config = parse(
            r#"
            archive_base = "https://archive.test/output/"
            locations = ["A", "B"]
            output_dir = "out"
            reference = "2025-01-06T04:00:00Z"

            [archive]
            timeout_secs = 3
            retries = 2
            retry_backoff_ms = 100

            [forecast]
            horizon_days = 4
            representative = "day_mean"
            variation = "seeded"
            seed = 42
            concurrency = 8
            "#,
        );
        config.validate().unwrap();

        assert_eq!(
            config.reference,
            Some(Utc.with_ymd_and_hms(2025, 1, 6, 4, 0, 0).unwrap())
        );
        let settings = config.settings().unwrap();
        assert_eq!(settings.horizon_days, 4);
        assert_eq!(settings.representative, RepresentativePolicy::DayMean);
        assert_eq!(settings.variation, VariationMode::Seeded(42));
        assert_eq!(config.forecast.concurrency, 8);
        assert_eq!(
            config.http_archive().unwrap().base_url(),
            "https://archive.test/output"
        );
    }

    #[test]
    fn test_seeded_variation_requires_seed() {
        let config = parse(&format!("{}\n[forecast]\nvariation = \"seeded\"\n", MINIMAL));
        assert!(matches!(
            config.validate(),
            Err(ForecastError::InvalidSettings { field: "seed", .. })
        ));
    }

    #[test]
    fn test_malformed_slot_table_is_rejected() {
        let config = parse(&format!("{}\n[forecast]\nslots = [[0, 3], [6, 9]]\n", MINIMAL));
        assert!(matches!(
            config.validate(),
            Err(ForecastError::SlotTable(SlotTableError::Discontinuous { .. }))
        ));

        let empty = parse(&format!("{}\n[forecast]\nslots = []\n", MINIMAL));
        assert!(matches!(
            empty.validate(),
            Err(ForecastError::SlotTable(SlotTableError::Empty))
        ));
    }

    #[test]
    fn test_rejects_empty_locations_and_zero_concurrency() {
        let no_locations = parse(
            r#"
            archive_base = "https://archive.test/output"
            locations = []
            "#,
        );
        assert!(no_locations.validate().is_err());

        let zero = parse(&format!("{}\n[forecast]\nconcurrency = 0\n", MINIMAL));
        assert!(matches!(
            zero.validate(),
            Err(ForecastError::InvalidSettings {
                field: "concurrency",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_out_of_range_windows() {
        let horizon = parse(&format!("{}\n[forecast]\nhorizon_days = 4294967295\n", MINIMAL));
        assert!(matches!(
            horizon.validate(),
            Err(ForecastError::InvalidSettings {
                field: "horizon_days",
                ..
            })
        ));

        let history = parse(&format!("{}\n[forecast]\nhistory_days = 100000\n", MINIMAL));
        assert!(matches!(
            history.validate(),
            Err(ForecastError::InvalidSettings {
                field: "history_days",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_duplicate_locations() {
        let config = parse(
            r#"
            archive_base = "https://archive.test/output"
            locations = ["Kurla", "Powai", "Kurla"]
            "#,
        );
        assert!(matches!(
            config.validate(),
            Err(ForecastError::InvalidSettings {
                field: "locations",
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let result: Result<ForecastConfig, _> =
            toml::from_str(&format!("{}\nlocation = \"typo\"\n", MINIMAL));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_reports_path() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            ForecastConfig::load(&missing),
            Err(ForecastError::ConfigRead(path, _)) if path == missing
        ));

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "archive_base = ")?;
        assert!(matches!(
            ForecastConfig::load(&broken),
            Err(ForecastError::ConfigParse(..))
        ));

        let good = dir.path().join("forecast.toml");
        std::fs::write(&good, MINIMAL)?;
        assert_eq!(ForecastConfig::load(&good)?.locations, ["Colaba_Mumbai_-_MPCB"]);
        Ok(())
    }
}
