//! This module provides the main entry point: a configured forecaster that
//! reads from an archive, forecasts a fixed list of locations and saves one
//! prediction file per location.

use crate::archive::reader::{Archive, HttpArchive};
use crate::config::ForecastConfig;
use crate::error::ForecastError;
use crate::forecast::engine::{ForecastEngine, ForecastSettings};
use crate::forecast::runner::{ForecastRunner, RunSummary, DEFAULT_CONCURRENCY};
use crate::forecast::writer::PredictionWriter;
use crate::types::slot_result::SlotResult;
use bon::bon;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Ties an archive, the forecast engine and the prediction writer together.
///
/// Build one from a [`ForecastConfig`] with [`Forecaster::from_config`], or
/// assemble it around any [`Archive`] with [`Forecaster::builder`].
///
/// # Examples
///
/// ```rust
/// # use aqi_slotcast::{Forecaster, ForecastError, MemoryArchive, Pollutant, Reading};
/// # use chrono::{NaiveDate, TimeZone, Utc};
/// # #[tokio::main]
/// # async fn main() -> Result<(), ForecastError> {
/// let mut archive = MemoryArchive::new();
/// let reading = Reading::from_values([(Pollutant::Pm25, 42.0)]);
/// for day in 3..=5 {
///     let date = NaiveDate::from_ymd_opt(2025, 1, day).unwrap();
///     archive.fill_hours("Powai", date, 0..24, &reading);
/// }
///
/// let forecaster = Forecaster::builder()
///     .archive(archive)
///     .locations(vec!["Powai".to_string()])
///     .reference(Utc.with_ymd_and_hms(2025, 1, 6, 4, 0, 0).unwrap())
///     .build()?;
///
/// let results = forecaster.forecast().location("Powai").call().await?;
/// assert_eq!(results.len(), 48);
/// assert_eq!(results[0].levels.get(Pollutant::Pm25), Some(42));
/// # Ok(())
/// # }
/// ```
pub struct Forecaster<A = HttpArchive> {
    engine: ForecastEngine<A>,
    writer: PredictionWriter,
    locations: Vec<String>,
    concurrency: usize,
    reference: Option<DateTime<Utc>>,
}

impl Forecaster<HttpArchive> {
    /// Creates a forecaster reading from the HTTP archive named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::InvalidSettings`] or [`ForecastError::SlotTable`]
    /// for an invalid configuration, and [`ForecastError::Archive`] if the
    /// HTTP client cannot be built.
    pub fn from_config(config: &ForecastConfig) -> Result<Self, ForecastError> {
        config.validate()?;
        Self::builder()
            .archive(config.http_archive()?)
            .settings(config.settings()?)
            .locations(config.locations.clone())
            .output_dir(config.output_dir.clone())
            .concurrency(config.forecast.concurrency)
            .maybe_reference(config.reference)
            .build()
    }
}

#[bon]
impl<A: Archive> Forecaster<A> {
    /// Assembles a forecaster around `archive`.
    ///
    /// # Arguments
    ///
    /// * `.archive(A)`: **Required.** Source of hourly readings.
    /// * `.locations(Vec<String>)`: **Required.** Locations forecast by [`Forecaster::run`], in output order.
    /// * `.settings(ForecastSettings)`: Optional. Defaults to [`ForecastSettings::default`].
    /// * `.output_dir(PathBuf)`: Optional. Defaults to `prediction`.
    /// * `.concurrency(usize)`: Optional. Locations forecast at once. Defaults to `4`.
    /// * `.reference(DateTime<Utc>)`: Optional. Fixed reference instant; the current time when absent.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::InvalidSettings`] if the settings are rejected
    /// by [`ForecastEngine::new`].
    #[builder]
    pub fn new(
        archive: A,
        locations: Vec<String>,
        settings: Option<ForecastSettings>,
        #[builder(into)] output_dir: Option<PathBuf>,
        concurrency: Option<usize>,
        reference: Option<DateTime<Utc>>,
    ) -> Result<Self, ForecastError> {
        let engine = ForecastEngine::new(archive, settings.unwrap_or_default())?;
        let output_dir = output_dir.unwrap_or_else(|| PathBuf::from("prediction"));
        Ok(Self {
            engine,
            writer: PredictionWriter::new(output_dir),
            locations,
            concurrency: concurrency.unwrap_or(DEFAULT_CONCURRENCY),
            reference,
        })
    }

    pub fn engine(&self) -> &ForecastEngine<A> {
        &self.engine
    }

    pub fn writer(&self) -> &PredictionWriter {
        &self.writer
    }

    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    fn resolve_reference(&self, reference: Option<DateTime<Utc>>) -> DateTime<Utc> {
        reference.or(self.reference).unwrap_or_else(Utc::now)
    }

    /// Forecasts a single location without writing anything.
    ///
    /// # Arguments
    ///
    /// * `.location(&str)`: **Required.** The location to forecast. It does not need to be in the configured list.
    /// * `.reference(DateTime<Utc>)`: Optional. Overrides the configured reference instant.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::Config`] if the location name is unusable or the
    /// horizon leaves the supported calendar range.
    #[builder]
    pub async fn forecast(
        &self,
        location: &str,
        reference: Option<DateTime<Utc>>,
    ) -> Result<Vec<SlotResult>, ForecastError> {
        let reference = self.resolve_reference(reference);
        self.engine.forecast(location, reference).await
    }

    /// Forecasts every configured location and saves each forecast as
    /// `{output_dir}/{location}.json`.
    ///
    /// A location that fails is reported in the returned [`RunSummary`] and
    /// does not affect the others. A location without archive data is still
    /// written, with every estimate "NA".
    ///
    /// # Arguments
    ///
    /// * `.reference(DateTime<Utc>)`: Optional. Overrides the configured reference instant.
    #[builder]
    pub async fn run(&self, reference: Option<DateTime<Utc>>) -> RunSummary {
        let reference = self.resolve_reference(reference);
        ForecastRunner::new(&self.engine, &self.writer, self.concurrency)
            .run(&self.locations, reference)
            .await
    }
}
