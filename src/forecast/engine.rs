//! The Recursive Forecast Builder.
//!
//! Walks the forecast horizon one day at a time, slot by slot, and threads the
//! list of Representative Day Values from each finished day into every later
//! day's aggregation. Days depend on each other, so a single location is always
//! computed sequentially.

use crate::archive::reader::Archive;
use crate::error::{ForecastError, ForecastStage};
use crate::forecast::aggregator::{
    SlotAggregator, SlotQuery, DEFAULT_HISTORY_DAYS, DEFAULT_REPRESENTATIVE_WINDOW,
};
use crate::forecast::variation::{Variation, VariationMode, DEFAULT_VARIATION_FRACTION};
use crate::types::representative::{RepresentativeDayValue, RepresentativePolicy};
use crate::types::slot::SlotTable;
use crate::types::slot_result::SlotResult;
use bon::Builder;
use chrono::{DateTime, Days, FixedOffset, NaiveDate, Utc};
use log::info;

/// Number of consecutive days forecast per location.
pub const DEFAULT_HORIZON_DAYS: u32 = 6;

/// First day offset (0-based) whose estimates receive variation.
pub const DEFAULT_VARIATION_START_DAY: u32 = 3;

/// UTC offset of the monitored region (+05:30), in minutes.
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 330;

/// Longest accepted forecast horizon, in days.
pub const MAX_HORIZON_DAYS: u32 = 31;

/// Longest accepted history window, in days.
pub const MAX_HISTORY_DAYS: u32 = 31;

/// Tunables of the forecast engine. The defaults reproduce the standard
/// six-day, eight-slot forecast.
///
/// # Examples
///
/// ```
/// use aqi_slotcast::{ForecastSettings, RepresentativePolicy, VariationMode};
///
/// let settings = ForecastSettings::builder()
///     .variation(VariationMode::Seeded(42))
///     .representative(RepresentativePolicy::DayMean)
///     .build();
/// assert_eq!(settings.horizon_days, 6);
/// assert_eq!(settings.slots.len(), 8);
/// ```
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct ForecastSettings {
    #[builder(default = DEFAULT_HORIZON_DAYS)]
    pub horizon_days: u32,
    #[builder(default = DEFAULT_VARIATION_START_DAY)]
    pub variation_start_day: u32,
    #[builder(default = DEFAULT_HISTORY_DAYS)]
    pub history_days: u32,
    #[builder(default = DEFAULT_REPRESENTATIVE_WINDOW)]
    pub representative_window: usize,
    #[builder(default = DEFAULT_VARIATION_FRACTION)]
    pub variation_fraction: f64,
    #[builder(default = DEFAULT_UTC_OFFSET_MINUTES)]
    pub utc_offset_minutes: i32,
    #[builder(default)]
    pub representative: RepresentativePolicy,
    #[builder(default)]
    pub variation: VariationMode,
    #[builder(default)]
    pub slots: SlotTable,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ForecastSettings {
    fn region_offset(&self) -> Result<FixedOffset, ForecastError> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| ForecastError::InvalidSettings {
                field: "utc_offset_minutes",
                message: format!("{} is not a valid UTC offset", self.utc_offset_minutes),
            })
    }

    /// Checks every tunable against its accepted range.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::InvalidSettings`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ForecastError> {
        if !(1..=MAX_HORIZON_DAYS).contains(&self.horizon_days) {
            return Err(ForecastError::InvalidSettings {
                field: "horizon_days",
                message: format!(
                    "{} is outside 1..={}",
                    self.horizon_days, MAX_HORIZON_DAYS
                ),
            });
        }
        if self.history_days > MAX_HISTORY_DAYS {
            return Err(ForecastError::InvalidSettings {
                field: "history_days",
                message: format!(
                    "{} is more than {}",
                    self.history_days, MAX_HISTORY_DAYS
                ),
            });
        }
        if !self.variation_fraction.is_finite() || !(0.0..1.0).contains(&self.variation_fraction)
        {
            return Err(ForecastError::InvalidSettings {
                field: "variation_fraction",
                message: format!("{} is outside [0, 1)", self.variation_fraction),
            });
        }
        self.region_offset().map(|_| ())
    }
}

pub struct ForecastEngine<A> {
    aggregator: SlotAggregator<A>,
    settings: ForecastSettings,
    offset: FixedOffset,
}

impl<A: Archive> ForecastEngine<A> {
    /// Creates an engine reading from `archive`.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::InvalidSettings`] for a horizon or history
    /// window out of range, an out-of-range variation fraction or an invalid
    /// UTC offset.
    pub fn new(archive: A, settings: ForecastSettings) -> Result<Self, ForecastError> {
        settings.validate()?;
        let offset = settings.region_offset()?;
        let aggregator = SlotAggregator::with_windows(
            archive,
            settings.history_days,
            settings.representative_window,
        );
        Ok(Self {
            aggregator,
            settings,
            offset,
        })
    }

    pub fn settings(&self) -> &ForecastSettings {
        &self.settings
    }

    pub fn archive(&self) -> &A {
        self.aggregator.archive()
    }

    /// The run's anchor: local midnight in the region's fixed offset of the
    /// day containing `reference`.
    pub fn reference_day(&self, reference: DateTime<Utc>) -> NaiveDate {
        reference.with_timezone(&self.offset).date_naive()
    }

    /// Forecasts `location` using the variation source configured in the settings.
    pub async fn forecast(
        &self,
        location: &str,
        reference: DateTime<Utc>,
    ) -> Result<Vec<SlotResult>, ForecastError> {
        let mut variation = self
            .settings
            .variation
            .policy(self.settings.variation_fraction);
        self.build_forecast(location, reference, &mut variation)
            .await
    }

    /// Builds the full forecast for one location: `horizon_days` days of
    /// slot results in chronological, slot-ascending order.
    ///
    /// Missing archive data never fails the run; it only yields "no data"
    /// estimates. Errors are configuration problems tied to this location.
    pub async fn build_forecast<V: Variation + ?Sized>(
        &self,
        location: &str,
        reference: DateTime<Utc>,
        variation: &mut V,
    ) -> Result<Vec<SlotResult>, ForecastError> {
        validate_location(location)?;

        let slots = &self.settings.slots;
        let reference_day = self.reference_day(reference);
        let horizon = self.settings.horizon_days;
        info!(
            "Forecasting {} for {} days from {}",
            location, horizon, reference_day
        );

        let mut representatives: Vec<RepresentativeDayValue> = Vec::new();
        let mut results = Vec::with_capacity(horizon as usize * slots.len());

        for day in 0..horizon {
            let date = reference_day
                .checked_add_days(Days::new(u64::from(day)))
                .ok_or_else(|| {
                    ForecastError::config(
                        location,
                        ForecastStage::Calendar,
                        format!("day {} after {} is out of range", day, reference_day),
                    )
                })?;
            let apply_variation = day >= self.settings.variation_start_day;

            let mut day_levels = Vec::with_capacity(slots.len());
            for slot in slots.iter() {
                let query = SlotQuery {
                    location,
                    date,
                    slot,
                    apply_variation,
                };
                let levels = self
                    .aggregator
                    .aggregate(&query, &representatives, variation)
                    .await;
                results.push(SlotResult { date, slot, levels });
                day_levels.push(levels);
            }

            let representative = self
                .settings
                .representative
                .derive(date, &day_levels)
                .ok_or_else(|| {
                    ForecastError::config(location, ForecastStage::SlotTable, "slot table is empty")
                })?;
            representatives.push(representative);
        }

        Ok(results)
    }
}

/// Location names become a path segment of archive URLs and output files.
fn validate_location(location: &str) -> Result<(), ForecastError> {
    let reason = if location.trim().is_empty() {
        Some("name is empty")
    } else if location.contains(['/', '\\']) {
        Some("name contains a path separator")
    } else if location == "." || location == ".." {
        Some("name is a relative path")
    } else if location.chars().any(char::is_control) {
        Some("name contains control characters")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ForecastError::config(
            location,
            ForecastStage::Location,
            reason,
        )),
        None => Ok(()),
    }
}
