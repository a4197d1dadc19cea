//! Representative Day Values: the per-pollutant snapshot a finished forecast
//! day contributes to the aggregation of later days.

use crate::types::levels::PollutantLevels;
use crate::types::pollutant::Pollutant;
use chrono::NaiveDate;
use serde::Deserialize;

/// Snapshot carried forward from a completed forecast day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepresentativeDayValue {
    /// The forecast day this value was derived from.
    pub date: NaiveDate,
    pub levels: PollutantLevels,
}

/// How a completed day is condensed into its [`RepresentativeDayValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepresentativePolicy {
    /// Take the estimates of the day's last slot (21:00-24:00 with the
    /// standard table) as they are.
    #[default]
    LastSlot,
    /// Average each pollutant over every slot of the day that has an
    /// estimate, rounded half away from zero. Deviates from the historical
    /// output and has to be selected explicitly.
    DayMean,
}

impl RepresentativePolicy {
    /// Derives the representative value for `date` from the day's slot
    /// estimates in slot order. Returns `None` for a day without slots.
    pub fn derive(
        &self,
        date: NaiveDate,
        day: &[PollutantLevels],
    ) -> Option<RepresentativeDayValue> {
        let levels = match self {
            RepresentativePolicy::LastSlot => *day.last()?,
            RepresentativePolicy::DayMean => {
                if day.is_empty() {
                    return None;
                }
                let mut levels = PollutantLevels::new();
                for pollutant in Pollutant::ALL {
                    let values: Vec<i64> = day.iter().filter_map(|l| l.get(pollutant)).collect();
                    if !values.is_empty() {
                        let mean = values.iter().sum::<i64>() as f64 / values.len() as f64;
                        levels.set(pollutant, Some(mean.round() as i64));
                    }
                }
                levels
            }
        };
        Some(RepresentativeDayValue { date, levels })
    }
}
