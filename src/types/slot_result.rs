//! The per-slot forecast record and its JSON representation.

use crate::types::levels::PollutantLevels;
use crate::types::pollutant::Pollutant;
use crate::types::reading::MISSING_MARKER;
use crate::types::slot::Slot;
use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Date format used in forecast output.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The forecast for one slot of one forecast day.
///
/// Serializes to a flat JSON object holding the nine pollutant keys (a number,
/// or `"NA"` when there was no data), followed by `date` and `slot`:
///
/// ```
/// use aqi_slotcast::{Pollutant, PollutantLevels, Slot, SlotResult};
/// use chrono::NaiveDate;
///
/// let result = SlotResult {
///     date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
///     slot: Slot::new(0, 3),
///     levels: PollutantLevels::new().with(Pollutant::Pm25, 100),
/// };
/// let json = serde_json::to_value(&result).unwrap();
/// assert_eq!(json["PM2.5"], 100);
/// assert_eq!(json["SO2"], "NA");
/// assert_eq!(json["date"], "2025-01-06");
/// assert_eq!(json["slot"], "00:00-03:00");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotResult {
    pub date: NaiveDate,
    pub slot: Slot,
    pub levels: PollutantLevels,
}

impl SlotResult {
    pub fn date_label(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

impl Serialize for SlotResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Pollutant::ALL.len() + 2))?;
        for (pollutant, value) in self.levels.iter() {
            match value {
                Some(v) => map.serialize_entry(pollutant.code(), &v)?,
                None => map.serialize_entry(pollutant.code(), MISSING_MARKER)?,
            }
        }
        map.serialize_entry("date", &self.date_label())?;
        map.serialize_entry("slot", &self.slot.label())?;
        map.end()
    }
}
