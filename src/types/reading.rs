//! Parsing of a single hourly archive record.

use crate::types::pollutant::{Pollutant, POLLUTANT_COUNT};
use serde_json::{Map, Value};

/// Literal used by the archive (and by forecast output) for a missing value.
pub const MISSING_MARKER: &str = "NA";

/// The value of one pollutant in one hourly reading.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ReadingValue {
    /// A finite measured value.
    Value(f64),
    /// The archive reported `"NA"`, `null`, something unparsable, or omitted the key.
    #[default]
    Missing,
}

impl ReadingValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ReadingValue::Value(v) => Some(*v),
            ReadingValue::Missing => None,
        }
    }

    fn from_json(value: &Value) -> Self {
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) if s == MISSING_MARKER => None,
            // Some loggers write numbers as strings.
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match parsed {
            Some(v) if v.is_finite() => ReadingValue::Value(v),
            _ => ReadingValue::Missing,
        }
    }
}

/// All pollutant values of one location at one hour, as stored in the archive.
///
/// Readings are immutable once parsed; the forecast engine only ever reads them.
///
/// # Examples
///
/// ```
/// use aqi_slotcast::{Pollutant, Reading};
///
/// let reading = Reading::from_json(r#"{"PM2.5": 81.0, "SO2": "NA", "CO": "1.2"}"#).unwrap();
/// assert_eq!(reading.value(Pollutant::Pm25), Some(81.0));
/// assert_eq!(reading.value(Pollutant::So2), None);
/// assert_eq!(reading.value(Pollutant::Co), Some(1.2));
/// assert_eq!(reading.value(Pollutant::Ozone), None);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reading {
    values: [ReadingValue; POLLUTANT_COUNT],
}

impl Reading {
    /// Parses an archive payload. The body must be a JSON object; unknown keys are ignored.
    pub fn from_json(body: &str) -> Result<Reading, serde_json::Error> {
        let object: Map<String, Value> = serde_json::from_str(body)?;
        Ok(Reading::from_object(&object))
    }

    pub fn from_object(object: &Map<String, Value>) -> Reading {
        let mut reading = Reading::default();
        for pollutant in Pollutant::ALL {
            if let Some(value) = object.get(pollutant.code()) {
                reading.values[pollutant.index()] = ReadingValue::from_json(value);
            }
        }
        reading
    }

    /// Builds a reading from explicit values; pollutants not listed are missing.
    pub fn from_values<I>(values: I) -> Reading
    where
        I: IntoIterator<Item = (Pollutant, f64)>,
    {
        let mut reading = Reading::default();
        for (pollutant, value) in values {
            reading.set(pollutant, ReadingValue::Value(value));
        }
        reading
    }

    pub fn set(&mut self, pollutant: Pollutant, value: ReadingValue) {
        self.values[pollutant.index()] = value;
    }

    pub fn get(&self, pollutant: Pollutant) -> ReadingValue {
        self.values[pollutant.index()]
    }

    /// The numeric value of `pollutant`, or `None` when it is missing.
    pub fn value(&self, pollutant: Pollutant) -> Option<f64> {
        self.get(pollutant).as_f64()
    }

    /// Iterates over the pollutants that carry a value, in output order.
    pub fn present(&self) -> impl Iterator<Item = (Pollutant, f64)> + '_ {
        Pollutant::ALL
            .into_iter()
            .filter_map(move |p| self.value(p).map(|v| (p, v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_payload() {
        let body = r#"{
            "PM2.5": 55, "PM10": 102.5, "NO": 8.1, "NO2": 31, "NOx": 22.4,
            "NH3": 4, "SO2": 12, "CO": 0.8, "Ozone": 19
        }"#;
        let reading = Reading::from_json(body).unwrap();
        assert_eq!(reading.present().count(), 9);
        assert_eq!(reading.value(Pollutant::Pm10), Some(102.5));
        assert_eq!(reading.value(Pollutant::Co), Some(0.8));
    }

    #[test]
    fn test_missing_markers() {
        let body = r#"{"PM2.5": "NA", "PM10": null, "NO": "n/a", "NO2": [1], "Ozone": 0}"#;
        let reading = Reading::from_json(body).unwrap();
        assert_eq!(reading.get(Pollutant::Pm25), ReadingValue::Missing);
        assert_eq!(reading.get(Pollutant::Pm10), ReadingValue::Missing);
        assert_eq!(reading.get(Pollutant::No), ReadingValue::Missing);
        assert_eq!(reading.get(Pollutant::No2), ReadingValue::Missing);
        assert_eq!(reading.get(Pollutant::Nh3), ReadingValue::Missing);
        // Zero is a real measurement.
        assert_eq!(reading.get(Pollutant::Ozone), ReadingValue::Value(0.0));
    }

    #[test]
    fn test_numeric_strings_are_samples() {
        let reading = Reading::from_json(r#"{"SO2": " 14.5 ", "CO": "NaN"}"#).unwrap();
        assert_eq!(reading.value(Pollutant::So2), Some(14.5));
        assert_eq!(reading.value(Pollutant::Co), None);
    }

    #[test]
    fn test_non_object_payload_is_rejected() {
        assert!(Reading::from_json("[1, 2, 3]").is_err());
        assert!(Reading::from_json("<html>404</html>").is_err());
        assert!(Reading::from_json("").is_err());
    }

    #[test]
    fn test_from_values_leaves_others_missing() {
        let reading = Reading::from_values([(Pollutant::No2, 40.0)]);
        let present: Vec<_> = reading.present().collect();
        assert_eq!(present, vec![(Pollutant::No2, 40.0)]);
    }
}
