use crate::archive::reader::Archive;
use crate::types::reading::Reading;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// An [`Archive`] held entirely in memory.
///
/// Used to replay recorded data offline and to drive the engine
/// deterministically in tests and benchmarks. Counts every read it serves.
///
/// # Examples
///
/// ```
/// use aqi_slotcast::{Archive, MemoryArchive, Pollutant, Reading};
/// use chrono::NaiveDate;
///
/// # #[tokio::main]
/// # async fn main() {
/// let date = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
/// let mut archive = MemoryArchive::new();
/// archive.insert("Kurla", date, 1, Reading::from_values([(Pollutant::Pm25, 100.0)]));
///
/// assert!(archive.fetch("Kurla", date, 1).await.is_some());
/// assert!(archive.fetch("Kurla", date, 2).await.is_none());
/// assert_eq!(archive.reads(), 2);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryArchive {
    records: HashMap<(String, NaiveDate, u32), Reading>,
    reads: AtomicUsize,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, location: &str, date: NaiveDate, hour: u32, reading: Reading) {
        self.records
            .insert((location.to_string(), date, hour), reading);
    }

    /// Stores the same reading for every hour in `hours` on `date`.
    pub fn fill_hours<I>(&mut self, location: &str, date: NaiveDate, hours: I, reading: &Reading)
    where
        I: IntoIterator<Item = u32>,
    {
        for hour in hours {
            self.insert(location, date, hour, reading.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of `fetch` calls served so far, hits and misses alike.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }
}

impl Archive for MemoryArchive {
    async fn fetch(&self, location: &str, date: NaiveDate, hour: u32) -> Option<Reading> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.records
            .get(&(location.to_string(), date, hour))
            .cloned()
    }
}
