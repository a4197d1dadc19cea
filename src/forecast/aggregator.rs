//! The Slot Aggregator: turns historical readings and recent forecast days into
//! one estimate per pollutant for a single `(date, slot)`.

use crate::archive::reader::Archive;
use crate::forecast::variation::Variation;
use crate::types::levels::PollutantLevels;
use crate::types::pollutant::{Pollutant, POLLUTANT_COUNT};
use crate::types::representative::RepresentativeDayValue;
use crate::types::slot::Slot;
use chrono::{Days, NaiveDate};
use futures_util::future::join_all;
use log::debug;

/// Calendar days before the target date that are sampled from the archive.
pub const DEFAULT_HISTORY_DAYS: u32 = 3;

/// Most recent Representative Day Values blended into each slot.
pub const DEFAULT_REPRESENTATIVE_WINDOW: usize = 3;

/// The slot being estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotQuery<'a> {
    pub location: &'a str,
    /// The real-world date being forecast; history is taken relative to it.
    pub date: NaiveDate,
    pub slot: Slot,
    pub apply_variation: bool,
}

/// Collected samples, one list per pollutant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSet {
    samples: [Vec<f64>; POLLUTANT_COUNT],
}

impl SampleSet {
    pub fn push(&mut self, pollutant: Pollutant, value: f64) {
        self.samples[pollutant.index()].push(value);
    }

    pub fn get(&self, pollutant: Pollutant) -> &[f64] {
        &self.samples[pollutant.index()]
    }

    /// Arithmetic mean of the samples for `pollutant`, `None` when there are none.
    pub fn mean(&self, pollutant: Pollutant) -> Option<f64> {
        let values = self.get(pollutant);
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    }
}

pub struct SlotAggregator<A> {
    archive: A,
    history_days: u32,
    representative_window: usize,
}

impl<A: Archive> SlotAggregator<A> {
    pub fn new(archive: A) -> Self {
        Self::with_windows(archive, DEFAULT_HISTORY_DAYS, DEFAULT_REPRESENTATIVE_WINDOW)
    }

    pub fn with_windows(archive: A, history_days: u32, representative_window: usize) -> Self {
        Self {
            archive,
            history_days,
            representative_window,
        }
    }

    pub fn archive(&self) -> &A {
        &self.archive
    }

    /// Gathers every usable sample for the slot.
    ///
    /// Reads each hour of the slot on each of the `history_days` days before
    /// `query.date`, then appends the values of the last
    /// `representative_window` entries of `recent`. Absent readings, missing
    /// values and representative values of 0 contribute nothing; a measured 0
    /// in the archive is still a sample.
    pub async fn collect_samples(
        &self,
        query: &SlotQuery<'_>,
        recent: &[RepresentativeDayValue],
    ) -> SampleSet {
        let reads = (1..=self.history_days)
            .filter_map(|offset| query.date.checked_sub_days(Days::new(u64::from(offset))))
            .flat_map(|day| query.slot.hours().map(move |hour| (day, hour)))
            .map(|(day, hour)| self.archive.fetch(query.location, day, hour));

        let mut samples = SampleSet::default();
        for reading in join_all(reads).await.into_iter().flatten() {
            for (pollutant, value) in reading.present() {
                samples.push(pollutant, value);
            }
        }

        let first = recent.len().saturating_sub(self.representative_window);
        for representative in &recent[first..] {
            for (pollutant, value) in representative.levels.iter() {
                // A carried-forward 0 is treated like "no data".
                if let Some(v) = value.filter(|v| *v != 0) {
                    samples.push(pollutant, v as f64);
                }
            }
        }

        samples
    }

    /// Computes the slot's estimates.
    ///
    /// Each pollutant with samples gets their mean, passed through `variation`
    /// when `query.apply_variation` is set, rounded half away from zero.
    /// Pollutants without samples are left as "no data".
    pub async fn aggregate<V: Variation + ?Sized>(
        &self,
        query: &SlotQuery<'_>,
        recent: &[RepresentativeDayValue],
        variation: &mut V,
    ) -> PollutantLevels {
        let samples = self.collect_samples(query, recent).await;

        let mut levels = PollutantLevels::new();
        for pollutant in Pollutant::ALL {
            let Some(mean) = samples.mean(pollutant) else {
                continue;
            };
            let value = if query.apply_variation {
                variation.jitter(mean)
            } else {
                mean
            };
            let rounded = value.round() as i64;
            debug!(
                "{} {} {} averaging {}: {:?} => {}",
                query.location,
                query.date,
                query.slot,
                pollutant,
                samples.get(pollutant),
                rounded
            );
            levels.set(pollutant, Some(rounded));
        }
        levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::memory::MemoryArchive;
    use crate::forecast::variation::{NoVariation, RandomVariation};
    use crate::types::reading::Reading;

    const LOCATION: &str = "Mazgaon_Mumbai_-_IITM";

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn query(date: NaiveDate, apply_variation: bool) -> SlotQuery<'static> {
        SlotQuery {
            location: LOCATION,
            date,
            slot: Slot::new(0, 3),
            apply_variation,
        }
    }

    fn representative(date: NaiveDate, levels: PollutantLevels) -> RepresentativeDayValue {
        RepresentativeDayValue { date, levels }
    }

    /// Always pushes the mean up by 10%.
    struct Upward;

    impl Variation for Upward {
        fn jitter(&mut self, mean: f64) -> f64 {
            mean * 1.1
        }
    }

    #[tokio::test]
    async fn test_constant_history_gives_constant_estimate() {
        let mut archive = MemoryArchive::new();
        let reading = Reading::from_values([(Pollutant::Pm25, 100.0)]);
        for d in 7..=9 {
            archive.fill_hours(LOCATION, day(d), 0..3, &reading);
        }
        let aggregator = SlotAggregator::new(archive);

        let levels = aggregator
            .aggregate(&query(day(10), false), &[], &mut NoVariation)
            .await;

        assert_eq!(levels.get(Pollutant::Pm25), Some(100));
        assert_eq!(levels.get(Pollutant::So2), None);
        assert_eq!(levels.count_present(), 1);
    }

    #[tokio::test]
    async fn test_no_samples_means_no_data() {
        let aggregator = SlotAggregator::new(MemoryArchive::new());
        let levels = aggregator
            .aggregate(&query(day(10), true), &[], &mut NoVariation)
            .await;
        assert!(levels.is_empty());
    }

    #[tokio::test]
    async fn test_reads_every_hour_of_three_previous_days() {
        let aggregator = SlotAggregator::new(MemoryArchive::new());
        let q = SlotQuery {
            slot: Slot::new(9, 12),
            ..query(day(10), false)
        };
        aggregator.aggregate(&q, &[], &mut NoVariation).await;
        assert_eq!(aggregator.archive().reads(), 9);
    }

    #[tokio::test]
    async fn test_history_window_is_relative_to_target_date() {
        let mut archive = MemoryArchive::new();
        // Inside the window: the three days before the 10th.
        archive.insert(LOCATION, day(9), 0, Reading::from_values([(Pollutant::No, 10.0)]));
        archive.insert(LOCATION, day(7), 2, Reading::from_values([(Pollutant::No, 20.0)]));
        // Outside the window: the target day itself and the fourth day back.
        archive.insert(LOCATION, day(10), 0, Reading::from_values([(Pollutant::No, 900.0)]));
        archive.insert(LOCATION, day(6), 0, Reading::from_values([(Pollutant::No, 900.0)]));
        // Outside the slot hours.
        archive.insert(LOCATION, day(9), 3, Reading::from_values([(Pollutant::No, 900.0)]));
        let aggregator = SlotAggregator::new(archive);

        let levels = aggregator
            .aggregate(&query(day(10), false), &[], &mut NoVariation)
            .await;
        assert_eq!(levels.get(Pollutant::No), Some(15));
    }

    #[tokio::test]
    async fn test_history_crosses_month_boundary() {
        let mut archive = MemoryArchive::new();
        let dec_31 = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        archive.insert(LOCATION, dec_31, 1, Reading::from_values([(Pollutant::Co, 2.0)]));
        let aggregator = SlotAggregator::new(archive);

        let levels = aggregator
            .aggregate(&query(day(2), false), &[], &mut NoVariation)
            .await;
        assert_eq!(levels.get(Pollutant::Co), Some(2));
    }

    #[tokio::test]
    async fn test_only_last_three_representatives_count() {
        let aggregator = SlotAggregator::new(MemoryArchive::new());
        let recent = vec![
            representative(day(10), PollutantLevels::new().with(Pollutant::Pm10, 1000)),
            representative(day(11), PollutantLevels::new().with(Pollutant::Pm10, 10)),
            representative(day(12), PollutantLevels::new().with(Pollutant::Pm10, 20)),
            representative(day(13), PollutantLevels::new().with(Pollutant::Pm10, 30)),
        ];

        let levels = aggregator
            .aggregate(&query(day(14), false), &recent, &mut NoVariation)
            .await;
        assert_eq!(levels.get(Pollutant::Pm10), Some(20));
    }

    #[tokio::test]
    async fn test_zero_representative_is_skipped() {
        let mut archive = MemoryArchive::new();
        archive.insert(LOCATION, day(9), 0, Reading::from_values([(Pollutant::Ozone, 30.0)]));
        let aggregator = SlotAggregator::new(archive);
        let recent = vec![representative(
            day(9),
            PollutantLevels::new().with(Pollutant::Ozone, 0),
        )];

        let levels = aggregator
            .aggregate(&query(day(10), false), &recent, &mut NoVariation)
            .await;
        assert_eq!(levels.get(Pollutant::Ozone), Some(30));
    }

    #[tokio::test]
    async fn test_rounded_down_co_does_not_drag_later_days() {
        let mut archive = MemoryArchive::new();
        archive.insert(LOCATION, day(9), 0, Reading::from_values([(Pollutant::Co, 1.0)]));
        let aggregator = SlotAggregator::new(archive);
        let recent: Vec<_> = (6..=8)
            .map(|d| representative(day(d), PollutantLevels::new().with(Pollutant::Co, 0)))
            .collect();

        let levels = aggregator
            .aggregate(&query(day(10), false), &recent, &mut NoVariation)
            .await;
        assert_eq!(levels.get(Pollutant::Co), Some(1));
    }

    #[tokio::test]
    async fn test_zero_reading_is_a_sample() {
        let mut archive = MemoryArchive::new();
        archive.insert(LOCATION, day(9), 0, Reading::from_values([(Pollutant::So2, 0.0)]));
        archive.insert(LOCATION, day(9), 1, Reading::from_values([(Pollutant::So2, 10.0)]));
        let aggregator = SlotAggregator::new(archive);

        let levels = aggregator
            .aggregate(&query(day(10), false), &[], &mut NoVariation)
            .await;
        assert_eq!(levels.get(Pollutant::So2), Some(5));
    }

    #[tokio::test]
    async fn test_rounds_half_away_from_zero() {
        let mut archive = MemoryArchive::new();
        archive.insert(
            LOCATION,
            day(9),
            0,
            Reading::from_values([(Pollutant::Nh3, 2.0), (Pollutant::So2, 1.0)]),
        );
        archive.insert(
            LOCATION,
            day(9),
            1,
            Reading::from_values([(Pollutant::Nh3, 3.0), (Pollutant::So2, 2.0)]),
        );
        let aggregator = SlotAggregator::new(archive);

        let levels = aggregator
            .aggregate(&query(day(10), false), &[], &mut NoVariation)
            .await;
        assert_eq!(levels.get(Pollutant::Nh3), Some(3));
        assert_eq!(levels.get(Pollutant::So2), Some(2));
    }

    #[tokio::test]
    async fn test_blends_history_and_representative_with_variation() {
        let mut archive = MemoryArchive::new();
        archive.insert(LOCATION, day(9), 0, Reading::from_values([(Pollutant::No2, 44.0)]));
        archive.insert(LOCATION, day(8), 1, Reading::from_values([(Pollutant::No2, 36.0)]));
        let aggregator = SlotAggregator::new(archive);
        let recent = vec![representative(
            day(9),
            PollutantLevels::new().with(Pollutant::No2, 40),
        )];

        let upward = aggregator
            .aggregate(&query(day(10), true), &recent, &mut Upward)
            .await;
        assert_eq!(upward.get(Pollutant::No2), Some(44));

        let mut random = RandomVariation::seeded(11, 0.1);
        for _ in 0..20 {
            let levels = aggregator
                .aggregate(&query(day(10), true), &recent, &mut random)
                .await;
            let v = levels.get(Pollutant::No2).unwrap();
            assert!(v == 36 || v == 44, "got {}", v);
        }
    }

    #[tokio::test]
    async fn test_variation_ignored_when_not_applied() {
        let mut archive = MemoryArchive::new();
        archive.insert(LOCATION, day(9), 0, Reading::from_values([(Pollutant::Pm25, 50.0)]));
        let aggregator = SlotAggregator::new(archive);

        let levels = aggregator
            .aggregate(&query(day(10), false), &[], &mut Upward)
            .await;
        assert_eq!(levels.get(Pollutant::Pm25), Some(50));
    }

    #[tokio::test]
    async fn test_aggregate_is_idempotent_without_variation() {
        let mut archive = MemoryArchive::new();
        archive.insert(
            LOCATION,
            day(8),
            2,
            Reading::from_values([(Pollutant::Pm25, 12.3), (Pollutant::Co, 0.4)]),
        );
        let aggregator = SlotAggregator::new(archive);
        let recent = vec![representative(
            day(9),
            PollutantLevels::new().with(Pollutant::Pm25, 20),
        )];

        let first = aggregator
            .aggregate(&query(day(10), false), &recent, &mut NoVariation)
            .await;
        let second = aggregator
            .aggregate(&query(day(10), false), &recent, &mut NoVariation)
            .await;
        assert_eq!(first, second);
        assert_eq!(first.get(Pollutant::Pm25), Some(16));
        assert_eq!(first.get(Pollutant::Co), Some(0));
    }
}
