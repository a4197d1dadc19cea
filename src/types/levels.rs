use crate::types::pollutant::{Pollutant, POLLUTANT_COUNT};

/// Per-pollutant rounded estimates for one slot; `None` means "no data".
///
/// This is the output of the slot aggregator and the payload carried by a
/// [`crate::RepresentativeDayValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollutantLevels {
    values: [Option<i64>; POLLUTANT_COUNT],
}

impl PollutantLevels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, pollutant: Pollutant) -> Option<i64> {
        self.values[pollutant.index()]
    }

    pub fn set(&mut self, pollutant: Pollutant, value: Option<i64>) {
        self.values[pollutant.index()] = value;
    }

    /// Builder-style variant of [`PollutantLevels::set`].
    pub fn with(mut self, pollutant: Pollutant, value: i64) -> Self {
        self.set(pollutant, Some(value));
        self
    }

    /// Every pollutant paired with its estimate, in output order.
    pub fn iter(&self) -> impl Iterator<Item = (Pollutant, Option<i64>)> + '_ {
        Pollutant::ALL.into_iter().map(move |p| (p, self.get(p)))
    }

    /// Number of pollutants with an estimate.
    pub fn count_present(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// True when every pollutant is "no data".
    pub fn is_empty(&self) -> bool {
        self.count_present() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_iterate() {
        let levels = PollutantLevels::new()
            .with(Pollutant::Pm25, 100)
            .with(Pollutant::Ozone, 0);

        assert_eq!(levels.get(Pollutant::Pm25), Some(100));
        assert_eq!(levels.get(Pollutant::Ozone), Some(0));
        assert_eq!(levels.get(Pollutant::So2), None);
        assert_eq!(levels.count_present(), 2);
        assert!(!levels.is_empty());

        let order: Vec<Pollutant> = levels.iter().map(|(p, _)| p).collect();
        assert_eq!(order, Pollutant::ALL.to_vec());
    }

    #[test]
    fn test_default_is_empty() {
        assert!(PollutantLevels::default().is_empty());
    }
}
