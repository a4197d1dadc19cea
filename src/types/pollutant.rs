//! Defines the fixed set of pollutant codes reported by the archive.

use std::fmt;

/// Number of pollutant codes tracked per reading and per forecast slot.
pub const POLLUTANT_COUNT: usize = 9;

/// One of the nine air quality constituents recorded in the archive.
///
/// The declaration order is the output order: every per-pollutant container in
/// this crate is indexed by [`Pollutant::index`] and iterated via
/// [`Pollutant::ALL`].
///
/// # Examples
///
/// ```
/// use aqi_slotcast::Pollutant;
///
/// assert_eq!(Pollutant::Pm25.code(), "PM2.5");
/// assert_eq!(Pollutant::from_code("Ozone"), Some(Pollutant::Ozone));
/// assert_eq!(Pollutant::ALL.len(), 9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pollutant {
    /// Fine particulate matter, `PM2.5`.
    Pm25,
    /// Coarse particulate matter, `PM10`.
    Pm10,
    /// Nitric oxide, `NO`.
    No,
    /// Nitrogen dioxide, `NO2`.
    No2,
    /// Total nitrogen oxides, `NOx`.
    Nox,
    /// Ammonia, `NH3`.
    Nh3,
    /// Sulphur dioxide, `SO2`.
    So2,
    /// Carbon monoxide, `CO`.
    Co,
    /// Ground level ozone, `Ozone`.
    Ozone,
}

impl Pollutant {
    /// All pollutants in output order.
    pub const ALL: [Pollutant; POLLUTANT_COUNT] = [
        Pollutant::Pm25,
        Pollutant::Pm10,
        Pollutant::No,
        Pollutant::No2,
        Pollutant::Nox,
        Pollutant::Nh3,
        Pollutant::So2,
        Pollutant::Co,
        Pollutant::Ozone,
    ];

    /// The key used for this pollutant in archive payloads and forecast output.
    pub fn code(&self) -> &'static str {
        match self {
            Pollutant::Pm25 => "PM2.5",
            Pollutant::Pm10 => "PM10",
            Pollutant::No => "NO",
            Pollutant::No2 => "NO2",
            Pollutant::Nox => "NOx",
            Pollutant::Nh3 => "NH3",
            Pollutant::So2 => "SO2",
            Pollutant::Co => "CO",
            Pollutant::Ozone => "Ozone",
        }
    }

    /// Looks up a pollutant by its exact (case sensitive) archive key.
    pub fn from_code(code: &str) -> Option<Pollutant> {
        Pollutant::ALL.into_iter().find(|p| p.code() == code)
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
