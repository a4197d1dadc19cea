//! Fixed time-of-day windows that partition a forecast day.

use std::fmt;
use std::ops::Range;
use thiserror::Error;

/// Width of every slot, in hours.
pub const SLOT_WIDTH_HOURS: u32 = 3;

/// Hours in a day; slot tables must cover `[0, HOURS_PER_DAY)` exactly.
pub const HOURS_PER_DAY: u32 = 24;

/// A half-open hour range `[start, end)` within one day.
///
/// # Examples
///
/// ```
/// use aqi_slotcast::Slot;
///
/// let slot = Slot::new(21, 24);
/// assert_eq!(slot.label(), "21:00-24:00");
/// assert_eq!(slot.hours().collect::<Vec<_>>(), vec![21, 22, 23]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot {
    pub start: u32,
    pub end: u32,
}

impl Slot {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// The hours sampled for this slot, in increasing order.
    pub fn hours(&self) -> Range<u32> {
        self.start..self.end
    }

    /// Output label, `HH:00-HH:00` with zero padded 24-hour values.
    pub fn label(&self) -> String {
        format!("{:02}:00-{:02}:00", self.start, self.end)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlotTableError {
    #[error("Slot table is empty")]
    Empty,

    #[error("Slot {slot} is {width} hours wide, expected {}", SLOT_WIDTH_HOURS)]
    Width { slot: Slot, width: i64 },

    #[error("Slot {slot} does not start at hour {expected_start} (gap or overlap)")]
    Discontinuous { slot: Slot, expected_start: u32 },

    #[error("Slot table ends at hour {end}, expected {}", HOURS_PER_DAY)]
    Incomplete { end: u32 },
}

/// An ordered list of slots that exactly partitions `[0, 24)`.
///
/// The only way to obtain one is through validation, so every table the engine
/// sees has contiguous 3-hour slots in increasing order starting at hour 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotTable {
    slots: Vec<Slot>,
}

impl SlotTable {
    /// Validates `slots` and wraps them into a table.
    pub fn new(slots: Vec<Slot>) -> Result<Self, SlotTableError> {
        if slots.is_empty() {
            return Err(SlotTableError::Empty);
        }

        let mut expected_start = 0;
        for slot in &slots {
            let width = i64::from(slot.end) - i64::from(slot.start);
            if width != i64::from(SLOT_WIDTH_HOURS) {
                return Err(SlotTableError::Width { slot: *slot, width });
            }
            if slot.start != expected_start {
                return Err(SlotTableError::Discontinuous {
                    slot: *slot,
                    expected_start,
                });
            }
            expected_start = slot.end;
        }

        if expected_start != HOURS_PER_DAY {
            return Err(SlotTableError::Incomplete {
                end: expected_start,
            });
        }

        Ok(Self { slots })
    }

    /// Builds a table from `[start, end]` pairs, as written in the config file.
    pub fn from_pairs(pairs: &[[u32; 2]]) -> Result<Self, SlotTableError> {
        Self::new(pairs.iter().map(|[s, e]| Slot::new(*s, *e)).collect())
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Slot> + '_ {
        self.slots.iter().copied()
    }
}

impl Default for SlotTable {
    /// The eight standard slots `00-03, 03-06, ..., 21-24`.
    fn default() -> Self {
        let slots = (0..HOURS_PER_DAY)
            .step_by(SLOT_WIDTH_HOURS as usize)
            .map(|start| Slot::new(start, start + SLOT_WIDTH_HOURS))
            .collect();
        Self { slots }
    }
}
