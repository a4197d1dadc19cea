pub mod levels;
pub mod pollutant;
pub mod reading;
pub mod representative;
pub mod slot;
pub mod slot_result;
