pub mod aggregator;
pub mod engine;
pub mod runner;
pub mod variation;
pub mod writer;
