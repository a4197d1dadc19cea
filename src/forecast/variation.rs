//! The Variation Injector: a bounded random nudge for far-out forecast days.
//!
//! Aggregated means for later days would otherwise repeat the same values day
//! after day. The policy is a trait so a run can inject a seeded source for
//! reproducible output, or disable variation entirely.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Relative size of the adjustment: a mean `m` becomes `m * 1.1` or `m * 0.9`.
pub const DEFAULT_VARIATION_FRACTION: f64 = 0.10;

pub trait Variation {
    /// Returns `mean` adjusted by the policy.
    fn jitter(&mut self, mean: f64) -> f64;
}

impl<V: Variation + ?Sized> Variation for Box<V> {
    fn jitter(&mut self, mean: f64) -> f64 {
        (**self).jitter(mean)
    }
}

/// Leaves every mean untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVariation;

impl Variation for NoVariation {
    fn jitter(&mut self, mean: f64) -> f64 {
        mean
    }
}

/// Adds or subtracts exactly `fraction * mean`, the sign drawn uniformly per call.
///
/// # Examples
///
/// ```
/// use aqi_slotcast::{RandomVariation, Variation};
///
/// let mut variation = RandomVariation::seeded(7, 0.1);
/// let adjusted = variation.jitter(40.0);
/// assert!((adjusted - 44.0).abs() < 1e-9 || (adjusted - 36.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct RandomVariation<R = StdRng> {
    rng: R,
    fraction: f64,
}

impl RandomVariation<StdRng> {
    /// Unseeded: successive runs produce different forecasts for later days.
    pub fn from_entropy(fraction: f64) -> Self {
        Self::with_rng(StdRng::from_entropy(), fraction)
    }

    pub fn seeded(seed: u64, fraction: f64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), fraction)
    }
}

impl<R: Rng> RandomVariation<R> {
    pub fn with_rng(rng: R, fraction: f64) -> Self {
        Self { rng, fraction }
    }
}

impl<R: Rng> Variation for RandomVariation<R> {
    fn jitter(&mut self, mean: f64) -> f64 {
        let delta = self.fraction * mean;
        if self.rng.gen_bool(0.5) {
            mean + delta
        } else {
            mean - delta
        }
    }
}

/// Which variation source a run uses; every location gets a fresh instance.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum VariationMode {
    #[default]
    Random,
    /// Each location starts from the same seed, so reruns are reproducible.
    Seeded(u64),
    Disabled,
}

impl VariationMode {
    pub fn policy(&self, fraction: f64) -> Box<dyn Variation + Send> {
        match self {
            VariationMode::Random => Box::new(RandomVariation::from_entropy(fraction)),
            VariationMode::Seeded(seed) => Box::new(RandomVariation::seeded(*seed, fraction)),
            VariationMode::Disabled => Box::new(NoVariation),
        }
    }
}
