//! Probability distributions for specification leaves
//!
//! A [`Distribution`] is a capability rather than a class hierarchy: every
//! family can draw samples, and families with a closed-form (or tabulated)
//! quantile function additionally expose [`Distribution::inverse_cdf`], which
//! Latin hypercube sampling requires.
//!
//! Distributions are serialised polymorphically with `typetag`, tagged by a
//! `type` field:
//!
//! ```toml
//! number = { type = "log_uniform", low = 3e7, high = 2e12 }
//! ```

use crate::errors::{AmbrsError, AmbrsResult};
use ndarray::Array1;
use rand::{Rng, RngCore};
use rand_distr::Distribution as _;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

/// A one-dimensional continuous probability distribution.
#[typetag::serde(tag = "type")]
pub trait Distribution: Debug + Send + Sync {
    /// Short name of the distribution family, used in error messages.
    fn name(&self) -> &'static str;

    /// Check that the distribution parameters are usable.
    fn validate(&self) -> AmbrsResult<()>;

    /// Draw a single sample.
    fn sample(&self, rng: &mut dyn RngCore) -> f64;

    /// Draw `n` independent samples.
    fn sample_n(&self, n: usize, rng: &mut dyn RngCore) -> Array1<f64> {
        Array1::from_iter((0..n).map(|_| self.sample(rng)))
    }

    /// Evaluate the percent-point function at quantile `q` in [0, 1].
    ///
    /// Returns `None` if this family does not provide one.
    fn inverse_cdf(&self, _q: f64) -> Option<f64> {
        None
    }

    /// Lower and upper bounds of the support.
    fn support(&self) -> (f64, f64);
}

fn check_bounds(family: &str, low: f64, high: f64) -> AmbrsResult<()> {
    if !(low.is_finite() && high.is_finite()) || low >= high {
        return Err(AmbrsError::Sampling(format!(
            "{} distribution requires finite bounds with low < high, got [{}, {}]",
            family, low, high
        )));
    }
    Ok(())
}

/// Continuous uniform distribution on `[low, high]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Uniform {
    pub low: f64,
    pub high: f64,
}

impl Uniform {
    pub fn new(low: f64, high: f64) -> AmbrsResult<Self> {
        check_bounds("uniform", low, high)?;
        Ok(Self { low, high })
    }
}

#[typetag::serde(name = "uniform")]
impl Distribution for Uniform {
    fn name(&self) -> &'static str {
        "uniform"
    }

    fn validate(&self) -> AmbrsResult<()> {
        check_bounds(self.name(), self.low, self.high)
    }

    fn sample(&self, rng: &mut dyn RngCore) -> f64 {
        let u: f64 = rng.gen();
        self.inverse_cdf(u).unwrap_or(self.low)
    }

    fn inverse_cdf(&self, q: f64) -> Option<f64> {
        let q = q.clamp(0.0, 1.0);
        Some((self.low + q * (self.high - self.low)).clamp(self.low, self.high))
    }

    fn support(&self) -> (f64, f64) {
        (self.low, self.high)
    }
}

/// Log-uniform (reciprocal) distribution on `[low, high]` with `0 < low < high`.
///
/// The logarithm of a sample is uniformly distributed, which suits quantities
/// spanning several orders of magnitude such as number concentrations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogUniform {
    pub low: f64,
    pub high: f64,
}

impl LogUniform {
    pub fn new(low: f64, high: f64) -> AmbrsResult<Self> {
        let distribution = Self { low, high };
        distribution.validate()?;
        Ok(distribution)
    }
}

#[typetag::serde(name = "log_uniform")]
impl Distribution for LogUniform {
    fn name(&self) -> &'static str {
        "log_uniform"
    }

    fn validate(&self) -> AmbrsResult<()> {
        check_bounds(self.name(), self.low, self.high)?;
        if self.low <= 0.0 {
            return Err(AmbrsError::Sampling(format!(
                "log_uniform distribution requires positive bounds, got [{}, {}]",
                self.low, self.high
            )));
        }
        Ok(())
    }

    fn sample(&self, rng: &mut dyn RngCore) -> f64 {
        let u: f64 = rng.gen();
        self.inverse_cdf(u).unwrap_or(self.low)
    }

    fn inverse_cdf(&self, q: f64) -> Option<f64> {
        let q = q.clamp(0.0, 1.0);
        let (ln_low, ln_high) = (self.low.ln(), self.high.ln());
        Some((ln_low + q * (ln_high - ln_low)).exp().clamp(self.low, self.high))
    }

    fn support(&self) -> (f64, f64) {
        (self.low, self.high)
    }
}

/// Empirical distribution over a set of observed values.
///
/// The quantile function interpolates linearly between the sorted
/// observations, so samples are continuous within `[min, max]`. Useful for
/// perturbing around values harvested from a host model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "EmpiricalValues")]
pub struct Empirical {
    values: Vec<f64>,
}

#[derive(Deserialize)]
struct EmpiricalValues {
    values: Vec<f64>,
}

impl From<EmpiricalValues> for Empirical {
    fn from(raw: EmpiricalValues) -> Self {
        let mut values = raw.values;
        values.sort_by(f64::total_cmp);
        Self { values }
    }
}

impl Empirical {
    pub fn new(values: Vec<f64>) -> AmbrsResult<Self> {
        let distribution = Self::from(EmpiricalValues { values });
        distribution.validate()?;
        Ok(distribution)
    }

    /// Observations in ascending order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

#[typetag::serde(name = "empirical")]
impl Distribution for Empirical {
    fn name(&self) -> &'static str {
        "empirical"
    }

    fn validate(&self) -> AmbrsResult<()> {
        if self.values.is_empty() {
            return Err(AmbrsError::Sampling(
                "empirical distribution requires at least one value".to_string(),
            ));
        }
        if self.values.iter().any(|v| !v.is_finite()) {
            return Err(AmbrsError::Sampling(
                "empirical distribution values must be finite".to_string(),
            ));
        }
        Ok(())
    }

    fn sample(&self, rng: &mut dyn RngCore) -> f64 {
        let u: f64 = rng.gen();
        self.inverse_cdf(u).unwrap_or(f64::NAN)
    }

    fn inverse_cdf(&self, q: f64) -> Option<f64> {
        let last = self.values.len().checked_sub(1)?;
        let position = q.clamp(0.0, 1.0) * last as f64;
        let lower = (position.floor() as usize).min(last);
        let upper = (lower + 1).min(last);
        let fraction = position - lower as f64;

        Some(self.values[lower] + fraction * (self.values[upper] - self.values[lower]))
    }

    fn support(&self) -> (f64, f64) {
        match (self.values.first(), self.values.last()) {
            (Some(&low), Some(&high)) => (low, high),
            _ => (f64::NAN, f64::NAN),
        }
    }
}

/// Normal distribution. Sampling only: no inverse CDF is provided.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normal {
    pub mean: f64,
    pub std_dev: f64,
}

#[typetag::serde(name = "normal")]
impl Distribution for Normal {
    fn name(&self) -> &'static str {
        "normal"
    }

    fn validate(&self) -> AmbrsResult<()> {
        rand_distr::Normal::new(self.mean, self.std_dev)
            .map(|_| ())
            .map_err(|e| AmbrsError::Sampling(format!("invalid normal distribution: {}", e)))
    }

    fn sample(&self, rng: &mut dyn RngCore) -> f64 {
        rand_distr::Normal::new(self.mean, self.std_dev).map_or(f64::NAN, |d| d.sample(rng))
    }

    fn support(&self) -> (f64, f64) {
        (f64::NEG_INFINITY, f64::INFINITY)
    }
}

/// Log-normal distribution, parameterised by the mean and standard deviation
/// of the underlying normal. Sampling only: no inverse CDF is provided.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogNormal {
    pub mu: f64,
    pub sigma: f64,
}

#[typetag::serde(name = "log_normal")]
impl Distribution for LogNormal {
    fn name(&self) -> &'static str {
        "log_normal"
    }

    fn validate(&self) -> AmbrsResult<()> {
        rand_distr::LogNormal::new(self.mu, self.sigma)
            .map(|_| ())
            .map_err(|e| AmbrsError::Sampling(format!("invalid log_normal distribution: {}", e)))
    }

    fn sample(&self, rng: &mut dyn RngCore) -> f64 {
        rand_distr::LogNormal::new(self.mu, self.sigma).map_or(f64::NAN, |d| d.sample(rng))
    }

    fn support(&self) -> (f64, f64) {
        (0.0, f64::INFINITY)
    }
}

/// A leaf of a specification tree: either a value shared by every member of
/// the ensemble or a distribution sampled independently for each member.
///
/// Deserialises from a bare number (fixed) or a distribution table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Parameter {
    Fixed(f64),
    Distributed(Arc<dyn Distribution>),
}

impl Parameter {
    pub fn distributed<D: Distribution + 'static>(distribution: D) -> Self {
        Parameter::Distributed(Arc::new(distribution))
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, Parameter::Fixed(_))
    }

    pub fn validate(&self) -> AmbrsResult<()> {
        match self {
            Parameter::Fixed(value) if !value.is_finite() => Err(AmbrsError::Sampling(format!(
                "fixed parameter value must be finite, got {}",
                value
            ))),
            Parameter::Fixed(_) => Ok(()),
            Parameter::Distributed(distribution) => distribution.validate(),
        }
    }
}

impl From<f64> for Parameter {
    fn from(value: f64) -> Self {
        Parameter::Fixed(value)
    }
}

macro_rules! impl_parameter_from {
    ($($family:ty),* $(,)?) => {
        $(
            impl From<$family> for Parameter {
                fn from(distribution: $family) -> Self {
                    Parameter::distributed(distribution)
                }
            }
        )*
    };
}

impl_parameter_from!(Uniform, LogUniform, Empirical, Normal, LogNormal);
