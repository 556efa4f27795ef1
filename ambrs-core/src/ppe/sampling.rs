//! Sampling of ensembles from specifications
//!
//! Two methods are provided:
//!
//! - [`sample`]: every distribution leaf is sampled independently `n` times.
//! - [`lhs`]: Latin hypercube sampling. Each leaf's distribution is divided
//!   into `n` equal-probability strata and every stratum is sampled exactly
//!   once. The assignment of strata to members is an independent random
//!   permutation per leaf, which decorrelates the leaves while keeping full
//!   marginal coverage.
//!
//! Fixed leaves are broadcast to every member in both methods.
//!
//! Mass fractions are sampled per species and therefore do not sum to one.
//! After all leaves have been drawn, each member's mass fractions are divided
//! by their sum, mode by mode, so that every returned member is physically valid.

use crate::aerosol::{AerosolModalSizePopulation, AerosolModePopulation};
use crate::distribution::Parameter;
use crate::errors::{AmbrsError, AmbrsResult};
use crate::ppe::ensemble::Ensemble;
use crate::ppe::specification::EnsembleSpecification;
use ndarray::Array1;
use rand::distributions::Open01;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// Strategy used to draw values for distribution leaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SamplingMethod {
    /// Independent random sampling
    #[serde(rename = "random")]
    Random,
    /// Latin hypercube sampling
    #[default]
    #[serde(rename = "lhs")]
    LatinHypercube,
}

impl fmt::Display for SamplingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplingMethod::Random => write!(f, "random"),
            SamplingMethod::LatinHypercube => write!(f, "lhs"),
        }
    }
}

impl FromStr for SamplingMethod {
    type Err = AmbrsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(SamplingMethod::Random),
            "lhs" => Ok(SamplingMethod::LatinHypercube),
            other => Err(AmbrsError::Config(format!(
                "unknown sampling method '{}', expected 'random' or 'lhs'",
                other
            ))),
        }
    }
}

/// Draw an ensemble of `n` members by independent random sampling.
pub fn sample(specification: &EnsembleSpecification, n: usize) -> AmbrsResult<Ensemble> {
    sample_with_rng(specification, n, &mut rand::thread_rng())
}

/// Draw an ensemble of `n` members by independent random sampling using `rng`.
pub fn sample_with_rng<R: Rng>(
    specification: &EnsembleSpecification,
    n: usize,
    rng: &mut R,
) -> AmbrsResult<Ensemble> {
    sample_ensemble(specification, n, SamplingMethod::Random, rng)
}

/// Draw an ensemble of `n` members by Latin hypercube sampling.
pub fn lhs(specification: &EnsembleSpecification, n: usize) -> AmbrsResult<Ensemble> {
    lhs_with_rng(specification, n, &mut rand::thread_rng())
}

/// Draw an ensemble of `n` members by Latin hypercube sampling using `rng`.
///
/// Every distribution leaf must provide an inverse CDF.
pub fn lhs_with_rng<R: Rng>(
    specification: &EnsembleSpecification,
    n: usize,
    rng: &mut R,
) -> AmbrsResult<Ensemble> {
    sample_ensemble(specification, n, SamplingMethod::LatinHypercube, rng)
}

/// Draw an ensemble of `n` members with the given method.
///
/// Leaves are drawn in a fixed order (modes first, then gases and ambient
/// conditions), so a seeded `rng` reproduces the same ensemble.
pub fn sample_ensemble<R: Rng>(
    specification: &EnsembleSpecification,
    n: usize,
    method: SamplingMethod,
    rng: &mut R,
) -> AmbrsResult<Ensemble> {
    if n == 0 {
        return Err(AmbrsError::Sampling(
            "ensemble size must be positive".to_string(),
        ));
    }
    specification.validate()?;
    for leaf in specification.leaves() {
        check_leaf(leaf, method)?;
    }

    info!(
        specification = %specification.name,
        n,
        %method,
        sampled_leaves = specification.n_sampled(),
        "Sampling ensemble"
    );

    let rng: &mut dyn RngCore = rng;

    let mut modes = Vec::with_capacity(specification.size.modes.len());
    for mode in &specification.size.modes {
        let number = draw(&mode.number, n, method, rng)?;
        let geom_mean_diam = draw(&mode.geom_mean_diam, n, method, rng)?;
        let log10_geom_std_dev = draw(&mode.log10_geom_std_dev, n, method, rng)?;

        let mut mass_fractions = Vec::with_capacity(mode.mass_fractions.len());
        for leaf in &mode.mass_fractions {
            mass_fractions.push(draw(leaf, n, method, rng)?);
        }

        let mut population = AerosolModePopulation {
            name: mode.name.clone(),
            species: mode.species.clone(),
            number,
            geom_mean_diam,
            log10_geom_std_dev,
            mass_fractions,
        };
        population.normalize_mass_fractions()?;
        debug!(mode = %mode.name, "Sampled mode");
        modes.push(population);
    }

    let mut gas_concs = Vec::with_capacity(specification.gas_concs.len());
    for leaf in &specification.gas_concs {
        gas_concs.push(draw(leaf, n, method, rng)?);
    }

    let ensemble = Ensemble::new(
        specification.aerosols.clone(),
        specification.gases.clone(),
        AerosolModalSizePopulation { modes },
        gas_concs,
        draw(&specification.flux, n, method, rng)?,
        draw(&specification.relative_humidity, n, method, rng)?,
        draw(&specification.temperature, n, method, rng)?,
        draw(&specification.pressure, n, method, rng)?,
        draw(&specification.height, n, method, rng)?,
    )?;

    Ok(ensemble.with_specification(Arc::new(specification.clone())))
}

/// Reject leaves that cannot be drawn with `method` before any sampling happens.
fn check_leaf(leaf: &Parameter, method: SamplingMethod) -> AmbrsResult<()> {
    leaf.validate()?;
    if let (Parameter::Distributed(distribution), SamplingMethod::LatinHypercube) = (leaf, method)
    {
        if distribution.inverse_cdf(0.5).is_none() {
            return Err(AmbrsError::UnsupportedDistribution {
                distribution: distribution.name().to_string(),
            });
        }
    }
    Ok(())
}

/// Draw `n` values for a single leaf.
fn draw(
    leaf: &Parameter,
    n: usize,
    method: SamplingMethod,
    rng: &mut dyn RngCore,
) -> AmbrsResult<Array1<f64>> {
    let distribution = match leaf {
        Parameter::Fixed(value) => return Ok(Array1::from_elem(n, *value)),
        Parameter::Distributed(distribution) => distribution,
    };

    match method {
        SamplingMethod::Random => Ok(distribution.sample_n(n, rng)),
        SamplingMethod::LatinHypercube => {
            let mut strata: Vec<usize> = (0..n).collect();
            strata.shuffle(rng);

            let mut values = Array1::zeros(n);
            for (value, stratum) in values.iter_mut().zip(strata) {
                let jitter: f64 = rng.sample(Open01);
                let quantile = (stratum as f64 + jitter) / n as f64;
                *value = distribution.inverse_cdf(quantile).ok_or_else(|| {
                    AmbrsError::UnsupportedDistribution {
                        distribution: distribution.name().to_string(),
                    }
                })?;
            }
            Ok(values)
        }
    }
}
