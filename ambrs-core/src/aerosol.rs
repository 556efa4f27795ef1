//! Aerosol species and modal particle size distributions
//!
//! A modal size distribution is a fixed, ordered set of internally-mixed
//! log-normal modes. Each mode type comes in three forms:
//!
//! - **state** ([`AerosolModeState`]): one concrete value per field, used by
//!   [`Scenario`](crate::scenario::Scenario)
//! - **distribution** ([`AerosolModeDistribution`]): one [`Parameter`] per
//!   field, used by an [`EnsembleSpecification`](crate::ppe::EnsembleSpecification)
//! - **population** ([`AerosolModePopulation`]): one column of values per field,
//!   used by an [`Ensemble`](crate::ppe::Ensemble)
//!
//! In every form the mode's `species` list defines the order of its mass
//! fractions.

use crate::distribution::Parameter;
use crate::errors::{AmbrsError, AmbrsResult};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Absolute tolerance on the sum of a mode's mass fractions.
pub const MASS_FRACTION_TOLERANCE: f64 = 1e-12;

/// Aerosol processes enabled in a simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AerosolProcesses {
    pub aging: bool,
    pub coagulation: bool,
    pub condensation: bool,
    pub mosaic: bool,
    pub nucleation: bool,
}

/// An aerosol species in terms of species-specific constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AerosolSpecies {
    /// Unique name of the species
    pub name: String,
    /// Molar mass (kg/mol)
    pub molar_mass: f64,
    /// Density (kg/m³)
    pub density: f64,
    /// Hygroscopicity parameter κ (-)
    pub hygroscopicity: f64,
}

impl AerosolSpecies {
    pub fn new(name: impl Into<String>, molar_mass: f64, density: f64, hygroscopicity: f64) -> Self {
        Self {
            name: name.into(),
            molar_mass,
            density,
            hygroscopicity,
        }
    }
}

fn check_species_count(mode: &str, species: usize, fractions: usize) -> AmbrsResult<()> {
    if species != fractions {
        return Err(AmbrsError::Shape(format!(
            "mode '{}' has {} species but {} mass fractions",
            mode, species, fractions
        )));
    }
    Ok(())
}

/// A single log-normal mode with concrete values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AerosolModeState {
    pub name: String,
    pub species: Vec<AerosolSpecies>,
    /// Number concentration (#/m³)
    pub number: f64,
    /// Geometric mean diameter (m)
    pub geom_mean_diam: f64,
    /// log10 of the geometric standard deviation (-)
    pub log10_geom_std_dev: f64,
    /// Mass fractions, aligned with `species`
    pub mass_fractions: Vec<f64>,
}

impl AerosolModeState {
    /// Create a mode, checking that the mass fractions match the species and sum to one.
    pub fn new(
        name: impl Into<String>,
        species: Vec<AerosolSpecies>,
        number: f64,
        geom_mean_diam: f64,
        log10_geom_std_dev: f64,
        mass_fractions: Vec<f64>,
    ) -> AmbrsResult<Self> {
        let mode = Self {
            name: name.into(),
            species,
            number,
            geom_mean_diam,
            log10_geom_std_dev,
            mass_fractions,
        };
        mode.validate()?;
        Ok(mode)
    }

    pub fn validate(&self) -> AmbrsResult<()> {
        check_species_count(&self.name, self.species.len(), self.mass_fractions.len())?;

        let sum: f64 = self.mass_fractions.iter().sum();
        if sum.is_nan() || (sum - 1.0).abs() > MASS_FRACTION_TOLERANCE {
            return Err(AmbrsError::MassFractions {
                mode: self.name.clone(),
                sum,
            });
        }
        Ok(())
    }

    /// Mass fraction of the named species, if it is present in this mode.
    pub fn mass_fraction(&self, species: &str) -> Option<f64> {
        self.species
            .iter()
            .position(|s| s.name == species)
            .map(|i| self.mass_fractions[i])
    }
}

/// An aerosol size distribution given by concrete modal parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AerosolModalSizeState {
    pub modes: Vec<AerosolModeState>,
}

impl AerosolModalSizeState {
    pub fn new(modes: Vec<AerosolModeState>) -> AmbrsResult<Self> {
        let size = Self { modes };
        size.validate()?;
        Ok(size)
    }

    pub fn validate(&self) -> AmbrsResult<()> {
        self.modes.iter().try_for_each(AerosolModeState::validate)
    }
}

/// A single log-normal mode whose parameters are sampled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AerosolModeDistribution {
    pub name: String,
    pub species: Vec<AerosolSpecies>,
    pub number: Parameter,
    pub geom_mean_diam: Parameter,
    pub log10_geom_std_dev: Parameter,
    /// One leaf per species, aligned with `species`
    pub mass_fractions: Vec<Parameter>,
}

impl AerosolModeDistribution {
    pub fn new(
        name: impl Into<String>,
        species: Vec<AerosolSpecies>,
        number: impl Into<Parameter>,
        geom_mean_diam: impl Into<Parameter>,
        log10_geom_std_dev: impl Into<Parameter>,
        mass_fractions: Vec<Parameter>,
    ) -> AmbrsResult<Self> {
        let mode = Self {
            name: name.into(),
            species,
            number: number.into(),
            geom_mean_diam: geom_mean_diam.into(),
            log10_geom_std_dev: log10_geom_std_dev.into(),
            mass_fractions,
        };
        mode.validate()?;
        Ok(mode)
    }

    pub fn validate(&self) -> AmbrsResult<()> {
        check_species_count(&self.name, self.species.len(), self.mass_fractions.len())
    }
}

/// A modal size distribution whose modal parameters are sampled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AerosolModalSizeDistribution {
    pub modes: Vec<AerosolModeDistribution>,
}

impl AerosolModalSizeDistribution {
    pub fn new(modes: Vec<AerosolModeDistribution>) -> AmbrsResult<Self> {
        let size = Self { modes };
        size.validate()?;
        Ok(size)
    }

    pub fn validate(&self) -> AmbrsResult<()> {
        self.modes
            .iter()
            .try_for_each(AerosolModeDistribution::validate)
    }
}

/// Columnar values of a single mode across the members of an ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AerosolModePopulation {
    pub name: String,
    pub species: Vec<AerosolSpecies>,
    pub number: Array1<f64>,
    pub geom_mean_diam: Array1<f64>,
    pub log10_geom_std_dev: Array1<f64>,
    /// One column per species, aligned with `species`
    pub mass_fractions: Vec<Array1<f64>>,
}

impl AerosolModePopulation {
    /// Repeat a single mode state `n` times.
    pub fn broadcast(state: &AerosolModeState, n: usize) -> Self {
        Self {
            name: state.name.clone(),
            species: state.species.clone(),
            number: Array1::from_elem(n, state.number),
            geom_mean_diam: Array1::from_elem(n, state.geom_mean_diam),
            log10_geom_std_dev: Array1::from_elem(n, state.log10_geom_std_dev),
            mass_fractions: state
                .mass_fractions
                .iter()
                .map(|&f| Array1::from_elem(n, f))
                .collect(),
        }
    }

    /// Number of members in this population.
    pub fn len(&self) -> usize {
        self.number.len()
    }

    pub fn is_empty(&self) -> bool {
        self.number.is_empty()
    }

    /// Check that every column has `n` entries and the mass fractions match the species.
    pub(crate) fn check_shape(&self, n: usize) -> AmbrsResult<()> {
        check_species_count(&self.name, self.species.len(), self.mass_fractions.len())?;

        let columns = [
            ("number", &self.number),
            ("geom_mean_diam", &self.geom_mean_diam),
            ("log10_geom_std_dev", &self.log10_geom_std_dev),
        ];
        for (field, column) in columns {
            if column.len() != n {
                return Err(AmbrsError::Shape(format!(
                    "mode '{}' field '{}' has {} values, expected {}",
                    self.name,
                    field,
                    column.len(),
                    n
                )));
            }
        }
        for (species, column) in self.species.iter().zip(&self.mass_fractions) {
            if column.len() != n {
                return Err(AmbrsError::Shape(format!(
                    "mode '{}' mass fraction of '{}' has {} values, expected {}",
                    self.name,
                    species.name,
                    column.len(),
                    n
                )));
            }
        }
        for i in 0..n {
            let sum: f64 = self.mass_fractions.iter().map(|column| column[i]).sum();
            if sum.is_nan() || (sum - 1.0).abs() > MASS_FRACTION_TOLERANCE {
                return Err(AmbrsError::MassFractions {
                    mode: self.name.clone(),
                    sum,
                });
            }
        }
        Ok(())
    }

    /// Rescale each member's mass fractions by their sum so that they sum to one.
    pub(crate) fn normalize_mass_fractions(&mut self) -> AmbrsResult<()> {
        for i in 0..self.len() {
            let sum: f64 = self.mass_fractions.iter().map(|column| column[i]).sum();
            if !(sum.is_finite() && sum > 0.0) {
                return Err(AmbrsError::Sampling(format!(
                    "mass fractions of mode '{}' for member {} sum to {}, cannot normalise",
                    self.name, i, sum
                )));
            }
            for column in self.mass_fractions.iter_mut() {
                column[i] /= sum;
            }
        }
        Ok(())
    }

    /// Extract the state of member `i`. The caller checks the index.
    pub(crate) fn state(&self, i: usize) -> AerosolModeState {
        AerosolModeState {
            name: self.name.clone(),
            species: self.species.clone(),
            number: self.number[i],
            geom_mean_diam: self.geom_mean_diam[i],
            log10_geom_std_dev: self.log10_geom_std_dev[i],
            mass_fractions: self.mass_fractions.iter().map(|column| column[i]).collect(),
        }
    }
}

/// Columnar modal size distributions across the members of an ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AerosolModalSizePopulation {
    pub modes: Vec<AerosolModePopulation>,
}

impl AerosolModalSizePopulation {
    pub fn broadcast(state: &AerosolModalSizeState, n: usize) -> Self {
        Self {
            modes: state
                .modes
                .iter()
                .map(|mode| AerosolModePopulation::broadcast(mode, n))
                .collect(),
        }
    }

    pub(crate) fn state(&self, i: usize) -> AerosolModalSizeState {
        AerosolModalSizeState {
            modes: self.modes.iter().map(|mode| mode.state(i)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn so4() -> AerosolSpecies {
        AerosolSpecies::new("so4", 97.071, 1770.0, 0.507)
    }

    fn soa() -> AerosolSpecies {
        AerosolSpecies::new("soa", 12.01, 1000.0, 0.5)
    }

    fn aitken() -> AerosolModeState {
        AerosolModeState::new(
            "aitken",
            vec![so4(), soa()],
            5e8,
            1e-7,
            1.6_f64.log10(),
            vec![0.75, 0.25],
        )
        .unwrap()
    }

    #[test]
    fn mode_state_rejects_mismatched_fractions() {
        let result = AerosolModeState::new("aitken", vec![so4(), soa()], 5e8, 1e-7, 0.2, vec![1.0]);
        assert!(matches!(result, Err(AmbrsError::Shape(_))));
    }

    #[test]
    fn mode_state_rejects_fractions_not_summing_to_one() {
        let result =
            AerosolModeState::new("aitken", vec![so4(), soa()], 5e8, 1e-7, 0.2, vec![0.5, 0.6]);
        match result {
            Err(AmbrsError::MassFractions { mode, sum }) => {
                assert_eq!(mode, "aitken");
                assert_relative_eq!(sum, 1.1);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn mass_fraction_lookup() {
        let mode = aitken();
        assert_eq!(mode.mass_fraction("so4"), Some(0.75));
        assert_eq!(mode.mass_fraction("soa"), Some(0.25));
        assert_eq!(mode.mass_fraction("bc"), None);
    }

    #[test]
    fn mode_distribution_checks_species_count() {
        let result = AerosolModeDistribution::new(
            "aitken",
            vec![so4(), soa()],
            5e8,
            1e-7,
            0.2,
            vec![Parameter::Fixed(1.0)],
        );
        assert!(matches!(result, Err(AmbrsError::Shape(_))));
    }

    #[test]
    fn population_round_trip() {
        let mode = aitken();
        let population = AerosolModePopulation::broadcast(&mode, 4);

        assert_eq!(population.len(), 4);
        population.check_shape(4).unwrap();
        assert!(population.check_shape(5).is_err());
        for i in 0..4 {
            assert_eq!(population.state(i), mode);
        }
    }

    #[test]
    fn normalisation_restores_simplex() {
        let mut population = AerosolModePopulation::broadcast(&aitken(), 3);
        population.mass_fractions[0] = Array1::from_vec(vec![1.0, 2.0, 0.3]);
        population.mass_fractions[1] = Array1::from_vec(vec![1.0, 6.0, 0.1]);

        population.normalize_mass_fractions().unwrap();

        for i in 0..3 {
            let sum: f64 = population.mass_fractions.iter().map(|c| c[i]).sum();
            assert!((sum - 1.0).abs() < MASS_FRACTION_TOLERANCE);
        }
        assert_relative_eq!(population.mass_fractions[0][1], 0.25);
        assert_relative_eq!(population.mass_fractions[1][2], 0.25);
    }

    #[test]
    fn normalisation_rejects_zero_sum() {
        let mut population = AerosolModePopulation::broadcast(&aitken(), 2);
        population.mass_fractions[0][1] = 0.0;
        population.mass_fractions[1][1] = 0.0;

        assert!(matches!(
            population.normalize_mass_fractions(),
            Err(AmbrsError::Sampling(_))
        ));
    }
}
