use crate::aerosol::{AerosolModalSizeDistribution, AerosolSpecies};
use crate::distribution::Parameter;
use crate::errors::{AmbrsError, AmbrsResult};
use crate::gas::GasSpecies;
use crate::scenario::Scenario;
use serde::{Deserialize, Serialize};

/// The distributions from which the members of an ensemble are drawn.
///
/// Mirrors the shape of a [`Scenario`], with every scalar replaced by a
/// [`Parameter`] that is either held fixed across the ensemble or sampled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleSpecification {
    pub name: String,
    pub aerosols: Vec<AerosolSpecies>,
    pub gases: Vec<GasSpecies>,
    pub size: AerosolModalSizeDistribution,
    /// Gas concentration leaves, aligned with `gases`
    pub gas_concs: Vec<Parameter>,
    pub flux: Parameter,
    pub relative_humidity: Parameter,
    pub temperature: Parameter,
    pub pressure: Parameter,
    pub height: Parameter,
}

impl EnsembleSpecification {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        aerosols: Vec<AerosolSpecies>,
        gases: Vec<GasSpecies>,
        size: AerosolModalSizeDistribution,
        gas_concs: Vec<Parameter>,
        flux: impl Into<Parameter>,
        relative_humidity: impl Into<Parameter>,
        temperature: impl Into<Parameter>,
        pressure: impl Into<Parameter>,
        height: impl Into<Parameter>,
    ) -> AmbrsResult<Self> {
        let specification = Self {
            name: name.into(),
            aerosols,
            gases,
            size,
            gas_concs,
            flux: flux.into(),
            relative_humidity: relative_humidity.into(),
            temperature: temperature.into(),
            pressure: pressure.into(),
            height: height.into(),
        };
        specification.validate()?;
        Ok(specification)
    }

    /// Check the structure of the specification.
    ///
    /// Every mode must carry one mass fraction leaf per species, and every
    /// species in a mode must be one of the specification's aerosols.
    pub fn validate(&self) -> AmbrsResult<()> {
        if self.gas_concs.len() != self.gases.len() {
            return Err(AmbrsError::Shape(format!(
                "specification '{}' has {} gases but {} gas concentration leaves",
                self.name,
                self.gases.len(),
                self.gas_concs.len()
            )));
        }
        self.size.validate()?;

        for mode in &self.size.modes {
            if let Some(unknown) = mode
                .species
                .iter()
                .find(|species| !self.aerosols.contains(species))
            {
                return Err(AmbrsError::Shape(format!(
                    "mode '{}' uses species '{}' which is not an aerosol of specification '{}'",
                    mode.name, unknown.name, self.name
                )));
            }
        }
        Ok(())
    }

    /// Number of sampled (non-fixed) leaves in the tree.
    pub fn n_sampled(&self) -> usize {
        self.leaves().filter(|p| !p.is_fixed()).count()
    }

    /// Check that a scenario has the layout described by this specification.
    pub fn check_scenario(&self, scenario: &Scenario) -> AmbrsResult<()> {
        if scenario.aerosols != self.aerosols || scenario.gases != self.gases {
            return Err(AmbrsError::Shape(format!(
                "scenario species differ from specification '{}'",
                self.name
            )));
        }
        if scenario.size.modes.len() != self.size.modes.len() {
            return Err(AmbrsError::Shape(format!(
                "scenario has {} modes, specification '{}' has {}",
                scenario.size.modes.len(),
                self.name,
                self.size.modes.len()
            )));
        }
        for (i, (state, distribution)) in scenario
            .size
            .modes
            .iter()
            .zip(&self.size.modes)
            .enumerate()
        {
            if state.name != distribution.name || state.species != distribution.species {
                return Err(AmbrsError::Shape(format!(
                    "mode {} of scenario ('{}') does not match mode '{}' of specification '{}'",
                    i, state.name, distribution.name, self.name
                )));
            }
        }
        Ok(())
    }

    /// All leaves in sampling order.
    pub(crate) fn leaves(&self) -> impl Iterator<Item = &Parameter> {
        let modes = self.size.modes.iter().flat_map(|mode| {
            [&mode.number, &mode.geom_mean_diam, &mode.log10_geom_std_dev]
                .into_iter()
                .chain(mode.mass_fractions.iter())
        });
        modes.chain(self.gas_concs.iter()).chain([
            &self.flux,
            &self.relative_humidity,
            &self.temperature,
            &self.pressure,
            &self.height,
        ])
    }
}
