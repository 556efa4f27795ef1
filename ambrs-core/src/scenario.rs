//! A single, fully-specified physical scenario

use crate::aerosol::{AerosolModalSizeState, AerosolSpecies};
use crate::errors::{AmbrsError, AmbrsResult};
use crate::gas::GasSpecies;
use serde::{Deserialize, Serialize};

/// One point in parameter space: a modal aerosol size distribution together
/// with gas concentrations and ambient conditions.
///
/// Equality is field-by-field, including every mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub aerosols: Vec<AerosolSpecies>,
    pub gases: Vec<GasSpecies>,
    pub size: AerosolModalSizeState,
    /// Gas concentrations, aligned with `gases`
    pub gas_concs: Vec<f64>,
    /// Gas emission flux
    pub flux: f64,
    /// Relative humidity (-)
    pub relative_humidity: f64,
    /// Temperature (K)
    pub temperature: f64,
    /// Pressure (Pa)
    pub pressure: f64,
    /// Height above the surface (m)
    pub height: f64,
}

impl Scenario {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        aerosols: Vec<AerosolSpecies>,
        gases: Vec<GasSpecies>,
        size: AerosolModalSizeState,
        gas_concs: Vec<f64>,
        flux: f64,
        relative_humidity: f64,
        temperature: f64,
        pressure: f64,
        height: f64,
    ) -> AmbrsResult<Self> {
        let scenario = Self {
            aerosols,
            gases,
            size,
            gas_concs,
            flux,
            relative_humidity,
            temperature,
            pressure,
            height,
        };
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> AmbrsResult<()> {
        if self.gas_concs.len() != self.gases.len() {
            return Err(AmbrsError::Shape(format!(
                "scenario has {} gases but {} gas concentrations",
                self.gases.len(),
                self.gas_concs.len()
            )));
        }
        self.size.validate()
    }

    /// Concentration of the named gas, if it is part of this scenario.
    pub fn gas_concentration(&self, gas: &str) -> Option<f64> {
        self.gases
            .iter()
            .position(|g| g.name == gas)
            .map(|i| self.gas_concs[i])
    }

    /// Check that `other` has the same species, gases and mode layout.
    pub(crate) fn check_same_layout(&self, other: &Scenario) -> AmbrsResult<()> {
        if self.aerosols != other.aerosols {
            return Err(AmbrsError::Shape(
                "scenarios have different aerosol species".to_string(),
            ));
        }
        if self.gases != other.gases {
            return Err(AmbrsError::Shape(
                "scenarios have different gas species".to_string(),
            ));
        }
        if self.size.modes.len() != other.size.modes.len() {
            return Err(AmbrsError::Shape(format!(
                "scenarios have {} and {} aerosol modes",
                self.size.modes.len(),
                other.size.modes.len()
            )));
        }
        for (i, (a, b)) in self.size.modes.iter().zip(&other.size.modes).enumerate() {
            if a.name != b.name || a.species != b.species {
                return Err(AmbrsError::Shape(format!(
                    "mode {} differs between scenarios ('{}' vs '{}')",
                    i, a.name, b.name
                )));
            }
        }
        Ok(())
    }
}
